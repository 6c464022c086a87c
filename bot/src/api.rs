use crate::error::{CancelError, FetchError, SendError};
use async_trait::async_trait;
use opskins::{HttpClient, OfferId, RawItem, SteamId};

const OFFER_MESSAGE: &str = "Offer from your deposit on the site";

/// The narrow contract the engine has with the external trading API.
/// Production uses [`opskins::HttpClient`]; tests substitute a mock.
#[async_trait]
pub trait TradeApi: Send + Sync {
    async fn user_inventory(&self, steam_id: &SteamId) -> Result<Vec<RawItem>, FetchError>;

    async fn own_inventory(&self) -> Result<Vec<RawItem>, FetchError>;

    async fn send_offer(&self, to: &SteamId, items: &[String]) -> Result<OfferId, SendError>;

    async fn cancel_offer(&self, id: OfferId) -> Result<(), CancelError>;
}

#[async_trait]
impl TradeApi for HttpClient {
    async fn user_inventory(&self, steam_id: &SteamId) -> Result<Vec<RawItem>, FetchError> {
        self.fetch_user_inventory(steam_id)
            .await
            .map_err(|e| FetchError::Upstream(e.to_string()))
    }

    async fn own_inventory(&self) -> Result<Vec<RawItem>, FetchError> {
        self.fetch_own_inventory()
            .await
            .map_err(|e| FetchError::Upstream(e.to_string()))
    }

    async fn send_offer(&self, to: &SteamId, items: &[String]) -> Result<OfferId, SendError> {
        self.send_offer(to, items, OFFER_MESSAGE)
            .await
            .map(|offer| offer.id)
            .map_err(|e| SendError::Upstream(e.to_string()))
    }

    async fn cancel_offer(&self, id: OfferId) -> Result<(), CancelError> {
        HttpClient::cancel_offer(self, id)
            .await
            .map_err(|e| CancelError(e.to_string()))
    }
}
