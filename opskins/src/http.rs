use crate::endpoint::Endpoint;
use crate::{Error, Result};
use derive_more::{Display, From};
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::env;

const BASE_URL: &str = "https://api-trade.opskins.com";
const STATUS_OK: i64 = 1;

/// Offer state reported by the API for an open offer.
pub const STATE_ACTIVE: i64 = 2;
/// Offer state reported by the API once an offer has settled.
pub const STATE_ACCEPTED: i64 = 3;

/// A 64-bit Steam identity, kept as a string the way the API transports it.
#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SteamId(String);

impl SteamId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SteamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Clone, Copy, Debug, Display, From, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(i64);

/// One tradable item as the API reports it.
#[derive(Clone, Debug, Deserialize)]
pub struct RawItem {
    pub id: String,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub image: HashMap<String, String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub suggested_price: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawOffer {
    pub id: OfferId,
    pub state: i64,
    #[serde(default)]
    pub sent_by_you: bool,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    status: i64,
    response: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, endpoint: Endpoint) -> Result<T> {
        if self.status != STATUS_OK {
            return Err(Error::Status {
                endpoint,
                status: self.status,
            });
        }
        self.response
            .ok_or_else(|| Error::Deserialize(format!("missing response body for {endpoint}")))
    }
}

#[derive(Debug, Deserialize)]
struct ItemsBody {
    items: Vec<RawItem>,
}

#[derive(Deserialize)]
struct OffersBody {
    offers: Vec<RawOffer>,
}

#[derive(Deserialize)]
struct OfferBody {
    offer: RawOffer,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn request<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .basic_auth(env::var("OPSKINS_API_KEY")?, Option::<&str>::None)
            .send()
            .await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|_| Error::Deserialize(text))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<T>> {
        let builder = self
            .client
            .get(format!("{BASE_URL}{endpoint}"))
            .query(query);
        self.request(builder).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        payload: Value,
    ) -> Result<ApiResponse<T>> {
        let builder = self
            .client
            .post(format!("{BASE_URL}{endpoint}"))
            .json(&payload);
        self.request(builder).await
    }

    pub async fn fetch_user_inventory(&self, steam_id: &SteamId) -> Result<Vec<RawItem>> {
        let endpoint = Endpoint::UserInventory;
        let response: ApiResponse<ItemsBody> = self
            .get(endpoint, &[("steam_id", steam_id.as_str())])
            .await?;
        Ok(response.into_result(endpoint)?.items)
    }

    pub async fn fetch_own_inventory(&self) -> Result<Vec<RawItem>> {
        let endpoint = Endpoint::OwnInventory;
        let response: ApiResponse<ItemsBody> = self.get(endpoint, &[]).await?;
        Ok(response.into_result(endpoint)?.items)
    }

    pub async fn send_offer(
        &self,
        steam_id: &SteamId,
        items: &[String],
        message: &str,
    ) -> Result<RawOffer> {
        let endpoint = Endpoint::SendOffer;
        let response: ApiResponse<OfferBody> = self
            .post(
                endpoint,
                json!({
                    "steam_id": steam_id,
                    "items": items.join(","),
                    "message": message,
                }),
            )
            .await?;
        Ok(response.into_result(endpoint)?.offer)
    }

    pub async fn cancel_offer(&self, offer_id: OfferId) -> Result<()> {
        let endpoint = Endpoint::CancelOffer;
        let response: ApiResponse<Value> = self
            .post(endpoint, json!({ "offer_id": offer_id }))
            .await?;

        if response.status != STATUS_OK {
            return Err(Error::Status {
                endpoint,
                status: response.status,
            });
        }
        Ok(())
    }

    pub async fn fetch_offers(&self) -> Result<Vec<RawOffer>> {
        let endpoint = Endpoint::GetOffers;
        let response: ApiResponse<OffersBody> = self.get(endpoint, &[]).await?;
        Ok(response.into_result(endpoint)?.offers)
    }
}
