use crate::api::TradeApi;
use crate::cache::InventoryCache;
use crate::error::FetchError;
use crate::fetcher::FetchCoordinator;
use crate::inventory::{InventoryItem, InventorySnapshot, OwnerId};
use crate::offers::Negotiator;
use crate::session::{
    InventoryScope, ServerEvent, Session, SessionEvent, INVENTORY_COULD_NOT_LOAD,
    TRADE_COULD_NOT_SEND,
};
use opskins::OfferEvent;
use std::sync::Arc;

/// Entry point for everything the sessions and the offer poller raise.
/// Holds the only mutable shared state in the process: the inventory cache
/// and the in-flight fetch table (inside the coordinator), plus the offer
/// book (inside the negotiator).
pub struct Service {
    api: Arc<dyn TradeApi>,
    cache: Arc<InventoryCache>,
    fetcher: FetchCoordinator,
    negotiator: Negotiator,
}

impl Service {
    pub fn new(api: Arc<dyn TradeApi>) -> Self {
        let cache = Arc::new(InventoryCache::new());
        Self {
            fetcher: FetchCoordinator::new(cache.clone()),
            negotiator: Negotiator::new(api.clone()),
            cache,
            api,
        }
    }

    pub async fn handle_event(&self, session: &Session, event: SessionEvent) {
        match event {
            SessionEvent::LoadInventory {
                scope,
                force_refresh,
            } => self.load_inventory(session, scope, force_refresh).await,
            SessionEvent::SendTrade { items } => self.send_trade(session, items).await,
        }
    }

    pub async fn process_offer_event(&self, event: OfferEvent) {
        match event {
            OfferEvent::Received(offer) => self.negotiator.handle_received(offer).await,
            OfferEvent::Accepted(offer) => self.negotiator.handle_accepted(offer),
        }
    }

    async fn load_inventory(&self, session: &Session, scope: InventoryScope, force_refresh: bool) {
        let owner = match scope {
            InventoryScope::Bot => OwnerId::Bot,
            InventoryScope::User => OwnerId::User(session.steam_id.clone()),
        };

        match self.handle_load(owner, force_refresh).await {
            Ok(snapshot) => session.emit(ServerEvent::Inventory {
                scope,
                items: snapshot.items,
            }),
            Err(e) => {
                log::warn!("Inventory load failed for {}: {e}", session.steam_id);
                session.emit(ServerEvent::Error {
                    reason: INVENTORY_COULD_NOT_LOAD.to_string(),
                });
            }
        }
    }

    /// Cache-or-fetch decision for one load request. A forced refresh first
    /// drops the entry so the response can never come from a superseded
    /// snapshot; everything else is answered from cache when possible.
    pub async fn handle_load(
        &self,
        owner: OwnerId,
        force_refresh: bool,
    ) -> Result<InventorySnapshot, FetchError> {
        if force_refresh {
            self.cache.invalidate(&owner);
        } else if let Some(snapshot) = self.cache.get(&owner) {
            log::debug!("Serving {owner} from cache, fetched at {}", snapshot.fetched_at);
            return Ok(snapshot);
        }

        let api = self.api.clone();
        let fetch_owner = owner.clone();
        self.fetcher
            .fetch_or_join(owner, move || async move {
                let raw = match &fetch_owner {
                    OwnerId::Bot => api.own_inventory().await?,
                    OwnerId::User(id) => api.user_inventory(id).await?,
                };
                Ok(raw.into_iter().map(InventoryItem::from).collect())
            })
            .await
    }

    async fn send_trade(&self, session: &Session, items: Vec<String>) {
        match self.negotiator.send(&session.steam_id, items.clone()).await {
            Ok(offer_id) => session.emit(ServerEvent::TradeSent { offer_id, items }),
            Err(e) => {
                log::warn!("Trade from {} failed: {e}", session.steam_id);
                session.emit(ServerEvent::Error {
                    reason: TRADE_COULD_NOT_SEND.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use opskins::{OfferId, RawItem, RawOffer, STATE_ACTIVE};
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use tokio::sync::mpsc;

    fn karambit() -> RawItem {
        RawItem {
            id: "A1".to_string(),
            category: "knife".to_string(),
            name: "Karambit".to_string(),
            image: HashMap::from([("600px".to_string(), "url".to_string())]),
            color: "red".to_string(),
            suggested_price: 500,
        }
    }

    fn service(api: MockApi) -> (Arc<MockApi>, Service) {
        let api = Arc::new(api);
        (api.clone(), Service::new(api))
    }

    fn owner() -> OwnerId {
        OwnerId::User("7656000001".into())
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let (api, service) = service(MockApi::with_items(vec![karambit()]));

        let first = service.handle_load(owner(), false).await.unwrap();
        assert_eq!(first.items[0].id, "A1");
        assert_eq!(first.items[0].image_url, "url");
        assert_eq!(first.items[0].price, 500);

        let second = service.handle_load(owner(), false).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forced_refresh_bypasses_a_valid_entry() {
        let (api, service) = service(MockApi::with_items(vec![karambit()]));

        let first = service.handle_load(owner(), false).await.unwrap();
        let second = service.handle_load(owner(), true).await.unwrap();

        assert_eq!(api.user_calls.load(Ordering::SeqCst), 2);
        assert!(second.fetched_at >= first.fetched_at);
    }

    #[tokio::test]
    async fn bot_inventory_uses_its_own_slot_and_endpoint() {
        let (api, service) = service(MockApi::with_items(vec![karambit()]));

        service.handle_load(OwnerId::Bot, false).await.unwrap();
        service.handle_load(OwnerId::Bot, false).await.unwrap();

        assert_eq!(api.own_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_fetch_caches_nothing() {
        let (api, service) = service(MockApi {
            fail_fetch: true,
            ..MockApi::default()
        });

        for _ in 0..2 {
            let result = service.handle_load(owner(), false).await;
            assert!(matches!(result, Err(FetchError::Upstream(_))));
        }

        // No entry was created, so both loads reached upstream.
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_event_emits_inventory_to_the_session() {
        let (_, service) = service(MockApi::with_items(vec![karambit()]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new("7656000001".into(), tx);

        service
            .handle_event(
                &session,
                SessionEvent::LoadInventory {
                    scope: InventoryScope::User,
                    force_refresh: false,
                },
            )
            .await;

        match rx.recv().await.unwrap() {
            ServerEvent::Inventory { scope, items } => {
                assert_eq!(scope, InventoryScope::User);
                assert_eq!(items[0].name, "Karambit");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_failure_becomes_a_structured_error_event() {
        let (_, service) = service(MockApi {
            fail_fetch: true,
            ..MockApi::default()
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new("7656000001".into(), tx);

        service
            .handle_event(
                &session,
                SessionEvent::LoadInventory {
                    scope: InventoryScope::User,
                    force_refresh: false,
                },
            )
            .await;

        assert_eq!(
            rx.recv().await.unwrap(),
            ServerEvent::Error {
                reason: INVENTORY_COULD_NOT_LOAD.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn trade_events_round_trip_through_the_negotiator() {
        let (api, service) = service(MockApi::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new("7656000001".into(), tx);

        service
            .handle_event(
                &session,
                SessionEvent::SendTrade {
                    items: vec!["A1".to_string()],
                },
            )
            .await;

        assert_eq!(api.send_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            ServerEvent::TradeSent {
                offer_id: OfferId::from(99),
                items: vec!["A1".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn incoming_offer_notification_triggers_the_cancel_policy() {
        let (api, service) = service(MockApi::default());

        service
            .process_offer_event(OfferEvent::Received(RawOffer {
                id: OfferId::from(7),
                state: STATE_ACTIVE,
                sent_by_you: false,
            }))
            .await;

        assert_eq!(*api.cancelled.lock().unwrap(), vec![OfferId::from(7)]);
    }
}
