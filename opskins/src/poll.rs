use crate::http::{HttpClient, OfferId, RawOffer, STATE_ACCEPTED, STATE_ACTIVE};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Offer lifecycle change observed between two polls.
#[derive(Clone, Debug)]
pub enum OfferEvent {
    /// A counterparty opened a new offer against the bot.
    Received(RawOffer),
    /// An offer the bot sent reached final settlement.
    Accepted(RawOffer),
}

/// Polls the offers endpoint at a fixed interval and emits one event per
/// observed state change. The poller keeps the last seen state per offer id
/// so a change is reported exactly once no matter how often it is polled.
pub struct OfferPoller {
    client: HttpClient,
    interval: Duration,
    seen: HashMap<OfferId, i64>,
}

impl OfferPoller {
    pub fn new(client: HttpClient, interval: Duration) -> Self {
        Self {
            client,
            interval,
            seen: HashMap::new(),
        }
    }

    /// Runs until the receiving side of `tx` is dropped. A failed poll is
    /// logged and retried on the next tick.
    pub async fn start(mut self, tx: UnboundedSender<OfferEvent>) {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            ticker.tick().await;

            let offers = match self.client.fetch_offers().await {
                Ok(offers) => offers,
                Err(e) => {
                    log::error!("Failed to poll offers: {e}");
                    continue;
                }
            };

            let current: HashSet<OfferId> = offers.iter().map(|offer| offer.id).collect();

            for offer in offers {
                if let Some(event) = self.classify(offer) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }

            self.seen.retain(|id, _| current.contains(id));
        }
    }

    fn classify(&mut self, offer: RawOffer) -> Option<OfferEvent> {
        let previous = self.seen.insert(offer.id, offer.state);

        if offer.state == STATE_ACTIVE && previous.is_none() && !offer.sent_by_you {
            Some(OfferEvent::Received(offer))
        } else if offer.state == STATE_ACCEPTED && previous != Some(STATE_ACCEPTED) {
            Some(OfferEvent::Accepted(offer))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: i64, state: i64, sent_by_you: bool) -> RawOffer {
        RawOffer {
            id: OfferId::from(id),
            state,
            sent_by_you,
        }
    }

    fn poller() -> OfferPoller {
        OfferPoller::new(HttpClient::new(), Duration::from_secs(5))
    }

    #[test]
    fn new_incoming_offer_is_received_once() {
        let mut poller = poller();

        assert!(matches!(
            poller.classify(offer(1, STATE_ACTIVE, false)),
            Some(OfferEvent::Received(_))
        ));
        // Same offer on the next poll is old news.
        assert!(poller.classify(offer(1, STATE_ACTIVE, false)).is_none());
    }

    #[test]
    fn own_active_offer_is_not_an_incoming_event() {
        let mut poller = poller();
        assert!(poller.classify(offer(2, STATE_ACTIVE, true)).is_none());
    }

    #[test]
    fn settlement_is_reported_once() {
        let mut poller = poller();

        assert!(poller.classify(offer(3, STATE_ACTIVE, true)).is_none());
        assert!(matches!(
            poller.classify(offer(3, STATE_ACCEPTED, true)),
            Some(OfferEvent::Accepted(_))
        ));
        assert!(poller.classify(offer(3, STATE_ACCEPTED, true)).is_none());
    }
}
