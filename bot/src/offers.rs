use crate::api::TradeApi;
use crate::error::SendError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use opskins::{OfferId, RawOffer, SteamId};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferDirection {
    Inbound,
    Outbound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferStatus {
    Requested,
    Received,
    Sent,
    Failed,
    Accepted,
    Cancelled,
}

impl OfferStatus {
    /// Terminal statuses accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Sent | Self::Failed | Self::Accepted | Self::Cancelled
        )
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OfferStatus::Requested => "requested",
            OfferStatus::Received => "received",
            OfferStatus::Sent => "sent",
            OfferStatus::Failed => "failed",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct TradeOffer {
    pub id: OfferId,
    pub direction: OfferDirection,
    pub items: Vec<String>,
    pub status: OfferStatus,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("offer {id} is already terminal ({status})")]
    Terminal { id: OfferId, status: OfferStatus },

    #[error("offer {0} is not tracked")]
    Unknown(OfferId),
}

/// Offers currently owned by the negotiator, keyed by offer id.
#[derive(Default)]
pub struct OfferBook {
    offers: DashMap<OfferId, TradeOffer>,
}

impl OfferBook {
    /// Starts tracking an offer. Returns false if the id is already known,
    /// terminal or not; an id is never re-registered.
    fn track(&self, offer: TradeOffer) -> bool {
        match self.offers.entry(offer.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(offer);
                true
            }
        }
    }

    pub fn status(&self, id: OfferId) -> Option<OfferStatus> {
        self.offers.get(&id).map(|offer| offer.status)
    }

    /// Moves an offer to `to`, unless its current status is terminal.
    pub fn transition(&self, id: OfferId, to: OfferStatus) -> Result<(), TransitionError> {
        let mut offer = self
            .offers
            .get_mut(&id)
            .ok_or(TransitionError::Unknown(id))?;

        if offer.status.is_terminal() {
            return Err(TransitionError::Terminal {
                id,
                status: offer.status,
            });
        }
        offer.status = to;
        log::debug!(
            "{:?} offer {id} ({} items) is now {to}",
            offer.direction,
            offer.items.len()
        );
        Ok(())
    }
}

/// Drives trade-offer lifecycles: submits outbound offers for sessions and
/// applies the fixed auto-cancel policy to anything inbound.
pub struct Negotiator {
    api: Arc<dyn TradeApi>,
    book: OfferBook,
}

impl Negotiator {
    pub fn new(api: Arc<dyn TradeApi>) -> Self {
        Self {
            api,
            book: OfferBook::default(),
        }
    }

    /// Submits an outbound offer. The offer only gets an id once the API
    /// acknowledges it, so a rejected submission leaves nothing tracked.
    pub async fn send(&self, to: &SteamId, items: Vec<String>) -> Result<OfferId, SendError> {
        match self.api.send_offer(to, &items).await {
            Ok(id) => {
                self.book.track(TradeOffer {
                    id,
                    direction: OfferDirection::Outbound,
                    items,
                    status: OfferStatus::Requested,
                });
                if let Err(e) = self.book.transition(id, OfferStatus::Sent) {
                    log::warn!("Could not record submission: {e}");
                }
                log::info!("Offer {id} sent to {to}");
                Ok(id)
            }
            Err(e) => {
                log::warn!("Offer to {to} {}: {e}", OfferStatus::Failed);
                Err(e)
            }
        }
    }

    /// The service never accepts unsolicited inbound offers: every received
    /// offer gets exactly one cancel call, duplicates are ignored.
    pub async fn handle_received(&self, offer: RawOffer) {
        let id = offer.id;
        let tracked = self.book.track(TradeOffer {
            id,
            direction: OfferDirection::Inbound,
            items: Vec::new(),
            status: OfferStatus::Received,
        });
        if !tracked {
            let status = self.book.status(id);
            log::debug!("Offer {id} already handled ({status:?}), ignoring duplicate");
            return;
        }

        log::info!("Offer {id} incoming, cancelling");
        match self.api.cancel_offer(id).await {
            Ok(()) => {
                if let Err(e) = self.book.transition(id, OfferStatus::Cancelled) {
                    log::warn!("Could not record cancellation: {e}");
                }
            }
            // Nobody to surface this to; the offer stays as received.
            Err(e) => log::warn!("{e}"),
        }
    }

    /// Settlement is reported by the API after the fact; there is nothing
    /// left for the engine to drive.
    pub fn handle_accepted(&self, offer: RawOffer) {
        log::info!("Offer {} is {}", offer.id, OfferStatus::Accepted);
    }

    #[cfg(test)]
    pub(crate) fn book(&self) -> &OfferBook {
        &self.book
    }
}
