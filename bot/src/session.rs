use crate::inventory::InventoryItem;
use opskins::{OfferId, SteamId};
use tokio::sync::mpsc::UnboundedSender;

pub const INVENTORY_COULD_NOT_LOAD: &str = "INVENTORY_COULD_NOT_LOAD";
pub const TRADE_COULD_NOT_SEND: &str = "TRADE_COULD_NOT_SEND";

/// Whose inventory a session is asking about: the bot's own stock, or the
/// inventory of the authenticated user behind the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InventoryScope {
    Bot,
    User,
}

/// Inbound events the transport delivers for a session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    LoadInventory {
        scope: InventoryScope,
        force_refresh: bool,
    },
    SendTrade {
        items: Vec<String>,
    },
}

/// Outbound emissions back to a session.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerEvent {
    Inventory {
        scope: InventoryScope,
        items: Vec<InventoryItem>,
    },
    TradeSent {
        offer_id: OfferId,
        items: Vec<String>,
    },
    Error {
        reason: String,
    },
}

/// One connected, authenticated session. The transport owns the other end
/// of `tx` and writes each event out to the client.
pub struct Session {
    pub steam_id: SteamId,
    tx: UnboundedSender<ServerEvent>,
}

impl Session {
    pub fn new(steam_id: SteamId, tx: UnboundedSender<ServerEvent>) -> Self {
        Self { steam_id, tx }
    }

    /// A disconnected session just drops the event; it must never take the
    /// service down.
    pub fn emit(&self, event: ServerEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Session for {} is gone, dropping event", self.steam_id);
        }
    }
}
