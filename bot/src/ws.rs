use crate::service::Service;
use crate::session::{InventoryScope, ServerEvent, Session, SessionEvent};
use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use opskins::SteamId;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Accepts session connections and runs one task per session. Frames are
/// JSON arrays shaped `[event, data]` in both directions.
pub async fn serve(service: Arc<Service>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening for sessions on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(service, stream).await {
                log::warn!("Session from {peer} ended with error: {e}");
            }
        });
    }
}

async fn handle_connection(service: Arc<Service>, stream: TcpStream) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    // The auth layer in front of us establishes the user's identity; the
    // first frame carries it. No inventory or trade event is processed
    // before that.
    let steam_id = match read.next().await {
        Some(frame) => authenticate(frame?)?,
        None => return Ok(()),
    };
    log::info!("Session opened for {steam_id}");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::new(steam_id, tx);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let message = Message::text(frame(&event).to_string());
            if write.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => match parse_event(text.as_str()) {
                Some(event) => service.handle_event(&session, event).await,
                None => log::warn!("Unrecognized message from {}: {text}", session.steam_id),
            },
            Message::Close(_) => break,
            _ => (),
        }
    }

    log::info!("Session closed for {}", session.steam_id);
    drop(session);
    writer.await?;
    Ok(())
}

fn authenticate(message: Message) -> Result<SteamId> {
    let Message::Text(text) = message else {
        bail!("expected a text auth frame");
    };
    let value: Value = serde_json::from_str(text.as_str())?;

    match value.as_array().map(Vec::as_slice) {
        Some([name, data]) if name == "auth" => {
            let id = data
                .get("steam_id")
                .and_then(Value::as_str)
                .context("auth frame without steam_id")?;
            Ok(SteamId::from(id))
        }
        _ => bail!("expected an auth frame"),
    }
}

fn parse_event(text: &str) -> Option<SessionEvent> {
    let value: Value = serde_json::from_str(text).ok()?;
    let array = value.as_array()?;
    let name = array.first()?.as_str()?;
    let data = array.get(1).cloned().unwrap_or(Value::Null);

    match name {
        "loadUserInventory" => Some(SessionEvent::LoadInventory {
            scope: InventoryScope::User,
            force_refresh: data.as_bool().unwrap_or(false),
        }),
        "loadBotInventory" => Some(SessionEvent::LoadInventory {
            scope: InventoryScope::Bot,
            force_refresh: data.as_bool().unwrap_or(false),
        }),
        "sendTrade" => {
            let items = data
                .as_array()?
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?;
            Some(SessionEvent::SendTrade { items })
        }
        _ => None,
    }
}

fn frame(event: &ServerEvent) -> Value {
    match event {
        ServerEvent::Inventory { scope, items } => {
            let name = match scope {
                InventoryScope::Bot => "ownInventory",
                InventoryScope::User => "userInventory",
            };
            json!([name, { "content": items }])
        }
        ServerEvent::TradeSent { offer_id, items } => {
            json!(["tradeSent", { "id": offer_id, "items": items }])
        }
        ServerEvent::Error { reason } => json!(["error", { "content": reason }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryItem;
    use opskins::OfferId;

    #[test]
    fn load_events_carry_their_scope_and_flag() {
        assert_eq!(
            parse_event(r#"["loadUserInventory", true]"#),
            Some(SessionEvent::LoadInventory {
                scope: InventoryScope::User,
                force_refresh: true,
            })
        );
        assert_eq!(
            parse_event(r#"["loadBotInventory"]"#),
            Some(SessionEvent::LoadInventory {
                scope: InventoryScope::Bot,
                force_refresh: false,
            })
        );
    }

    #[test]
    fn send_trade_requires_string_item_ids() {
        assert_eq!(
            parse_event(r#"["sendTrade", ["A1", "B2"]]"#),
            Some(SessionEvent::SendTrade {
                items: vec!["A1".to_string(), "B2".to_string()],
            })
        );
        assert_eq!(parse_event(r#"["sendTrade", [1, 2]]"#), None);
    }

    #[test]
    fn junk_frames_are_rejected_not_fatal() {
        assert_eq!(parse_event("not json"), None);
        assert_eq!(parse_event(r#"{"event": "loadUserInventory"}"#), None);
        assert_eq!(parse_event(r#"["unknownEvent", {}]"#), None);
    }

    #[test]
    fn auth_frame_yields_the_identity() {
        let message = Message::text(r#"["auth", {"steam_id": "7656000001"}]"#);
        assert_eq!(authenticate(message).unwrap(), SteamId::from("7656000001"));

        let message = Message::text(r#"["loadUserInventory", false]"#);
        assert!(authenticate(message).is_err());
    }

    #[test]
    fn inventory_frames_use_the_scope_channel() {
        let event = ServerEvent::Inventory {
            scope: InventoryScope::Bot,
            items: vec![InventoryItem {
                id: "A1".to_string(),
                category: "knife".to_string(),
                name: "Karambit".to_string(),
                image_url: "url".to_string(),
                color: "red".to_string(),
                price: 500,
            }],
        };

        let value = frame(&event);
        assert_eq!(value[0], "ownInventory");
        assert_eq!(value[1]["content"][0]["id"], "A1");
    }

    #[test]
    fn trade_sent_frames_echo_the_offer() {
        let event = ServerEvent::TradeSent {
            offer_id: OfferId::from(99),
            items: vec!["A1".to_string()],
        };

        let value = frame(&event);
        assert_eq!(value[0], "tradeSent");
        assert_eq!(value[1]["id"], 99);
    }
}
