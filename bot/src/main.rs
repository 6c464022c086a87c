mod api;
mod cache;
mod error;
mod fetcher;
mod inventory;
mod offers;
mod service;
mod session;
mod ws;

use anyhow::Result;
use opskins::{HttpClient, OfferEvent, OfferPoller};
use service::Service;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::try_join;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_POLL_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();

    let client = HttpClient::new();
    let service = Arc::new(Service::new(Arc::new(client.clone())));

    let (tx, rx) = mpsc::unbounded_channel();
    let poller = OfferPoller::new(client, poll_interval());

    let listen_addr = listen_addr();
    try_join!(
        ws::serve(service.clone(), &listen_addr),
        dispatch_offer_events(service, rx),
        async {
            poller.start(tx).await;
            Ok(())
        },
    )?;

    Ok(())
}

async fn dispatch_offer_events(
    service: Arc<Service>,
    mut rx: mpsc::UnboundedReceiver<OfferEvent>,
) -> Result<()> {
    while let Some(event) = rx.recv().await {
        service.process_offer_event(event).await;
    }
    Ok(())
}

fn listen_addr() -> String {
    env::var("BOT_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
}

fn poll_interval() -> Duration {
    let secs = env::var("OFFER_POLL_SECS")
        .ok()
        .and_then(|secs| secs.parse().ok())
        .unwrap_or(DEFAULT_POLL_SECS);
    Duration::from_secs(secs)
}
