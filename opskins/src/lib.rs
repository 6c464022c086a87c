//! This library provides a typed client for the OPSkins ExpressTrade API.
//! It covers the inventory and trade-offer endpoints the bot consumes, plus
//! a poller that surfaces offer lifecycle changes as an event stream.
mod endpoint;
mod error;
mod http;
mod poll;

pub use endpoint::Endpoint;
pub use error::Error;
pub use http::{
    HttpClient, OfferId, RawItem, RawOffer, SteamId, STATE_ACCEPTED, STATE_ACTIVE,
};
pub use poll::{OfferEvent, OfferPoller};

pub type Result<T> = std::result::Result<T, Error>;
