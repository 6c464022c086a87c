use strum_macros::{Display, EnumString};

/// Enum for all ExpressTrade API endpoints the bot calls
#[derive(EnumString, Display, Copy, Clone, Debug)]
pub enum Endpoint {
    #[strum(serialize = "/ITrade/GetUserInventoryFromSteamId/v1/")]
    UserInventory,
    #[strum(serialize = "/IUser/GetInventory/v1/")]
    OwnInventory,
    #[strum(serialize = "/ITrade/SendOfferToSteamId/v1/")]
    SendOffer,
    #[strum(serialize = "/ITrade/CancelOffer/v1/")]
    CancelOffer,
    #[strum(serialize = "/ITrade/GetOffers/v1/")]
    GetOffers,
}
