use thiserror::Error;

/// Failure of one inventory fetch. Cloned to every waiter joined to the
/// same in-flight fetch, so all of them observe the identical outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("inventory could not load: {0}")]
    Upstream(String),

    #[error("fetch resolved without publishing a result")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("trade offer could not be sent: {0}")]
    Upstream(String),
}

/// Inbound offers have no session owner, so a failed cancel is only logged.
#[derive(Error, Debug)]
#[error("offer could not be cancelled: {0}")]
pub struct CancelError(pub String);
