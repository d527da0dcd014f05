use thiserror::Error;

/// Failure fetching a witness key. Messages match the public API's error
/// taxonomy verbatim.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unable to get account")]
    Account,
    #[error("Unable to get slot")]
    Slot,
    #[error("Unable to get code")]
    Code,
}
