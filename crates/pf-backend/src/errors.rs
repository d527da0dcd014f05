use thiserror::Error;

/// Failure of a single backend lookup.
///
/// `Ok(None)` from a [`crate::StateBackend`] method is the authoritative
/// "this key does not exist at this header" answer and is not an error.
/// `BackendError` is reserved for everything that means the engine could
/// not determine an answer at all.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The underlying transport failed (timeout, connection reset, peer
    /// returned a malformed response, ...). The backend itself may retry
    /// internally; the engine does not.
    #[error("transport error: {0}")]
    Transport(String),
}
