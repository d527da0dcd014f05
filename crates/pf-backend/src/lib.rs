//! # State Backend Interface
//!
//! The async, high-latency side of the engine: account, storage, and code
//! lookups against a header that is not locally available (a light-client
//! or portal-network style backend).
//!
//! Every method is idempotent, read-only, and safe to call concurrently for
//! distinct keys. The engine never issues two concurrent queries for the
//! same key (the [`pf-fetch`](../pf_fetch/index.html) scheduler enforces
//! this).

mod errors;

#[cfg(feature = "testing")]
pub mod testing;

pub use errors::BackendError;

use async_trait::async_trait;
use pf_types::{Account, Address, BlockHeader, Code, U256};

/// Async lookup of account, storage, and code state at a given header.
///
/// `Ok(None)` is the authoritative "not found" answer (the key provably
/// does not exist at this header). `Err` means the engine could not
/// determine an answer — a transport failure, not an absence.
#[async_trait]
pub trait StateBackend: Send + Sync {
    async fn get_account(
        &self,
        header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Account>, BackendError>;

    async fn get_storage(
        &self,
        header: &BlockHeader,
        address: Address,
        slot: U256,
    ) -> Result<Option<U256>, BackendError>;

    async fn get_code(
        &self,
        header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Code>, BackendError>;
}

#[async_trait]
impl<T: StateBackend + ?Sized> StateBackend for std::sync::Arc<T> {
    async fn get_account(
        &self,
        header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Account>, BackendError> {
        (**self).get_account(header, address).await
    }

    async fn get_storage(
        &self,
        header: &BlockHeader,
        address: Address,
        slot: U256,
    ) -> Result<Option<U256>, BackendError> {
        (**self).get_storage(header, address, slot).await
    }

    async fn get_code(
        &self,
        header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Code>, BackendError> {
        (**self).get_code(header, address).await
    }
}
