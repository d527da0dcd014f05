//! # Async EVM State-Prefetch — Shared Types
//!
//! Data model shared by every component of the prefetch engine: the block
//! header shape the EVM Adapter consumes, account/code representations, the
//! call request/result pair, and the witness table the Prefetch Loop
//! iterates on.
//!
//! Nothing in this crate talks to a network or to the EVM itself — it is
//! pure data, the equivalent of the teacher's `rsp-primitives` crate.

mod account;
mod call;
mod header;
mod witness;

pub use account::{Account, Code, EMPTY_CODE_HASH};
pub use call::{CallRequest, CallResult};
pub use header::BlockHeader;
pub use witness::{WitnessKey, WitnessTable};

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use alloy_rpc_types_eth::{AccessList, AccessListItem};
