use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Account-level state as returned by the state backend.
///
/// `code_hash` and `storage_root` are informational only — this engine
/// never verifies an account against a state trie, it simply stores
/// whatever the backend returned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: B256,
    pub storage_root: B256,
}

impl Default for Account {
    fn default() -> Self {
        Self { balance: U256::ZERO, nonce: 0, code_hash: EMPTY_CODE_HASH, storage_root: B256::ZERO }
    }
}

/// Keccak256 of the empty byte string, the `code_hash` of every
/// externally-owned account and of any contract with no code.
pub const EMPTY_CODE_HASH: B256 = alloy_primitives::b256!(
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a47"
);

/// Opaque contract bytecode.
pub type Code = Bytes;
