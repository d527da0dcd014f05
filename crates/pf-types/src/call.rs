use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::AccessList;
use serde::{Deserialize, Serialize};

/// Parameters of an unsigned call.
///
/// Mirrors the shape of `eth_call`'s `TransactionArgs`, but is not itself
/// JSON-RPC wire type: decoding/framing is explicitly out of scope for this
/// engine (see the crate-level docs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    pub value: Option<U256>,
    pub input: Bytes,
    pub access_list: Option<AccessList>,
    pub blob_versioned_hashes: Option<Vec<B256>>,
}

impl CallRequest {
    /// The caller, defaulting to the zero address when unset.
    pub fn from_or_default(&self) -> Address {
        self.from.unwrap_or_default()
    }
}

/// Outcome of executing a [`CallRequest`] against a [`crate::BlockHeader`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallResult {
    pub output: Bytes,
    pub gas_used: u64,
    /// Revert reason or EVM error string. `None` on a successful call.
    ///
    /// A populated `error` here is an ordinary application-level revert,
    /// not a failed [`CallResult`] — see the crate-level error taxonomy.
    pub error: Option<String>,
}

impl CallResult {
    pub fn reverted(&self) -> bool {
        self.error.is_some()
    }
}
