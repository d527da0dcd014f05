use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// The execution environment of a single block, as seen by the EVM Adapter.
///
/// This is deliberately a plain data carrier rather than a full consensus
/// header: the engine never verifies it against a trie root or a parent
/// chain, it only reads the fields the EVM needs to build a block context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Hash identifying this header.
    pub hash: B256,
    /// Block number.
    pub number: u64,
    /// Hash of the parent block.
    ///
    /// Not consulted when building the EVM block context: `BLOCKHASH` is
    /// unsupported (see the crate-level docs), so there is no ancestor
    /// chain to walk. Kept on the type as the hook a future real-hash
    /// supplier (the post-Pectra history-buffer system contract) would
    /// need.
    pub parent_hash: B256,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub base_fee: Option<u64>,
    pub prev_randao: B256,
    pub difficulty: U256,
    pub coinbase: Address,
    pub excess_blob_gas: Option<u64>,
}

impl BlockHeader {
    /// Effective excess blob gas, per spec defaulting to zero pre-Cancun.
    pub fn excess_blob_gas_or_default(&self) -> u64 {
        self.excess_blob_gas.unwrap_or_default()
    }

    /// Effective base fee, zero for pre-London headers.
    pub fn base_fee_or_default(&self) -> u64 {
        self.base_fee.unwrap_or_default()
    }
}
