use serde::{Deserialize, Serialize};

/// Chain selection. Mirrors the teacher's `Genesis` enum — a small closed
/// set of supported networks rather than an open chain-id integer, since
/// the gas schedule and fork activation the EVM Adapter needs depend on
/// knowing which one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkId {
    #[default]
    Mainnet,
    Sepolia,
    Holesky,
}

impl NetworkId {
    pub fn chain_id(self) -> u64 {
        match self {
            NetworkId::Mainnet => 1,
            NetworkId::Sepolia => 11155111,
            NetworkId::Holesky => 17000,
        }
    }
}

/// Process-lifetime configuration an [`crate::Engine`] holds alongside its
/// backend handle. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub network: NetworkId,
    /// Upper bound on gas for any single call, `EVM_CALL_GAS_CAP` unless
    /// overridden.
    pub gas_cap: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { network: NetworkId::default(), gas_cap: crate::EVM_CALL_GAS_CAP }
    }
}
