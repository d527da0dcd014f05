//! # Async EVM State-Prefetch Engine — Public API
//!
//! Evaluates one unsigned call against a block whose state lives behind a
//! high-latency async backend. Builds a fresh [`WitnessLedger`] per
//! invocation, runs the Prefetch Loop to convergence, and reads the result
//! back out — no state outlives a single `call`/`create_access_list`/
//! `estimate_gas`.

mod access_list;
mod config;
mod errors;
mod prefetch;

pub use config::{EngineConfig, NetworkId};
pub use errors::EngineError;
pub use pf_fetch::FetchMode;
pub use pf_types::{AccessList, BlockHeader, CallRequest, CallResult};

use std::sync::Arc;

use pf_backend::StateBackend;
use pf_fetch::FetchScheduler;
use pf_ledger::WitnessLedger;

/// Upper bound on gas for a single call, `EngineConfig`'s default.
pub const EVM_CALL_GAS_CAP: u64 = 50_000_000;

/// Re-export of the Prefetch Loop's safety ceiling (spec's `EVM_CALL_LIMIT`).
pub use prefetch::EVM_CALL_LIMIT;

/// Gas charged for a transaction that touches no more than the base
/// intrinsic cost — the binary search floor for `estimate_gas`.
const MIN_CALL_GAS: u64 = 21_000;

/// Holds only immutable chain config and a backend handle; `Clone + Send +
/// Sync`, matching the teacher's `EvmSketch`/`HostExecutor` being
/// self-contained per logical unit of work (spec §5).
#[derive(Clone)]
pub struct Engine<B> {
    config: EngineConfig,
    backend: Arc<B>,
}

// Manual impl: a derived one would add a spurious `B: Debug` bound, but the
// backend handle is opaque here regardless of what `B` is.
impl<B> std::fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<B: StateBackend + 'static> Engine<B> {
    pub fn new(backend: Arc<B>, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    /// Runs `call` against `header`'s state and returns its output, gas
    /// usage, and revert message. The ledger is disposed on return.
    pub async fn call(
        &self,
        header: &BlockHeader,
        call: &CallRequest,
        mode: FetchMode,
    ) -> Result<CallResult, EngineError> {
        validate(call, self.config.gas_cap)?;

        let mut ledger = WitnessLedger::new();
        let mut scheduler = FetchScheduler::new(self.backend.clone(), mode);
        let outcome = prefetch::run(
            &mut ledger,
            header,
            call,
            self.config.gas_cap,
            self.config.network.chain_id(),
            &mut scheduler,
        )
        .await?;

        Ok(outcome.result)
    }

    /// Runs the Prefetch Loop, then builds a canonical EIP-2930 access list
    /// from the converged witness and re-invokes the EVM Adapter once more
    /// with that access list attached, to get a gas figure that reflects it
    /// (spec §4.F).
    pub async fn create_access_list(
        &self,
        header: &BlockHeader,
        call: &CallRequest,
        mode: FetchMode,
    ) -> Result<(AccessList, Option<String>, u64), EngineError> {
        validate(call, self.config.gas_cap)?;

        let mut ledger = WitnessLedger::new();
        let mut scheduler = FetchScheduler::new(self.backend.clone(), mode);
        let chain_id = self.config.network.chain_id();
        let _ = prefetch::run(
            &mut ledger,
            header,
            call,
            self.config.gas_cap,
            chain_id,
            &mut scheduler,
        )
        .await?;

        let access_list = access_list::build(ledger.witness(), call.from_or_default());

        let mut with_access_list = call.clone();
        with_access_list.access_list = Some(access_list.clone());

        let savepoint = ledger.begin_savepoint();
        let result = pf_evm::execute(
            &mut ledger,
            header,
            &with_access_list,
            self.config.gas_cap,
            chain_id,
        )?;
        ledger.rollback(savepoint).expect("savepoint is the most recently opened one");

        Ok((access_list, result.error, result.gas_used))
    }

    /// Runs the Prefetch Loop to populate the ledger, then binary-searches
    /// the minimal gas limit that does not revert, against the already-
    /// converged state (no second Prefetch Loop — see `DESIGN.md`).
    pub async fn estimate_gas(
        &self,
        header: &BlockHeader,
        call: &CallRequest,
        mode: FetchMode,
    ) -> Result<u64, EngineError> {
        validate(call, self.config.gas_cap)?;

        let mut ledger = WitnessLedger::new();
        let mut scheduler = FetchScheduler::new(self.backend.clone(), mode);
        let chain_id = self.config.network.chain_id();
        let outcome = prefetch::run(
            &mut ledger,
            header,
            call,
            self.config.gas_cap,
            chain_id,
            &mut scheduler,
        )
        .await?;

        // Non-goal: accurate gas estimation on revert. Report what the
        // converged run used and stop.
        if outcome.result.reverted() {
            return Ok(outcome.result.gas_used);
        }

        let mut low = outcome.result.gas_used.max(MIN_CALL_GAS);
        let mut high = call.gas.unwrap_or(self.config.gas_cap).min(self.config.gas_cap);
        if high < low {
            high = low;
        }

        while low < high {
            let mid = low + (high - low) / 2;
            let mut probe = call.clone();
            probe.gas = Some(mid);

            let savepoint = ledger.begin_savepoint();
            let probe_result =
                pf_evm::execute(&mut ledger, header, &probe, self.config.gas_cap, chain_id)?;
            ledger.rollback(savepoint).expect("savepoint is the most recently opened one");

            if probe_result.reverted() {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        Ok(low)
    }
}

/// Shared input validation (spec §4.F, last paragraph). `from`/`gas`
/// defaulting happens lazily in `CallRequest::from_or_default` and the EVM
/// Adapter's own gas-cap clamp; the only thing rejected up front is a gas
/// request above the cap.
fn validate(call: &CallRequest, gas_cap: u64) -> Result<(), EngineError> {
    if let Some(gas) = call.gas {
        if gas > gas_cap {
            return Err(EngineError::GasTooHigh);
        }
    }
    Ok(())
}
