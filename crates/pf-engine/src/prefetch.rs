//! The fixed-point execute-then-fetch loop (spec centerpiece, §4.E).
//!
//! The EVM is used as an oracle: given whatever state happens to be
//! resident, it names the keys it would have read. Each iteration either
//! reveals new keys (progress) or reproduces the same witness as last time,
//! proving the most recent execution saw exactly the right state.

use pf_backend::StateBackend;
use pf_ledger::WitnessLedger;
use pf_types::{CallRequest, CallResult};

use crate::{errors::EngineError, BlockHeader, FetchMode, FetchScheduler};

/// Safety ceiling against pathological cycles (interpreter bugs, adversarial
/// backends engineering an unbounded witness chain). Convergence in
/// practice takes on the order of the call's depth of novel state accesses.
pub const EVM_CALL_LIMIT: u64 = 10_000;

pub(crate) struct PrefetchOutcome {
    pub result: CallResult,
    pub iterations: u64,
}

/// Runs the Prefetch Loop to convergence (or `EVM_CALL_LIMIT` iterations)
/// and returns the last `CallResult`, leaving `ledger` populated with the
/// witness and state the final iteration observed.
pub(crate) async fn run<B: StateBackend + 'static>(
    ledger: &mut WitnessLedger,
    header: &BlockHeader,
    call: &CallRequest,
    gas_cap: u64,
    chain_id: u64,
    scheduler: &mut FetchScheduler<B>,
) -> Result<PrefetchOutcome, EngineError> {
    scheduler.pre_seed_code(header, ledger, call.to).await?;

    let mut last_witness = pf_types::WitnessTable::new();
    let mut last_result: Option<CallResult> = None;
    let mut call_count: u64 = 0;

    while call_count < EVM_CALL_LIMIT {
        ledger.clear_witness();
        let savepoint = ledger.begin_savepoint();
        let result = pf_evm::execute(ledger, header, call, gas_cap, chain_id)?;
        ledger.rollback(savepoint).expect("savepoint is the most recently opened one");
        call_count += 1;
        last_result = Some(result);

        let witness = ledger.witness().clone();

        match scheduler.mode() {
            FetchMode::Optimistic => {
                if witness == last_witness {
                    last_witness = witness;
                    break;
                }
                last_witness = witness;
                scheduler.fetch_optimistic(header, ledger).await?;
            }
            FetchMode::Conservative => {
                last_witness = witness;
                let state_fetch_done = scheduler.fetch_conservative(header, ledger).await?;
                if !state_fetch_done {
                    break;
                }
            }
        }
    }

    tracing::debug!(iterations = call_count, witness_size = last_witness.len(), "prefetch loop finished");
    if call_count == EVM_CALL_LIMIT {
        tracing::info!(iterations = call_count, "prefetch loop hit the call limit without converging");
    } else {
        tracing::info!(iterations = call_count, "prefetch loop converged");
    }

    Ok(PrefetchOutcome {
        result: last_result.expect("loop body runs at least once since EVM_CALL_LIMIT > 0"),
        iterations: call_count,
    })
}
