//! # EVM Adapter
//!
//! Runs one [`CallRequest`] against a [`WitnessLedger`] and folds the
//! resulting state diff back into it. Deliberately synchronous: everything
//! the interpreter touches is either already in the ledger or resolves to
//! zero, so there is nothing here to await.
//!
//! Built on the same revm `Context`/`MainBuilder`/`MainContext` builder the
//! teacher's client executor uses (`client-executor/src/io.rs`), minus the
//! `reth`/`alloy-evm` scaffolding that builder normally rides on top of —
//! this adapter talks to bare revm directly.

mod errors;

pub use errors::EvmAdapterError;

use alloy_primitives::TxKind;
use pf_ledger::WitnessLedger;
use pf_types::{BlockHeader, CallRequest, CallResult};
use revm::{
    context::{BlockEnv, TxEnv},
    context_interface::result::{ExecutionResult, Output},
    Context, MainBuilder, MainContext,
};
use revm_primitives::BlobExcessGasAndPrice;

/// Gas limit applied when a call omits one. Matches the public API's own
/// default (`pf_engine::EVM_CALL_GAS_CAP`) but is kept local so this crate
/// has no dependency on `pf-engine`.
const DEFAULT_GAS_LIMIT: u64 = 50_000_000;

/// Runs `call` against `header`'s block context, using `ledger` for all
/// state. `gas_cap` bounds the gas limit actually used regardless of what
/// the call requests, mirroring standard `eth_call` behavior. `chain_id`
/// sets the `CfgEnv` field of the same name (spec's network selection).
///
/// Mutates `ledger`: every read is recorded into its witness table, and the
/// post-execution state diff is written back through the ledger's setters.
/// Callers that want this to be undoable wrap the call in a
/// `begin_savepoint`/`rollback` pair.
pub fn execute(
    ledger: &mut WitnessLedger,
    header: &BlockHeader,
    call: &CallRequest,
    gas_cap: u64,
    chain_id: u64,
) -> Result<CallResult, EvmAdapterError> {
    let block_env = build_block_env(header);
    let tx_env = build_tx_env(call, gas_cap)?;

    tracing::debug!(to = %call.to, gas_limit = tx_env.gas_limit, "executing call");

    let evm = Context::mainnet()
        .with_db(&mut *ledger)
        .with_block(block_env)
        .modify_cfg_chained(|cfg| {
            cfg.chain_id = chain_id;
            cfg.disable_nonce_check = true;
            cfg.disable_balance_check = true;
            cfg.disable_block_gas_limit = true;
        });

    let mut evm = evm.build_mainnet();

    let result_and_state =
        evm.transact(tx_env).map_err(|err| EvmAdapterError::Execution(err.to_string()))?;

    apply_state_diff(ledger, result_and_state.state);

    call_result_from(result_and_state.result)
}

fn build_block_env(header: &BlockHeader) -> BlockEnv {
    BlockEnv {
        number: header.number,
        beneficiary: header.coinbase,
        timestamp: header.timestamp,
        gas_limit: header.gas_limit,
        basefee: header.base_fee_or_default(),
        difficulty: header.difficulty,
        prevrandao: Some(header.prev_randao),
        blob_excess_gas_and_price: Some(BlobExcessGasAndPrice::new(
            header.excess_blob_gas_or_default(),
        )),
        ..Default::default()
    }
}

fn build_tx_env(call: &CallRequest, gas_cap: u64) -> Result<TxEnv, EvmAdapterError> {
    let gas_limit = call.gas.unwrap_or(DEFAULT_GAS_LIMIT).min(gas_cap);
    if gas_limit == 0 {
        return Err(EvmAdapterError::InvalidCall("gas limit must be nonzero".into()));
    }

    Ok(TxEnv {
        caller: call.from_or_default(),
        gas_limit,
        gas_price: call.gas_price.unwrap_or(0),
        kind: TxKind::Call(call.to),
        value: call.value.unwrap_or_default(),
        data: call.input.clone(),
        nonce: 0,
        access_list: call.access_list.clone().unwrap_or_default(),
        blob_hashes: call.blob_versioned_hashes.clone().unwrap_or_default(),
        ..Default::default()
    })
}

fn apply_state_diff(
    ledger: &mut WitnessLedger,
    state: std::collections::HashMap<pf_types::Address, revm_primitives::Account>,
) {
    for (address, account) in state {
        ledger.set_balance(address, account.info.balance);
        ledger.set_nonce(address, account.info.nonce);
        if let Some(code) = account.info.code.as_ref() {
            ledger.set_code(address, code.original_bytes());
        }
        for (slot, value) in account.storage {
            ledger.set_storage(address, slot, value.present_value);
        }
    }
}

/// Ordinary reverts become a successful `CallResult` with `error` set; a
/// halt (out-of-gas, invalid opcode, ...) is not an ordinary outcome and is
/// raised as an error instead (spec's EVM-failure taxonomy).
fn call_result_from(result: ExecutionResult) -> Result<CallResult, EvmAdapterError> {
    let gas_used = result.gas_used();
    match result {
        ExecutionResult::Success { output, .. } => {
            let output = match output {
                Output::Call(bytes) => bytes,
                Output::Create(bytes, _) => bytes,
            };
            Ok(CallResult { output, gas_used, error: None })
        }
        ExecutionResult::Revert { output, .. } => {
            Ok(CallResult { output, gas_used, error: Some("execution reverted".to_string()) })
        }
        ExecutionResult::Halt { reason, .. } => Err(EvmAdapterError::Halt(format!("{reason:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_types::{Address, U256};

    fn header() -> BlockHeader {
        BlockHeader {
            hash: Default::default(),
            number: 1,
            parent_hash: Default::default(),
            timestamp: 1_700_000_000,
            gas_limit: 30_000_000,
            base_fee: Some(1_000_000_000),
            prev_randao: Default::default(),
            difficulty: U256::ZERO,
            coinbase: Address::ZERO,
            excess_blob_gas: None,
        }
    }

    #[test]
    fn plain_value_transfer_succeeds_with_base_gas() {
        let mut ledger = WitnessLedger::new();
        let to = Address::repeat_byte(0xaa);
        let call = CallRequest {
            from: Some(Address::repeat_byte(0x11)),
            to,
            gas: None,
            gas_price: None,
            value: Some(U256::from(1u64)),
            input: Default::default(),
            access_list: None,
            blob_versioned_hashes: None,
        };

        let result = execute(&mut ledger, &header(), &call, 50_000_000, 1).unwrap();
        assert!(!result.reverted());
        assert_eq!(result.gas_used, 21_000);
    }

    #[test]
    fn zero_gas_limit_is_rejected() {
        let mut ledger = WitnessLedger::new();
        let call = CallRequest {
            from: None,
            to: Address::repeat_byte(0xbb),
            gas: Some(0),
            gas_price: None,
            value: None,
            input: Default::default(),
            access_list: None,
            blob_versioned_hashes: None,
        };

        assert!(execute(&mut ledger, &header(), &call, 50_000_000, 1).is_err());
    }

    #[test]
    fn halt_is_raised_as_an_error_not_folded_into_call_result() {
        let mut ledger = WitnessLedger::new();
        let to = Address::repeat_byte(0xcc);
        ledger.set_code(to, pf_types::Code::from_static(&[0xfe])); // INVALID opcode
        let call = CallRequest {
            from: None,
            to,
            gas: None,
            gas_price: None,
            value: None,
            input: Default::default(),
            access_list: None,
            blob_versioned_hashes: None,
        };

        let err = execute(&mut ledger, &header(), &call, 50_000_000, 1).unwrap_err();
        assert!(matches!(err, EvmAdapterError::Halt(_)));
    }
}
