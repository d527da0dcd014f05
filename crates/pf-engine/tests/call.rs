//! End-to-end scenarios against the public `Engine` API, backed entirely by
//! `MockBackend`. Mirrors the teacher's pattern of driving the whole
//! pipeline through its outermost entry point rather than unit-testing
//! each stage in isolation.

use std::sync::Arc;

use pf_backend::testing::MockBackend;
use pf_engine::{Engine, EngineConfig, FetchMode};
use pf_types::{Account, Address, BlockHeader, CallRequest, Code, U256};

fn header() -> BlockHeader {
    BlockHeader {
        hash: Default::default(),
        number: 18_000_000,
        parent_hash: Default::default(),
        timestamp: 1_700_000_000,
        gas_limit: 30_000_000,
        base_fee: Some(10_000_000_000),
        prev_randao: Default::default(),
        difficulty: U256::ZERO,
        coinbase: Address::ZERO,
        excess_blob_gas: None,
    }
}

fn engine(backend: MockBackend) -> Engine<MockBackend> {
    Engine::new(Arc::new(backend), EngineConfig::default())
}

#[tokio::test]
async fn plain_eth_transfer_succeeds_without_reverting() {
    let backend = MockBackend::new();
    let from = Address::repeat_byte(1);
    let to = Address::repeat_byte(2);
    backend.with_account(from, Account { balance: U256::from(10u64).pow(U256::from(20u64)), ..Default::default() });

    let call = CallRequest { from: Some(from), to, value: Some(U256::from(1u64)), ..Default::default() };

    let result = engine(backend).call(&header(), &call, FetchMode::Optimistic).await.unwrap();
    assert!(!result.reverted());
}

#[tokio::test]
async fn call_to_address_with_no_backend_entry_still_succeeds() {
    // An address the backend has never heard of reads as the zero account,
    // not an error — `Ok(None)` is a valid answer, not a failure.
    let backend = MockBackend::new();
    let to = Address::repeat_byte(9);
    let call = CallRequest { to, ..Default::default() };

    let result = engine(backend).call(&header(), &call, FetchMode::Optimistic).await.unwrap();
    assert!(!result.reverted());
    assert_eq!(result.gas_used, 21_000);
}

#[tokio::test]
async fn uninitialized_storage_read_converges_after_a_fetch_round() {
    // A contract that SLOADs a slot the backend has no value for: first
    // iteration discovers the slot, second iteration re-executes seeing it
    // (still zero) and converges.
    let backend = MockBackend::new();
    let to = Address::repeat_byte(3);
    // PUSH1 0x00 SLOAD STOP
    backend.with_code(to, Code::from_static(&[0x60, 0x00, 0x54, 0x00]));
    backend.with_account(to, Account::default());

    let call = CallRequest { to, ..Default::default() };
    let result = engine(backend).call(&header(), &call, FetchMode::Optimistic).await.unwrap();
    assert!(!result.reverted());
}

#[tokio::test]
async fn backend_failure_surfaces_as_unable_to_get_slot() {
    let backend = MockBackend::new();
    let to = Address::repeat_byte(4);
    backend.with_code(to, Code::from_static(&[0x60, 0x00, 0x54, 0x00]));
    backend.with_account(to, Account::default());
    backend.fail_storage_lookups_for(to);

    let call = CallRequest { to, ..Default::default() };
    let err = engine(backend).call(&header(), &call, FetchMode::Optimistic).await.unwrap_err();
    assert!(matches!(err, pf_engine::EngineError::UnableToGetSlot));
}

#[tokio::test]
async fn optimistic_and_conservative_modes_agree() {
    let backend = MockBackend::new();
    let from = Address::repeat_byte(5);
    let to = Address::repeat_byte(6);
    backend.with_account(from, Account { balance: U256::from(10u64).pow(U256::from(20u64)), ..Default::default() });
    backend.with_code(to, Code::from_static(&[0x60, 0x01, 0x60, 0x00, 0x54, 0x00]));
    backend.with_account(to, Account::default());
    backend.with_storage(to, U256::from(1u64), U256::from(42u64));

    let call = CallRequest { from: Some(from), to, ..Default::default() };

    let optimistic = {
        let b = MockBackend::new();
        b.with_account(from, Account { balance: U256::from(10u64).pow(U256::from(20u64)), ..Default::default() });
        b.with_code(to, Code::from_static(&[0x60, 0x01, 0x60, 0x00, 0x54, 0x00]));
        b.with_account(to, Account::default());
        b.with_storage(to, U256::from(1u64), U256::from(42u64));
        engine(b).call(&header(), &call, FetchMode::Optimistic).await.unwrap()
    };
    let conservative = engine(backend).call(&header(), &call, FetchMode::Conservative).await.unwrap();

    assert_eq!(optimistic, conservative);
}

#[tokio::test]
async fn access_list_excludes_sender_and_sorts_addresses() {
    let backend = MockBackend::new();
    let from = Address::repeat_byte(7);
    let to = Address::repeat_byte(8);
    backend.with_account(from, Account { balance: U256::from(10u64).pow(U256::from(20u64)), ..Default::default() });
    backend.with_code(to, Code::from_static(&[0x60, 0x01, 0x60, 0x00, 0x54, 0x00]));
    backend.with_account(to, Account::default());
    backend.with_storage(to, U256::from(1u64), U256::from(42u64));

    let call = CallRequest { from: Some(from), to, ..Default::default() };
    let (access_list, error, _gas) =
        engine(backend).create_access_list(&header(), &call, FetchMode::Optimistic).await.unwrap();

    assert!(error.is_none());
    assert!(access_list.0.iter().all(|item| item.address != from));
    let addresses: Vec<_> = access_list.0.iter().map(|item| item.address).collect();
    let mut sorted = addresses.clone();
    sorted.sort();
    assert_eq!(addresses, sorted);
}

#[tokio::test]
async fn estimate_gas_binary_search_finds_a_non_reverting_minimum() {
    let backend = MockBackend::new();
    let from = Address::repeat_byte(10);
    let to = Address::repeat_byte(11);
    backend.with_account(from, Account { balance: U256::from(10u64).pow(U256::from(20u64)), ..Default::default() });

    let call = CallRequest { from: Some(from), to, value: Some(U256::from(1u64)), ..Default::default() };
    let gas = engine(backend).estimate_gas(&header(), &call, FetchMode::Optimistic).await.unwrap();

    assert_eq!(gas, 21_000);
}

#[tokio::test]
async fn invalid_opcode_halts_and_surfaces_as_evm_failed() {
    // A halt is not an ordinary revert: it must come back as an error, not
    // a successful `CallResult` with an error string attached.
    let backend = MockBackend::new();
    let to = Address::repeat_byte(13);
    backend.with_code(to, Code::from_static(&[0xfe])); // INVALID
    backend.with_account(to, Account::default());

    let call = CallRequest { to, ..Default::default() };
    let err = engine(backend).call(&header(), &call, FetchMode::Optimistic).await.unwrap_err();
    assert!(matches!(err, pf_engine::EngineError::EvmFailed(_)));
}

#[tokio::test]
async fn gas_above_cap_is_rejected_before_any_execution() {
    let backend = MockBackend::new();
    let call = CallRequest { to: Address::repeat_byte(12), gas: Some(u64::MAX), ..Default::default() };

    let err = engine(backend).call(&header(), &call, FetchMode::Optimistic).await.unwrap_err();
    assert!(matches!(err, pf_engine::EngineError::GasTooHigh));
}
