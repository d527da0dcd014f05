//! In-memory backend doubles used by this workspace's test suites.
//!
//! Grounded on the teacher's `host-executor/src/test.rs` pattern of wiring
//! a concrete provider straight into the executor under test, except here
//! the "provider" is a plain `HashMap` instead of a live RPC endpoint.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use pf_types::{Account, Address, BlockHeader, Code, U256};

use crate::{BackendError, StateBackend};

/// A backend backed entirely by in-memory maps, with no notion of "header"
/// beyond using it as part of the lookup for error injection.
#[derive(Debug, Default)]
pub struct MockBackend {
    accounts: Mutex<HashMap<Address, Account>>,
    storage: Mutex<HashMap<(Address, U256), U256>>,
    code: Mutex<HashMap<Address, Code>>,
    /// Addresses whose storage lookups should fail with a transport error,
    /// simulating a flaky backend.
    fail_storage_for: Mutex<Vec<Address>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(&self, address: Address, account: Account) -> &Self {
        self.accounts.lock().unwrap().insert(address, account);
        self
    }

    pub fn with_storage(&self, address: Address, slot: U256, value: U256) -> &Self {
        self.storage.lock().unwrap().insert((address, slot), value);
        self
    }

    pub fn with_code(&self, address: Address, code: Code) -> &Self {
        self.code.lock().unwrap().insert(address, code);
        self
    }

    pub fn fail_storage_lookups_for(&self, address: Address) -> &Self {
        self.fail_storage_for.lock().unwrap().push(address);
        self
    }
}

#[async_trait]
impl StateBackend for MockBackend {
    async fn get_account(
        &self,
        _header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Account>, BackendError> {
        Ok(self.accounts.lock().unwrap().get(&address).copied())
    }

    async fn get_storage(
        &self,
        _header: &BlockHeader,
        address: Address,
        slot: U256,
    ) -> Result<Option<U256>, BackendError> {
        if self.fail_storage_for.lock().unwrap().contains(&address) {
            return Err(BackendError::Transport("simulated transport failure".into()));
        }
        Ok(self.storage.lock().unwrap().get(&(address, slot)).copied())
    }

    async fn get_code(
        &self,
        _header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Code>, BackendError> {
        Ok(self.code.lock().unwrap().get(&address).cloned())
    }
}

/// Wraps another backend and counts how many times each lookup kind was
/// invoked per key, for asserting the "fetched at most once" invariant.
#[derive(Debug, Default)]
pub struct CountingBackend<B> {
    inner: B,
    account_calls: Mutex<HashMap<Address, usize>>,
    storage_calls: Mutex<HashMap<(Address, U256), usize>>,
    code_calls: Mutex<HashMap<Address, usize>>,
    total_calls: AtomicUsize,
}

impl<B> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            account_calls: Mutex::new(HashMap::new()),
            storage_calls: Mutex::new(HashMap::new()),
            code_calls: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn max_calls_for_any_key(&self) -> usize {
        let accounts = self.account_calls.lock().unwrap().values().copied().max().unwrap_or(0);
        let storage = self.storage_calls.lock().unwrap().values().copied().max().unwrap_or(0);
        let code = self.code_calls.lock().unwrap().values().copied().max().unwrap_or(0);
        accounts.max(storage).max(code)
    }
}

#[async_trait]
impl<B: StateBackend> StateBackend for CountingBackend<B> {
    async fn get_account(
        &self,
        header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Account>, BackendError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.account_calls.lock().unwrap().entry(address).or_insert(0) += 1;
        self.inner.get_account(header, address).await
    }

    async fn get_storage(
        &self,
        header: &BlockHeader,
        address: Address,
        slot: U256,
    ) -> Result<Option<U256>, BackendError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.storage_calls.lock().unwrap().entry((address, slot)).or_insert(0) += 1;
        self.inner.get_storage(header, address, slot).await
    }

    async fn get_code(
        &self,
        header: &BlockHeader,
        address: Address,
    ) -> Result<Option<Code>, BackendError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.code_calls.lock().unwrap().entry(address).or_insert(0) += 1;
        self.inner.get_code(header, address).await
    }
}
