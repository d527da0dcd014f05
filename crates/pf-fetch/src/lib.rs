//! # Fetch Scheduler
//!
//! Turns a witness table into backend lookups. Owns the three
//! already-fetched sets for the lifetime of one call, so a key is never
//! requested twice regardless of how many Prefetch Loop iterations it takes
//! to converge.
//!
//! Two modes: optimistic fetches every outstanding key concurrently each
//! iteration; conservative fetches only the first and lets the rest run in
//! the background, re-discovering them on a later iteration once they
//! land.

mod errors;

pub use errors::FetchError;

use std::{collections::HashSet, sync::Arc};

use futures::future::join_all;
use pf_backend::StateBackend;
use pf_ledger::WitnessLedger;
use pf_types::{Address, BlockHeader, U256};

/// Fetch parallelism policy (spec §4.D).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Optimistic,
    Conservative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FetchKey {
    Account(Address),
    Storage(Address, U256),
    Code(Address),
}

enum FetchOutcome {
    Account(Address, Option<pf_types::Account>),
    Storage(Address, U256, Option<U256>),
    Code(Address, Option<pf_types::Code>),
}

/// Owns the "already fetched" sets and (in conservative mode) the
/// in-flight background fetches for one `call`.
pub struct FetchScheduler<B: StateBackend> {
    backend: Arc<B>,
    mode: FetchMode,
    fetched_accounts: HashSet<Address>,
    fetched_storage: HashSet<(Address, U256)>,
    fetched_code: HashSet<Address>,
    pending: Vec<(FetchKey, tokio::task::JoinHandle<Result<FetchOutcome, FetchError>>)>,
}

impl<B: StateBackend + 'static> FetchScheduler<B> {
    pub fn new(backend: Arc<B>, mode: FetchMode) -> Self {
        Self {
            backend,
            mode,
            fetched_accounts: HashSet::new(),
            fetched_storage: HashSet::new(),
            fetched_code: HashSet::new(),
            pending: Vec::new(),
        }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Pre-seed step of the Prefetch Loop: fetch and install `address`'s
    /// code unconditionally, marking it fetched so the per-iteration plan
    /// never re-requests it.
    pub async fn pre_seed_code(
        &mut self,
        header: &BlockHeader,
        ledger: &mut WitnessLedger,
        address: Address,
    ) -> Result<(), FetchError> {
        let code = self.backend.get_code(header, address).await.map_err(|_| FetchError::Code)?;
        if let Some(code) = code {
            ledger.set_code(address, code);
        }
        self.fetched_code.insert(address);
        Ok(())
    }

    /// One round of the scheduler: for optimistic mode, fetches every
    /// outstanding witness key concurrently and writes all results back.
    /// Returns once the whole batch has landed.
    pub async fn fetch_optimistic(
        &mut self,
        header: &BlockHeader,
        ledger: &mut WitnessLedger,
    ) -> Result<(), FetchError> {
        debug_assert_eq!(self.mode, FetchMode::Optimistic);
        let plan = self.plan(ledger);
        if plan.is_empty() {
            return Ok(());
        }
        tracing::debug!(outstanding = plan.len(), "fetching witness keys optimistically");

        let futures = plan.iter().map(|key| fetch_one(&self.backend, header, *key));
        let outcomes = join_all(futures).await;
        for outcome in outcomes {
            self.apply(ledger, outcome?);
        }
        Ok(())
    }

    /// One round of the scheduler in conservative mode: drains any
    /// previously spawned background fetches that have since landed,
    /// fetches the first still-outstanding key inline, and backgrounds the
    /// rest.
    ///
    /// Returns `state_fetch_done`: `true` when there was outstanding or
    /// in-flight fetch work this round, `false` when there was nothing left
    /// to fetch — the Prefetch Loop breaks when this is `false`.
    pub async fn fetch_conservative(
        &mut self,
        header: &BlockHeader,
        ledger: &mut WitnessLedger,
    ) -> Result<bool, FetchError> {
        debug_assert_eq!(self.mode, FetchMode::Conservative);
        self.drain_ready(ledger).await?;

        let mut plan = self.plan(ledger);
        if plan.is_empty() && self.pending.is_empty() {
            return Ok(false);
        }
        if plan.is_empty() {
            // Nothing new discovered yet, but background work is still in
            // flight.
            return Ok(true);
        }

        let first = plan.remove(0);
        tracing::debug!(remaining = plan.len(), "fetching first witness key inline, backgrounding the rest");
        let outcome = fetch_one(&self.backend, header, first).await?;
        self.apply(ledger, outcome);

        for key in plan {
            let backend = self.backend.clone();
            let header = header.clone();
            let handle = tokio::spawn(async move { fetch_one(&backend, &header, key).await });
            self.pending.push((key, handle));
        }

        Ok(true)
    }

    async fn drain_ready(&mut self, ledger: &mut WitnessLedger) -> Result<(), FetchError> {
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for (key, handle) in std::mem::take(&mut self.pending) {
            if handle.is_finished() {
                let outcome = handle.await.expect("fetch task panicked")?;
                self.apply(ledger, outcome);
            } else {
                still_pending.push((key, handle));
            }
        }
        self.pending = still_pending;
        Ok(())
    }

    fn plan(&self, ledger: &WitnessLedger) -> Vec<FetchKey> {
        let mut keys = Vec::new();
        for (witness_key, code_touched) in ledger.witness_keys() {
            let (address, slot) = *witness_key;
            if address.is_zero() {
                continue;
            }
            match slot {
                None => {
                    if !self.fetched_accounts.contains(&address) {
                        keys.push(FetchKey::Account(address));
                    }
                    if code_touched && !self.fetched_code.contains(&address) {
                        keys.push(FetchKey::Code(address));
                    }
                }
                Some(slot) => {
                    if !self.fetched_storage.contains(&(address, slot)) {
                        keys.push(FetchKey::Storage(address, slot));
                    }
                }
            }
        }
        keys
    }

    fn apply(&mut self, ledger: &mut WitnessLedger, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Account(address, account) => {
                if let Some(account) = account {
                    ledger.set_balance(address, account.balance);
                    ledger.set_nonce(address, account.nonce);
                    ledger.set_code_hash(address, account.code_hash);
                }
                self.fetched_accounts.insert(address);
            }
            FetchOutcome::Storage(address, slot, value) => {
                if let Some(value) = value {
                    ledger.set_storage(address, slot, value);
                }
                self.fetched_storage.insert((address, slot));
            }
            FetchOutcome::Code(address, code) => {
                if let Some(code) = code {
                    ledger.set_code(address, code);
                }
                self.fetched_code.insert(address);
            }
        }
    }
}

async fn fetch_one<B: StateBackend>(
    backend: &B,
    header: &BlockHeader,
    key: FetchKey,
) -> Result<FetchOutcome, FetchError> {
    match key {
        FetchKey::Account(address) => {
            let account = backend.get_account(header, address).await.map_err(|err| {
                tracing::debug!(%address, error = %err, "account fetch failed");
                FetchError::Account
            })?;
            Ok(FetchOutcome::Account(address, account))
        }
        FetchKey::Storage(address, slot) => {
            let value = backend.get_storage(header, address, slot).await.map_err(|err| {
                tracing::debug!(%address, %slot, error = %err, "storage fetch failed");
                FetchError::Slot
            })?;
            Ok(FetchOutcome::Storage(address, slot, value))
        }
        FetchKey::Code(address) => {
            let code = backend.get_code(header, address).await.map_err(|err| {
                tracing::debug!(%address, error = %err, "code fetch failed");
                FetchError::Code
            })?;
            Ok(FetchOutcome::Code(address, code))
        }
    }
}
