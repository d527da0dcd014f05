//! # Witness Ledger
//!
//! The in-memory frame the EVM Adapter reads and writes during a single
//! call. Every read is recorded into an ordered witness table; missing
//! state resolves to zero rather than an error, which is what lets the
//! Prefetch Loop run the EVM before the backend has answered anything.
//!
//! Savepoint/rollback undoes the account/storage/code writes `pf-evm`
//! makes while folding a `ResultAndState` diff back in, but never touches
//! the witness table — the witness is a ledger-lifetime record of what was
//! *read*, independent of what was later rolled back.

mod errors;

pub use errors::LedgerError;

use std::collections::HashMap;

use pf_types::{Address, Bytes, Code, WitnessKey, WitnessTable, B256, U256};
use revm::Database;
use revm_primitives::{AccountInfo, Bytecode};

#[derive(Debug, Clone, Default)]
struct LedgerAccount {
    balance: U256,
    nonce: u64,
    code_hash: B256,
}

impl LedgerAccount {
    fn empty() -> Self {
        Self { balance: U256::ZERO, nonce: 0, code_hash: pf_types::EMPTY_CODE_HASH }
    }
}

/// Snapshot taken by [`WitnessLedger::begin_savepoint`], consumed by either
/// [`WitnessLedger::rollback`] or [`WitnessLedger::commit`].
///
/// Opaque: callers are only meant to hold it and pass it back. Savepoints
/// nest in stack order; rolling back or committing one older than the most
/// recently opened one is a programmer error.
#[derive(Debug)]
pub struct Savepoint {
    id: u64,
    accounts: HashMap<Address, LedgerAccount>,
    storage: HashMap<(Address, U256), U256>,
    code: HashMap<Address, Bytes>,
}

/// The account/storage/code store the EVM Adapter runs against, plus the
/// witness table every read accumulates into.
#[derive(Debug, Default)]
pub struct WitnessLedger {
    accounts: HashMap<Address, LedgerAccount>,
    storage: HashMap<(Address, U256), U256>,
    code: HashMap<Address, Bytes>,
    witness: WitnessTable,
    next_savepoint_id: u64,
    open_savepoints: Vec<u64>,
}

impl WitnessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // -- getters (spec §6) --------------------------------------------

    pub fn get_balance(&mut self, address: Address) -> U256 {
        self.witness.touch_account(address);
        self.accounts.get(&address).map(|a| a.balance).unwrap_or(U256::ZERO)
    }

    pub fn get_nonce(&mut self, address: Address) -> u64 {
        self.witness.touch_account(address);
        self.accounts.get(&address).map(|a| a.nonce).unwrap_or(0)
    }

    pub fn get_code(&mut self, address: Address) -> Code {
        self.witness.touch_code(address);
        self.code.get(&address).cloned().unwrap_or_default()
    }

    pub fn get_storage(&mut self, address: Address, slot: U256) -> U256 {
        self.witness.touch_storage(address, slot);
        self.storage.get(&(address, slot)).copied().unwrap_or(U256::ZERO)
    }

    // -- setters (spec §6, never touch the witness) --------------------

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_insert_with(LedgerAccount::empty).balance = balance;
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.accounts.entry(address).or_insert_with(LedgerAccount::empty).nonce = nonce;
    }

    /// Records an address's code hash without supplying its bytecode — what
    /// a fetched [`pf_types::Account`] gives us before its code has been
    /// fetched separately.
    pub fn set_code_hash(&mut self, address: Address, code_hash: B256) {
        self.accounts.entry(address).or_insert_with(LedgerAccount::empty).code_hash = code_hash;
    }

    pub fn set_code(&mut self, address: Address, code: Code) {
        let hash = if code.is_empty() {
            pf_types::EMPTY_CODE_HASH
        } else {
            alloy_primitives::keccak256(&code)
        };
        self.accounts.entry(address).or_insert_with(LedgerAccount::empty).code_hash = hash;
        self.code.insert(address, code);
    }

    pub fn set_storage(&mut self, address: Address, slot: U256, value: U256) {
        self.storage.insert((address, slot), value);
    }

    // -- witness access --------------------------------------------------

    pub fn witness_keys(&self) -> impl Iterator<Item = (&WitnessKey, bool)> {
        self.witness.iter().map(|(key, touched)| (key, *touched))
    }

    pub fn witness(&self) -> &WitnessTable {
        &self.witness
    }

    pub fn clear_witness(&mut self) {
        self.witness.clear();
    }

    // -- transactional boundary (spec §4.B) -----------------------------

    pub fn begin_savepoint(&mut self) -> Savepoint {
        let id = self.next_savepoint_id;
        self.next_savepoint_id += 1;
        self.open_savepoints.push(id);
        Savepoint {
            id,
            accounts: self.accounts.clone(),
            storage: self.storage.clone(),
            code: self.code.clone(),
        }
    }

    pub fn rollback(&mut self, savepoint: Savepoint) -> Result<(), LedgerError> {
        self.pop_savepoint(savepoint.id)?;
        self.accounts = savepoint.accounts;
        self.storage = savepoint.storage;
        self.code = savepoint.code;
        Ok(())
    }

    pub fn commit(&mut self, savepoint: Savepoint) -> Result<(), LedgerError> {
        self.pop_savepoint(savepoint.id)
    }

    fn pop_savepoint(&mut self, id: u64) -> Result<(), LedgerError> {
        match self.open_savepoints.last() {
            Some(&top) if top == id => {
                self.open_savepoints.pop();
                Ok(())
            }
            _ => Err(LedgerError::StaleSavepoint(id)),
        }
    }
}

impl Database for WitnessLedger {
    type Error = std::convert::Infallible;

    fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        self.witness.touch_account(address);
        let Some(account) = self.accounts.get(&address) else {
            return Ok(None);
        };

        // Bytecode is looked up by address, not by hash: a freshly
        // discovered contract (reached via a nested CALL, never `set_code`'d
        // yet) still needs its code witnessed and scheduled even though no
        // hash-to-address mapping for it could possibly exist yet.
        let code = if account.code_hash == pf_types::EMPTY_CODE_HASH {
            None
        } else {
            self.witness.touch_code(address);
            self.code.get(&address).cloned().map(Bytecode::new_raw)
        };

        Ok(Some(AccountInfo {
            balance: account.balance,
            nonce: account.nonce,
            code_hash: account.code_hash,
            code,
        }))
    }

    /// Bytecode is resolved directly through [`basic`](Self::basic)'s
    /// `AccountInfo.code`, so revm only falls back to this when that
    /// returned `None` for a known-nonzero `code_hash` — i.e. code that has
    /// been witnessed but not yet fetched. Nothing more can be done here
    /// until it lands, so this is a harmless no-op.
    fn code_by_hash(&mut self, _code_hash: B256) -> Result<Bytecode, Self::Error> {
        Ok(Bytecode::new())
    }

    fn storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error> {
        self.witness.touch_storage(address, index);
        Ok(self.storage.get(&(address, index)).copied().unwrap_or(U256::ZERO))
    }

    fn block_hash(&mut self, _number: u64) -> Result<B256, Self::Error> {
        Ok(B256::ZERO)
    }
}

/// Lets the EVM Adapter hand revm a borrow of the ledger instead of giving
/// up ownership, so the same `WitnessLedger` can be reused across the
/// Prefetch Loop's many `execute` calls.
impl Database for &mut WitnessLedger {
    type Error = std::convert::Infallible;

    fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        (**self).basic(address)
    }

    fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        (**self).code_by_hash(code_hash)
    }

    fn storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error> {
        (**self).storage(address, index)
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        (**self).block_hash(number)
    }
}
