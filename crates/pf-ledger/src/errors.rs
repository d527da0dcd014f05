use thiserror::Error;

/// Ledger-level failures.
///
/// The ledger itself never fails a read (missing state resolves to zero,
/// per spec) — this exists for the transactional boundary operations,
/// where misuse (rolling back a savepoint that was not the most recently
/// opened one) is a programmer error worth surfacing distinctly from a
/// silent panic.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("savepoint {0} is not the most recently opened savepoint")]
    StaleSavepoint(u64),
}
