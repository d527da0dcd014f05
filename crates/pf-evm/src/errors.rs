use thiserror::Error;

/// Failure of a single synchronous EVM run.
#[derive(Error, Debug)]
pub enum EvmAdapterError {
    /// A call parameter could not be turned into a valid transaction
    /// environment (gas limit above the cap, malformed access list, ...).
    #[error("invalid call parameters: {0}")]
    InvalidCall(String),

    /// revm itself rejected the transaction before or during execution
    /// (deep calldata, invalid opcode tables, ...). Ordinary EVM reverts are
    /// not errors — they come back as a successful `CallResult` with
    /// `error` set.
    #[error("evm execution failed: {0}")]
    Execution(String),

    /// The interpreter halted instead of completing or reverting normally
    /// (out-of-gas, invalid opcode, stack over/underflow, ...). Unlike a
    /// revert this is not an ordinary application-level outcome, so it is
    /// raised as an error rather than folded into a `CallResult`.
    #[error("{0}")]
    Halt(String),
}
