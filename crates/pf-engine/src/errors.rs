use thiserror::Error;

/// The one error taxonomy that is user-visible (spec §7), flattening
/// everything the lower crates distinguish into the four observable kinds
/// the public API promises.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("gas larger than max allowed")]
    GasTooHigh,

    #[error("Unable to get account")]
    UnableToGetAccount,

    #[error("Unable to get slot")]
    UnableToGetSlot,

    #[error("Unable to get code")]
    UnableToGetCode,

    #[error("EVM execution failed: {0}")]
    EvmFailed(String),
}

impl From<pf_fetch::FetchError> for EngineError {
    fn from(err: pf_fetch::FetchError) -> Self {
        match err {
            pf_fetch::FetchError::Account => EngineError::UnableToGetAccount,
            pf_fetch::FetchError::Slot => EngineError::UnableToGetSlot,
            pf_fetch::FetchError::Code => EngineError::UnableToGetCode,
        }
    }
}

impl From<pf_evm::EvmAdapterError> for EngineError {
    fn from(err: pf_evm::EvmAdapterError) -> Self {
        EngineError::EvmFailed(err.to_string())
    }
}
