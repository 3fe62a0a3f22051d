use thiserror::Error;

use agenda_gate::DenialKind;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Ledger(#[from] agenda_ledger::LedgerError),

    #[error("fabric error: {0}")]
    Fabric(#[from] agenda_fabric::FabricError),

    #[error("invalid value: {0}")]
    Type(#[from] agenda_types::TypeError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// The caller-correctable denial behind this error, if it is one.
    pub fn denial(&self) -> Option<DenialKind> {
        match self {
            Self::Ledger(e) => e.denial(),
            _ => None,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
