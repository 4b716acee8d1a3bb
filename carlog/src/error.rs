use thiserror::Error;

/// A required form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Field {
    #[strum(serialize = "출발지")]
    Origin,
    #[strum(serialize = "도착지")]
    Destination,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}을(를) 입력해주세요")]
    EmptyField(Field),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::EmptyField(field) => *field,
        }
    }
}

/// Failures of the durable key-value substrate.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded ({needed} bytes needed, {quota} available)")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unsupported ledger version '{0}'")]
    UnsupportedVersion(String),
}

/// A single import row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportRowError {
    #[error("row {row}: no usable cells")]
    BlankRow { row: usize },
    #[error("row {row}: {reason}")]
    Unreadable { row: usize, reason: String },
}

/// The spreadsheet codec failed as a whole.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid CSV format: {0}")]
    InvalidCsv(#[from] csv::Error),
    #[error("Missing header row")]
    MissingHeader,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} already in progress")]
    ExchangeInFlight(crate::app::ExchangeKind),
    #[error("record not found: {0}")]
    RecordNotFound(crate::record::RecordId),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
