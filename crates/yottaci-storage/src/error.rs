use thiserror::Error;

/// Errors from the storage bindings.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("storage service returned {status} during {operation}")]
    Status { operation: &'static str, status: u16 },

    #[error("malformed connection string: missing {0}")]
    ConnectionString(&'static str),

    #[error("storage account key is not valid base64: {0}")]
    AccountKey(#[from] base64::DecodeError),
}
