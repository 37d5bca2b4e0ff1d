use thiserror::Error;

/// Central error type for the medialock pipeline
#[derive(Error, Debug)]
pub enum MedialockError {
    // ============================================================================
    // Upload Pipeline Errors
    // ============================================================================
    #[error("Source video already carries a provenance marker")]
    DuplicateSource,

    #[error("Watermark composition failed: {0}")]
    Composition(String),

    #[error("Duration probe failed: {0}")]
    Probe(String),

    #[error("Provenance embedding failed: {0}")]
    Embedding(String),

    #[error("Upload precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Deadline expired before stage '{0}' started")]
    Timeout(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    // ============================================================================
    // Key Lifecycle Errors
    // ============================================================================
    #[error("Key binding failed for alias '{alias}': {message}")]
    KeyBinding {
        alias: String,
        message: String,
        retryable: bool,
    },

    #[error("Alias already bound: {0}")]
    AliasBound(String),

    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    // ============================================================================
    // Encryption Errors
    // ============================================================================
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    // ============================================================================
    // License / Read-Path Errors
    // ============================================================================
    #[error("Caller is not authorized for this asset")]
    UnauthorizedLicense,

    #[error("Asset is not distributed in commercial mode")]
    NotCommercial,

    // ============================================================================
    // Session Errors
    // ============================================================================
    #[error("Upload session not found: {0}")]
    SessionNotFound(String),

    #[error("No asset found for token: {0}")]
    TokenNotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutex lock error")]
    LockError,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MedialockError {
    /// Whether the caller may retry the failed operation as-is.
    ///
    /// Renames and racy alias bindings are designed to be retried to
    /// completion; everything else in the taxonomy is terminal for the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            MedialockError::KeyBinding { retryable, .. } => *retryable,
            MedialockError::Storage(_) => true,
            _ => false,
        }
    }
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for MedialockError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        MedialockError::LockError
    }
}

// Automatic conversion from base64::DecodeError
impl From<base64::DecodeError> for MedialockError {
    fn from(err: base64::DecodeError) -> Self {
        MedialockError::DecryptionFailed(format!("Base64 decode error: {}", err))
    }
}

// Helper type alias for Results
pub type MedialockResult<T> = Result<T, MedialockError>;
