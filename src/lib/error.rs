use thiserror::Error;

/// Main error type for the resize recommender
#[derive(Error, Debug)]
pub enum ResizeError {
    /// ONTAP REST API errors
    #[error("ONTAP error: {0}")]
    Ontap(#[from] OntapError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sizing arithmetic errors
    #[error("Sizing error: {0}")]
    Sizing(#[from] SizingError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report formatting errors
    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// ONTAP REST API errors
#[derive(Error, Debug)]
pub enum OntapError {
    /// Connection or transport failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Cluster rejected the credentials
    #[error("Authentication failed for user '{0}'")]
    AuthenticationFailed(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Cluster address could not be turned into a URL
    #[error("Invalid cluster address: {0}")]
    InvalidUrl(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required configuration
    #[error("Missing required: {0}")]
    MissingRequired(String),

    /// Invalid configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Password prompt failed
    #[error("Password prompt failed: {0}")]
    Prompt(String),
}

/// Errors raised while computing a recommendation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SizingError {
    /// A reserve of 100% leaves no usable space to grow into
    #[error("Invalid snapshot reserve on {volume}: {percent}%")]
    InvalidSnapshotReserve { volume: String, percent: u8 },

    /// used + available is zero
    #[error("Active filesystem of {0} has zero size")]
    EmptyActiveFilesystem(String),

    /// Target utilization outside 1..=100
    #[error("Invalid target utilization: {0}%")]
    InvalidTarget(u8),

    /// Required field absent from the volume record
    #[error("Volume {volume} is missing field '{field}'")]
    MissingField { volume: String, field: &'static str },
}

/// Helper type alias for Results
pub type Result<T> = std::result::Result<T, ResizeError>;
