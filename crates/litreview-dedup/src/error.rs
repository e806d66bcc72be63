//! Error types for the deduplication and import pipeline.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Each layer has its own enum: the external catalog ([`ClientError`]), the record
//! store ([`StoreError`]), import source parsing ([`ImportError`]) and the job
//! controller ([`JobError`]).

use std::time::Duration;

/// Errors from the external catalog HTTP client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by the catalog (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }

    /// Returns true if the catalog has no record for the requested identifier.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Errors from the record store collaborator.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// No record with the given id.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The store rejected a write (constraint violation, invalid record).
    #[error("Store rejected record: {0}")]
    Conflict(String),

    /// The store cannot be reached at all.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backing file I/O failed.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file could not be (de)serialized.
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Returns true if this error means the store is down, not that one call failed.
    ///
    /// A fatal error during an import fails the whole job instead of a single item.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

/// Format errors raised while reading an import source.
///
/// These are always raised before a job starts, never mid-job.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    /// Plain text whose first line is neither a catalog id nor a DOI.
    #[error("Unrecognized import format: {0}")]
    UnrecognizedFormat(String),

    /// Tabular input without any column that maps to the record title.
    #[error("Tabular input has no title column (headers: {headers})")]
    MissingTitleColumn {
        /// Header row as read, comma separated.
        headers: String,
    },

    /// Malformed tabular input.
    #[error("Malformed tabular input: {0}")]
    Csv(#[from] csv::Error),

    /// Source file could not be read.
    #[error("Cannot read import source: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Create an unrecognized format error.
    #[must_use]
    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::UnrecognizedFormat(message.into())
    }
}

/// Errors from the batch import controller itself.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    /// A job is already running on this controller.
    #[error("Import job {0} is still running")]
    AlreadyRunning(uuid::Uuid),

    /// `pause`, `resume` or `cancel` was called with no running job.
    #[error("No import job is running")]
    NoActiveJob,

    /// The source needs the external catalog but none is configured.
    #[error("This import source requires an external catalog")]
    CatalogRequired,

    /// Options failed validation.
    #[error("Invalid import option '{field}': {message}")]
    InvalidOptions {
        /// Option that failed validation
        field: String,
        /// Validation error message
        message: String,
    },
}

impl JobError {
    /// Create an invalid options error.
    #[must_use]
    pub fn invalid_options(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptions { field: field.into(), message: message.into() }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for import source parsing.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type alias for job control operations.
pub type JobResult<T> = Result<T, JobError>;
