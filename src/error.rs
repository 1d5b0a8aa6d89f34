//! Error types for keyword operations.

use mongodb::error::{ErrorKind as DriverErrorKind, WriteFailure};
use thiserror::Error;

/// All errors that can occur while running library operations.
///
/// Driver failures are carried unchanged in [`MongoLibraryError::Driver`];
/// the remaining variants cover input the library rejects before reaching
/// the driver.
#[derive(Debug, Error)]
pub enum MongoLibraryError {
    /// Error reported by the MongoDB driver.
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    /// Malformed document identifier.
    #[error("invalid object id: {0}")]
    InvalidObjectId(#[from] bson::oid::Error),

    /// Sort direction other than `asc` or `desc`.
    #[error("invalid sort direction: {0:?} (expected \"asc\" or \"desc\")")]
    InvalidSortDirection(String),

    /// No client has been opened yet.
    #[error("not connected to MongoDB")]
    NotConnected,

    /// No database has been selected yet.
    #[error("no database selected")]
    NoDatabaseSelected,

    /// No collection has been selected yet.
    #[error("no collection selected")]
    NoCollectionSelected,

    /// Keyword name not known to the library.
    #[error("unknown keyword: {0}")]
    UnknownKeyword(String),

    /// Invalid keyword argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Extended JSON could not be converted to BSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid library configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The blocking runner could not start its runtime.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl MongoLibraryError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        MongoLibraryError::InvalidArgument(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        MongoLibraryError::Serialization(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        MongoLibraryError::Configuration(msg.into())
    }

    /// Check if this error came from the driver.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, MongoLibraryError::Driver(_))
    }

    /// Server error code, when the driver reports one.
    pub fn code(&self) -> Option<i32> {
        let MongoLibraryError::Driver(err) = self else {
            return None;
        };
        match err.kind.as_ref() {
            DriverErrorKind::Command(e) => Some(e.code),
            DriverErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
            DriverErrorKind::Write(WriteFailure::WriteConcernError(e)) => Some(e.code),
            _ => None,
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MongoLibraryError::Driver(_) => ErrorKind::Driver,
            MongoLibraryError::InvalidObjectId(_)
            | MongoLibraryError::InvalidSortDirection(_)
            | MongoLibraryError::UnknownKeyword(_)
            | MongoLibraryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            MongoLibraryError::NotConnected
            | MongoLibraryError::NoDatabaseSelected
            | MongoLibraryError::NoCollectionSelected => ErrorKind::State,
            MongoLibraryError::Serialization(_) => ErrorKind::Serialization,
            MongoLibraryError::Configuration(_) => ErrorKind::Configuration,
            MongoLibraryError::Runtime(_) => ErrorKind::Internal,
        }
    }
}

impl From<bson::extjson::de::Error> for MongoLibraryError {
    fn from(err: bson::extjson::de::Error) -> Self {
        MongoLibraryError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for MongoLibraryError {
    fn from(err: serde_json::Error) -> Self {
        MongoLibraryError::Serialization(err.to_string())
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MongoLibraryError>;

/// Error kind enumeration for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Failure reported by the driver.
    Driver,
    /// Rejected input.
    InvalidArgument,
    /// Operation called before connecting or selecting.
    State,
    /// Document conversion failure.
    Serialization,
    /// Configuration failure.
    Configuration,
    /// Failure inside the library itself.
    Internal,
}
