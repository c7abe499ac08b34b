//! Error types and result types for facade operations.
//!
//! Connection management and selection return [`FacadeResult<T>`] directly.
//! CRUD operations wrap these errors inside an [`Outcome`](crate::outcome::Outcome)
//! so the caller can tell a dead connection from a failed operation.

use std::time::Duration;

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the connection facade and its drivers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacadeError {
    /// The driver could not establish a connection (bad URI, DNS failure, bad credentials).
    #[error("Connection error: {0}")]
    Connection(String),
    /// Establishing the connection took longer than the configured timeout.
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),
    /// An operation needed a live connection handle but none has been established.
    #[error("Not connected")]
    NotConnected,
    /// A collection was selected before any database.
    #[error("please set a database before setting a collection")]
    DatabaseNotSelected,
    /// A CRUD operation was invoked before any collection was selected.
    #[error("please set a collection before running an operation")]
    CollectionNotSelected,
    /// The named operation has no implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    /// The underlying driver reported a failure for an operation.
    #[error("Driver error: {0}")]
    Driver(String),
    /// Serialization/deserialization error when converting between BSON and JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The facade configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A specialized `Result` type for facade operations.
pub type FacadeResult<T> = Result<T, FacadeError>;

impl From<BsonError> for FacadeError {
    fn from(err: BsonError) -> Self {
        FacadeError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for FacadeError {
    fn from(err: SerdeJsonError) -> Self {
        FacadeError::Serialization(err.to_string())
    }
}
