//! Convenient re-exports of commonly used types from docfacade.
//!
//! ```ignore
//! use docfacade::prelude::*;
//! ```
//!
//! This provides access to:
//! - The connection facade and its credentials
//! - Driver traits and namespaces
//! - CRUD options and outcomes
//! - Configuration, retry policy and error types

pub use docfacade_core::{
    facade::ConnectionFacade,
    credentials::Credentials,
    backend::{DriverBackend, DriverConnector, Namespace, WriteSummary},
    options::{FindOptions, InsertOneOptions, InsertManyOptions, UpdateOptions, ReplaceOptions, DeleteOptions},
    outcome::Outcome,
    config::{FacadeConfig, ConnectionScheme},
    retry::RetryPolicy,
    error::{FacadeError, FacadeResult},
};
