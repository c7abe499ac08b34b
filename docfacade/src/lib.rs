//! Main docfacade crate: a small connection facade over a document database.
//!
//! This crate is the primary entry point. It re-exports the facade and its
//! supporting types from `docfacade-core` and gives access to the available
//! drivers.
//!
//! # Features
//!
//! - **One object** - Credentials, connection handle and database/collection selection live in a [`ConnectionFacade`](facade::ConnectionFacade)
//! - **Self-healing** - Every CRUD call pings first and reconnects once when the ping fails
//! - **Retries** - Mutating calls are retried according to a configurable [`RetryPolicy`](retry::RetryPolicy)
//! - **Honest results** - [`Outcome`](outcome::Outcome) separates "not found" from "connection unavailable" and "operation failed"
//!
//! # Quick Start
//!
//! ```ignore
//! use docfacade::{prelude::*, memory::InMemoryConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let facade = ConnectionFacade::new(
//!         InMemoryConnector::new(),
//!         "u",
//!         "p",
//!         "@cluster0.example.net/test",
//!     );
//!
//!     facade.connect().await.unwrap();
//!     facade.set_database("test").await;
//!     facade.set_collection("users").await.unwrap();
//!
//!     facade.insert_one(doc! { "name": "Alice", "age": 30 }, InsertOneOptions::default()).await;
//!
//!     let updated = facade
//!         .update_one(doc! { "name": "Alice" }, doc! { "$inc": { "age": 1 } }, UpdateOptions::default())
//!         .await;
//!
//!     match updated {
//!         Outcome::Success(user) => println!("Updated user: {:?}", user),
//!         Outcome::NotFound => println!("No such user"),
//!         other => println!("Update failed: {:?}", other.error()),
//!     }
//!
//!     facade.disconnect().await.unwrap();
//! }
//! ```
//!
//! # Configuration
//!
//! ```ignore
//! use docfacade::{prelude::*, mongodb::MongoDbConnector};
//!
//! let config = FacadeConfig::from_json_str(
//!     r#"{ "connect_timeout": 5000, "retry": { "max_retries": 3, "initial_backoff": 50, "max_backoff": 400 } }"#,
//! )?;
//!
//! let facade = ConnectionFacade::with_config(
//!     MongoDbConnector::new(),
//!     Credentials::new("user", "password"),
//!     "@cluster0.example.net/test",
//!     config,
//! )?;
//! # Ok::<(), FacadeError>(())
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - In-process driver for development and tests
//! - [`mongodb`] - MongoDB driver (requires `mongodb` feature)

pub mod prelude;

pub use docfacade_core::{backend, config, credentials, error, facade, options, outcome, retry};

// Re-export BSON types for convenience
pub use bson;

/// In-memory driver implementation.
pub mod memory {
    pub use docfacade_memory::{InMemoryConnector, InMemoryBackend, DriverOperation};
}

/// MongoDB driver implementation.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docfacade_mongodb::{MongoDbConnector, MongoDbBackend};
}
