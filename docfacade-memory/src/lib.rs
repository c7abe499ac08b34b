//! In-memory driver for docfacade.
//!
//! This crate provides an implementation of the `DriverConnector` and
//! `DriverBackend` traits that keeps every database in process memory. It is
//! intended for development and tests: it understands enough of the MongoDB
//! filter and update syntax for typical CRUD code, and it can inject faults to
//! exercise the facade's reconnect and retry paths.
//!
//! # Features
//!
//! - **Shared server state** - Every connection from one connector sees the same data
//! - **Filter evaluation** - Equality, comparison, `$in`/`$nin`, `$exists`, `$and`/`$or`/`$nor`
//! - **Updates** - `$set`, `$unset`, `$inc`, whole-document replacement and upserts
//! - **Fault injection** - Unreachable server, transient failures, slow connects, call counters
//!
//! # Quick Start
//!
//! ```ignore
//! use docfacade::{prelude::*, memory::{InMemoryConnector, DriverOperation}};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let connector = InMemoryConnector::new();
//!     let facade = ConnectionFacade::new(connector.clone(), "u", "p", "@cluster0.example.net/test");
//!
//!     facade.set_database("test").await;
//!     facade.set_collection("users").await.unwrap();
//!
//!     // The first insert attempt fails, the retry succeeds.
//!     connector.fail_next(DriverOperation::InsertOne, 1).await;
//!     let inserted = facade.insert_one(doc! { "name": "Alice" }, Default::default()).await;
//!
//!     assert!(inserted.is_success());
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfacade_memory;

pub mod store;
pub mod evaluator;
pub mod fault;

pub use store::{InMemoryConnector, InMemoryBackend};
pub use fault::DriverOperation;
