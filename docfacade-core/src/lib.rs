//! Core of the docfacade project: a small connection facade over a document database driver.
//!
//! This crate provides:
//!
//! - **Connection facade** ([`facade`]) - Connect, select a database/collection and run CRUD calls
//! - **Driver abstraction** ([`backend`]) - Traits a concrete database driver implements
//! - **Outcomes** ([`outcome`]) - Tagged results telling "not found" apart from failures
//! - **Retry policy** ([`retry`]) - Configurable retries for mutating calls
//! - **Configuration** ([`config`]) - Connect timeout, URI scheme and retry settings
//! - **Options** ([`options`]) - Driver-agnostic options for CRUD calls
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docfacade_core::{facade::ConnectionFacade, options::FindOptions};
//! use bson::doc;
//!
//! let facade = ConnectionFacade::new(connector, "user", "password", "@cluster0.example.net/test");
//! facade.connect().await?;
//! facade.set_database("test").await;
//! facade.set_collection("users").await?;
//!
//! let adults = facade
//!     .find_many(doc! { "age": { "$gte": 18 } }, FindOptions::default())
//!     .await
//!     .into_result()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfacade_core;

pub mod backend;
pub mod config;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod options;
pub mod outcome;
pub mod retry;
