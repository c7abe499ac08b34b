//! Driver abstraction for the connection facade.
//!
//! This module defines the seam between the facade and the database driver
//! that actually speaks to the server.
//!
//! # Traits
//!
//! - [`DriverConnector`]: Factory turning a connection string into a connected backend
//! - [`DriverBackend`]: A connected handle exposing ping, disconnect and CRUD calls
//!
//! Every CRUD call is addressed by a [`Namespace`], so a backend handle holds no
//! selection state of its own; that lives in the facade.
//!
//! # Examples
//!
//! ```ignore
//! use docfacade::backend::{DriverBackend, DriverConnector, Namespace};
//! use std::time::Duration;
//! use bson::doc;
//!
//! let backend = connector
//!     .connect("mongodb+srv://u:p@cluster0.example.net/test", Duration::from_secs(10))
//!     .await?;
//!
//! backend.ping().await?;
//! backend
//!     .insert_one(&Namespace::new("test", "users"), doc! { "name": "Alice" }, Default::default())
//!     .await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fmt, fmt::Debug, time::Duration};
use async_trait::async_trait;
use bson::Document;

use crate::{
    error::FacadeResult,
    options::{DeleteOptions, FindOptions, InsertOneOptions, ReplaceOptions, UpdateOptions},
};


/// A fully qualified collection: database name plus collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Summary of a single-document write that matched by filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub matched_count: u64,
    pub modified_count: u64,
    /// Whether the write inserted a new document through upsert.
    pub upserted: bool,
}

/// A connected driver handle.
///
/// Implementers wrap whatever client object their driver exposes. They must be
/// thread-safe: the facade shares one handle between concurrent callers.
///
/// # Error Handling
///
/// Operations return [`FacadeResult<T>`](crate::error::FacadeResult). Driver
/// failures should be reported as [`FacadeError::Driver`](crate::error::FacadeError::Driver);
/// the facade decides whether to retry them.
#[async_trait]
pub trait DriverBackend: Send + Sync + Debug {
    /// Verifies the server is reachable through this handle.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if the server answered, or an error describing why it did not.
    async fn ping(&self) -> FacadeResult<()>;

    /// Closes the connection held by this handle.
    ///
    /// After a successful disconnect the handle must not be used again.
    async fn disconnect(&self) -> FacadeResult<()>;

    /// Finds the first document matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The collection to query
    /// * `filter` - A query document; an empty document matches everything
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` when nothing matches.
    async fn find_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<Option<Document>>;

    /// Finds every document matching `filter`, honoring sort, skip, limit and projection.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> FacadeResult<Vec<Document>>;

    /// Inserts a single document.
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
        options: InsertOneOptions,
    ) -> FacadeResult<()>;

    /// Applies an update document (`$set`, `$unset`, ...) to the first match of `filter`.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> FacadeResult<WriteSummary>;

    /// Replaces the first match of `filter` with `replacement`, keeping its `_id`.
    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        options: ReplaceOptions,
    ) -> FacadeResult<WriteSummary>;

    /// Deletes the first match of `filter`.
    ///
    /// # Returns
    ///
    /// The number of deleted documents (0 or 1).
    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: DeleteOptions,
    ) -> FacadeResult<u64>;

    /// Deletes every match of `filter`, returning how many were removed.
    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: DeleteOptions,
    ) -> FacadeResult<u64>;
}

#[async_trait]
impl<B> DriverBackend for &B
where
    B: DriverBackend,
{
    async fn ping(&self) -> FacadeResult<()> {
        (*self).ping().await
    }

    async fn disconnect(&self) -> FacadeResult<()> {
        (*self).disconnect().await
    }

    async fn find_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<Option<Document>> {
        (*self)
            .find_one(namespace, filter)
            .await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> FacadeResult<Vec<Document>> {
        (*self)
            .find(namespace, filter, options)
            .await
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
        options: InsertOneOptions,
    ) -> FacadeResult<()> {
        (*self)
            .insert_one(namespace, document, options)
            .await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> FacadeResult<WriteSummary> {
        (*self)
            .update_one(namespace, filter, update, options)
            .await
    }

    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        options: ReplaceOptions,
    ) -> FacadeResult<WriteSummary> {
        (*self)
            .replace_one(namespace, filter, replacement, options)
            .await
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: DeleteOptions,
    ) -> FacadeResult<u64> {
        (*self)
            .delete_one(namespace, filter, options)
            .await
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: DeleteOptions,
    ) -> FacadeResult<u64> {
        (*self)
            .delete_many(namespace, filter, options)
            .await
    }
}

/// Factory trait that establishes connections.
///
/// The facade calls [`connect`](DriverConnector::connect) on first use and
/// again whenever a ping fails, so implementations must be reusable.
#[async_trait]
pub trait DriverConnector: Send + Sync + Debug {
    /// The backend type produced by this connector.
    type Backend: DriverBackend;

    /// Connects using a full connection string.
    ///
    /// # Arguments
    ///
    /// * `uri` - The connection string, credentials included
    /// * `timeout` - Upper bound for the whole connect step
    ///
    /// # Returns
    ///
    /// Returns the connected backend, [`FacadeError::Connection`](crate::error::FacadeError::Connection)
    /// if the driver rejected the attempt, or
    /// [`FacadeError::ConnectTimeout`](crate::error::FacadeError::ConnectTimeout) if it took too long.
    async fn connect(&self, uri: &str, timeout: Duration) -> FacadeResult<Self::Backend>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_displays_dotted() {
        assert_eq!(Namespace::new("test", "users").to_string(), "test.users");
    }
}
