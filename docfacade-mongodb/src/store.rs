use std::time::Duration;
use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, ReadPreference, SelectionCriteria},
};
use docfacade_core::{
    backend::{DriverBackend, DriverConnector, Namespace, WriteSummary},
    error::{FacadeError, FacadeResult},
    options::{DeleteOptions, FindOptions, InsertOneOptions, ReplaceOptions, UpdateOptions},
};

use crate::options::{
    delete_options, find_options, insert_one_options, replace_options, update_options,
};


/// Connected MongoDB handle.
///
/// Wraps a [`mongodb::Client`]; pooling, server selection and wire protocol
/// are left to the driver.
#[derive(Debug, Clone)]
pub struct MongoDbBackend {
    client: Client,
}

impl MongoDbBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }
}

#[async_trait]
impl DriverBackend for MongoDbBackend {
    async fn ping(&self) -> FacadeResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))?;

        Ok(())
    }

    async fn disconnect(&self) -> FacadeResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }

    async fn find_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<Option<Document>> {
        self.get_collection(namespace)
            .find_one(filter)
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> FacadeResult<Vec<Document>> {
        self.get_collection(namespace)
            .find(filter)
            .with_options(find_options(options))
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
        options: InsertOneOptions,
    ) -> FacadeResult<()> {
        self.get_collection(namespace)
            .insert_one(document)
            .with_options(insert_one_options(options))
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))?;

        Ok(())
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> FacadeResult<WriteSummary> {
        let result = self.get_collection(namespace)
            .update_one(filter, update)
            .with_options(update_options(options))
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))?;

        Ok(WriteSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted: result.upserted_id.is_some(),
        })
    }

    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        options: ReplaceOptions,
    ) -> FacadeResult<WriteSummary> {
        let result = self.get_collection(namespace)
            .replace_one(filter, replacement)
            .with_options(replace_options(options))
            .await
            .map_err(|e| FacadeError::Driver(e.to_string()))?;

        Ok(WriteSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted: result.upserted_id.is_some(),
        })
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: DeleteOptions,
    ) -> FacadeResult<u64> {
        Ok(
            self.get_collection(namespace)
                .delete_one(filter)
                .with_options(delete_options(options))
                .await
                .map_err(|e| FacadeError::Driver(e.to_string()))?
                .deleted_count
        )
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: DeleteOptions,
    ) -> FacadeResult<u64> {
        Ok(
            self.get_collection(namespace)
                .delete_many(filter)
                .with_options(delete_options(options))
                .await
                .map_err(|e| FacadeError::Driver(e.to_string()))?
                .deleted_count
        )
    }
}

/// Connector producing [`MongoDbBackend`]s through [`ClientOptions::parse`].
///
/// The timeout handed to [`connect`](DriverConnector::connect) becomes the
/// driver's connect and server selection timeout.
#[derive(Debug, Clone, Default)]
pub struct MongoDbConnector {
    app_name: Option<String>,
}

impl MongoDbConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Application name reported to the server and shown in its logs.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub(crate) fn apply(&self, options: &mut ClientOptions, timeout: Duration) {
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }
    }
}

#[async_trait]
impl DriverConnector for MongoDbConnector {
    type Backend = MongoDbBackend;

    async fn connect(&self, uri: &str, timeout: Duration) -> FacadeResult<Self::Backend> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| FacadeError::Connection(e.to_string()))?;

        self.apply(&mut options, timeout);

        Ok(MongoDbBackend::new(
            Client::with_options(options)
                .map_err(|e| FacadeError::Connection(e.to_string()))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_uri_is_a_connection_error() {
        let result = MongoDbConnector::new()
            .connect("not-a-connection-string", Duration::from_secs(1))
            .await;

        assert!(matches!(result, Err(FacadeError::Connection(_))));
    }

    #[tokio::test]
    async fn applies_timeout_and_app_name() {
        let mut options = ClientOptions::parse("mongodb://localhost:27017").await.unwrap();

        MongoDbConnector::new()
            .with_app_name("docfacade-tests")
            .apply(&mut options, Duration::from_secs(3));

        assert_eq!(options.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(3)));
        assert_eq!(options.app_name.as_deref(), Some("docfacade-tests"));
    }

    #[tokio::test]
    async fn client_construction_does_not_need_a_server() {
        let backend = MongoDbConnector::new()
            .connect("mongodb://u:p@localhost:27017/test", Duration::from_millis(100))
            .await
            .unwrap();

        assert!(format!("{:?}", backend).contains("MongoDbBackend"));
    }
}
