//! The stateful keyword library.
//!
//! [`MongoLibrary`] remembers the last selected database and collection so
//! that keywords can omit them, the way a test suite reads. Code that wants
//! an explicit target instead takes a [`Collection`] from
//! [`MongoLibrary::target`] and calls it directly.

use crate::client::{ConnectionOptions, MongoClient};
use crate::collection::{Collection, DeleteOptions, FindOptions, UpdateOptions};
use crate::config::LibraryConfig;
use crate::db::Database;
use crate::error::{MongoLibraryError, Result};
use bson::{Bson, Document};

/// A MongoDB keyword library with a current database and collection.
///
/// # Example
///
/// ```ignore
/// use mongo_keywords::{MongoLibrary, ConnectionOptions, FindOptions, doc};
///
/// let mut library = MongoLibrary::new();
/// library
///     .connect(ConnectionOptions::builder().database("qa").build())
///     .await?;
/// library.select_collection("users", None).await?;
///
/// let id = library.insert_record(doc! { "name": "John" }, None).await?;
/// let found = library
///     .find_records(doc! { "_id": id }, FindOptions::default(), None)
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct MongoLibrary {
    client: Option<MongoClient>,
    database: Option<Database>,
    collection: Option<Collection>,
}

/// Trimmed name, or `None` when blank.
fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

impl MongoLibrary {
    /// Create an unconnected library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library, connecting right away when the configuration
    /// names both a server and a port.
    pub async fn with_config(config: &LibraryConfig) -> Result<Self> {
        let mut library = Self::new();
        if let Some(options) = config.connection_options() {
            library.connect(options).await?;
        }
        Ok(library)
    }

    /// Open a client, replacing any previous one and clearing the selection.
    ///
    /// Selects `options.database` afterwards when it is not blank.
    pub async fn connect(&mut self, options: ConnectionOptions) -> Result<()> {
        let client = MongoClient::connect(&options).await?;
        self.client = Some(client);
        self.database = None;
        self.collection = None;

        if let Some(database) = options.database_name() {
            self.select_database(database).await?;
        }
        Ok(())
    }

    /// Check if a client is open.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// The open client.
    pub fn client(&self) -> Result<&MongoClient> {
        self.client.as_ref().ok_or(MongoLibraryError::NotConnected)
    }

    /// The current database.
    pub fn database(&self) -> Result<&Database> {
        self.client()?;
        self.database
            .as_ref()
            .ok_or(MongoLibraryError::NoDatabaseSelected)
    }

    /// List all database names on the server.
    pub async fn list_databases(&self) -> Result<Vec<String>> {
        self.client()?.list_database_names().await
    }

    /// Select the current database, returning whether it already existed.
    ///
    /// The name is trimmed. The database is selected whether or not it
    /// existed; MongoDB creates it on first write. The current collection is
    /// cleared.
    pub async fn select_database(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        let client = self.client()?;
        let exists = client.has_database(name).await?;
        let database = client.database(name);

        tracing::debug!(database = name, exists, "selected database");
        self.database = Some(database);
        self.collection = None;
        Ok(exists)
    }

    /// Name of the current database.
    pub fn selected_database(&self) -> Option<&str> {
        self.database.as_ref().map(Database::name)
    }

    /// List collection names of `database`, or of the current database when
    /// `database` is missing or blank. Does not change the selection.
    pub async fn list_collections(&self, database: Option<&str>) -> Result<Vec<String>> {
        match non_blank(database) {
            Some(name) => self.client()?.database(name).list_collection_names().await,
            None => self.database()?.list_collection_names().await,
        }
    }

    /// Select the current collection, returning whether it already existed.
    ///
    /// When `database` is given and not blank it is selected first.
    pub async fn select_collection(&mut self, name: &str, database: Option<&str>) -> Result<bool> {
        if let Some(database) = non_blank(database) {
            self.select_database(database).await?;
        }

        let name = name.trim();
        let database = self.database()?;
        let exists = database.has_collection(name).await?;
        let collection = database.collection(name);

        tracing::debug!(
            database = database.name(),
            collection = name,
            exists,
            "selected collection"
        );
        self.collection = Some(collection);
        Ok(exists)
    }

    /// Name of the current collection.
    pub fn selected_collection(&self) -> Option<&str> {
        self.collection.as_ref().map(Collection::name)
    }

    /// The current collection as an explicit target.
    pub fn target(&self) -> Result<Collection> {
        self.client()?;
        self.collection
            .clone()
            .ok_or(MongoLibraryError::NoCollectionSelected)
    }

    /// Select `collection` when given and not blank, then return the target.
    async fn resolve(&mut self, collection: Option<&str>) -> Result<Collection> {
        if let Some(name) = non_blank(collection) {
            self.select_collection(name, None).await?;
        }
        self.target()
    }

    /// Find documents. A missing filter matches everything.
    pub async fn find_records(
        &mut self,
        filter: impl Into<Option<Document>>,
        options: FindOptions,
        collection: Option<&str>,
    ) -> Result<Vec<Document>> {
        let target = self.resolve(collection).await?;
        target.find(filter, options).await
    }

    /// Insert a document, returning its identifier.
    pub async fn insert_record(
        &mut self,
        record: Document,
        collection: Option<&str>,
    ) -> Result<Bson> {
        let target = self.resolve(collection).await?;
        target.insert_one(record).await
    }

    /// Insert documents, returning their identifiers in input order.
    pub async fn insert_records(
        &mut self,
        records: Vec<Document>,
        collection: Option<&str>,
    ) -> Result<Vec<Bson>> {
        let target = self.resolve(collection).await?;
        target.insert_many(records).await
    }

    /// Update one document and return it after the update.
    pub async fn update_record(
        &mut self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: Option<&str>,
    ) -> Result<Option<Document>> {
        let target = self.resolve(collection).await?;
        target.find_one_and_update(filter, update, options).await
    }

    /// Update all matching documents, returning the modified count.
    pub async fn update_records(
        &mut self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: Option<&str>,
    ) -> Result<u64> {
        let target = self.resolve(collection).await?;
        target.update_many(filter, update, options).await
    }

    /// Delete one document and return it as it was before deletion.
    pub async fn delete_record(
        &mut self,
        filter: Document,
        options: DeleteOptions,
        collection: Option<&str>,
    ) -> Result<Option<Document>> {
        let target = self.resolve(collection).await?;
        target.find_one_and_delete(filter, options).await
    }

    /// Delete all matching documents, returning the deleted count.
    pub async fn delete_records(
        &mut self,
        filter: Document,
        collection: Option<&str>,
    ) -> Result<u64> {
        let target = self.resolve(collection).await?;
        target.delete_many(filter).await
    }
}
