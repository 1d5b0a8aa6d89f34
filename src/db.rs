//! Database handle.

use crate::collection::Collection;
use crate::error::Result;
use bson::Document;

/// A handle to a MongoDB database.
///
/// # Example
///
/// ```ignore
/// let db = client.database("mydb");
/// let existed = db.has_collection("users").await?;
/// let users = db.collection("users");
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    inner: mongodb::Database,
}

impl Database {
    pub(crate) fn new(inner: mongodb::Database) -> Self {
        Self { inner }
    }

    /// Get the database name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Get a collection handle. The collection need not exist.
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self.inner.collection::<Document>(name))
    }

    /// List all collection names in this database.
    pub async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.list_collection_names().await?)
    }

    /// Check whether a collection is currently listed in this database.
    pub async fn has_collection(&self, name: &str) -> Result<bool> {
        let names = self.list_collection_names().await?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Drop the database.
    ///
    /// Permanently deletes the database and all its collections.
    pub async fn drop(&self) -> Result<()> {
        self.inner.drop().await?;
        Ok(())
    }

    /// The underlying driver database.
    pub fn driver(&self) -> &mongodb::Database {
        &self.inner
    }
}
