//! Collection handle with record operations.

use crate::error::Result;
use crate::sort::SortSpec;
use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use std::time::Duration;

/// Options for find operations.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Fields to include or exclude.
    pub projection: Option<Document>,
    /// Sort order.
    pub sort: Option<SortSpec>,
    /// Maximum number of documents to return. Missing, zero or negative means no limit.
    pub limit: Option<i64>,
    /// Number of documents to skip. Missing, zero or negative means no skip.
    pub skip: Option<i64>,
    /// Batch size for the cursor.
    pub batch_size: Option<u32>,
    /// Server-side time limit.
    pub max_time: Option<Duration>,
    /// Allow the server to use temporary files for large sorts.
    pub allow_disk_use: Option<bool>,
    /// Comment attached to the query in server logs.
    pub comment: Option<String>,
}

impl FindOptions {
    /// Create a builder.
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }

    /// The effective limit; `0` means unbounded.
    pub fn effective_limit(&self) -> i64 {
        non_negative(self.limit)
    }

    /// The effective skip; `0` means none.
    pub fn effective_skip(&self) -> u64 {
        non_negative(self.skip) as u64
    }
}

/// Builder for FindOptions.
#[derive(Debug, Clone, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    /// Set the projection.
    pub fn projection(mut self, projection: Document) -> Self {
        self.options.projection = Some(projection);
        self
    }

    /// Set the sort order.
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.options.sort = Some(sort);
        self
    }

    /// Set the limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Set the skip.
    pub fn skip(mut self, skip: i64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Set the batch size.
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.options.batch_size = Some(batch_size);
        self
    }

    /// Set the server-side time limit.
    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.options.max_time = Some(max_time);
        self
    }

    /// Allow disk use for large sorts.
    pub fn allow_disk_use(mut self, allow: bool) -> Self {
        self.options.allow_disk_use = Some(allow);
        self
    }

    /// Set the query comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.options.comment = Some(comment.into());
        self
    }

    /// Build the options.
    pub fn build(self) -> FindOptions {
        self.options
    }
}

/// Options for update operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Which document to update first when several match. Ignored by update-many.
    pub sort: Option<SortSpec>,
    /// Whether to insert if no documents match. Defaults to `true`.
    pub upsert: Option<bool>,
    /// Fields of the returned document. Ignored by update-many.
    pub projection: Option<Document>,
    /// Array filters for updating nested arrays.
    pub array_filters: Option<Vec<Document>>,
    /// Skip document validation.
    pub bypass_document_validation: Option<bool>,
    /// Server-side time limit. Ignored by update-many.
    pub max_time: Option<Duration>,
}

impl UpdateOptions {
    /// Create a builder.
    pub fn builder() -> UpdateOptionsBuilder {
        UpdateOptionsBuilder::default()
    }

    /// The effective upsert flag.
    pub fn effective_upsert(&self) -> bool {
        self.upsert.unwrap_or(true)
    }
}

/// Builder for UpdateOptions.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptionsBuilder {
    options: UpdateOptions,
}

impl UpdateOptionsBuilder {
    /// Set the sort order.
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.options.sort = Some(sort);
        self
    }

    /// Set upsert option.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.options.upsert = Some(upsert);
        self
    }

    /// Set the projection of the returned document.
    pub fn projection(mut self, projection: Document) -> Self {
        self.options.projection = Some(projection);
        self
    }

    /// Set array filters.
    pub fn array_filters(mut self, filters: Vec<Document>) -> Self {
        self.options.array_filters = Some(filters);
        self
    }

    /// Skip document validation.
    pub fn bypass_document_validation(mut self, bypass: bool) -> Self {
        self.options.bypass_document_validation = Some(bypass);
        self
    }

    /// Set the server-side time limit.
    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.options.max_time = Some(max_time);
        self
    }

    /// Build the options.
    pub fn build(self) -> UpdateOptions {
        self.options
    }
}

/// Options for find-and-delete operations.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Which document to delete when several match.
    pub sort: Option<SortSpec>,
    /// Fields of the returned document.
    pub projection: Option<Document>,
    /// Server-side time limit.
    pub max_time: Option<Duration>,
}

impl DeleteOptions {
    /// Create a builder.
    pub fn builder() -> DeleteOptionsBuilder {
        DeleteOptionsBuilder::default()
    }
}

/// Builder for DeleteOptions.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptionsBuilder {
    options: DeleteOptions,
}

impl DeleteOptionsBuilder {
    /// Set the sort order.
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.options.sort = Some(sort);
        self
    }

    /// Set the projection of the returned document.
    pub fn projection(mut self, projection: Document) -> Self {
        self.options.projection = Some(projection);
        self
    }

    /// Set the server-side time limit.
    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.options.max_time = Some(max_time);
        self
    }

    /// Build the options.
    pub fn build(self) -> DeleteOptions {
        self.options
    }
}

fn non_negative(value: Option<i64>) -> i64 {
    value.filter(|v| *v > 0).unwrap_or(0)
}

/// A handle to one collection of one database.
///
/// This is the explicit target of record operations: it never changes once
/// created, and clones may be used from several tasks at once.
///
/// # Example
///
/// ```ignore
/// let users = client.database("app").collection("users");
/// let id = users.insert_one(doc! { "name": "John" }).await?;
/// let found = users.find(doc! { "_id": id }, FindOptions::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    inner: mongodb::Collection<Document>,
    db_name: String,
}

impl Collection {
    pub(crate) fn new(inner: mongodb::Collection<Document>) -> Self {
        let db_name = inner.namespace().db;
        Self { inner, db_name }
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Get the database name.
    pub fn database_name(&self) -> &str {
        &self.db_name
    }

    /// Get the full namespace (db.collection).
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database_name(), self.name())
    }

    /// Find documents matching a filter. A missing filter matches everything.
    pub async fn find(
        &self,
        filter: impl Into<Option<Document>>,
        options: FindOptions,
    ) -> Result<Vec<Document>> {
        let filter: Option<Document> = filter.into();
        let filter = filter.unwrap_or_default();
        tracing::debug!(namespace = %self.namespace(), ?filter, "find");

        let mut query = self.inner.find(filter);
        if let Some(projection) = options.projection.clone() {
            query = query.projection(projection);
        }
        if let Some(sort) = options.sort.as_ref().filter(|s| !s.is_empty()) {
            query = query.sort(sort.to_document());
        }
        let limit = options.effective_limit();
        if limit > 0 {
            query = query.limit(limit);
        }
        let skip = options.effective_skip();
        if skip > 0 {
            query = query.skip(skip);
        }
        if let Some(batch_size) = options.batch_size {
            query = query.batch_size(batch_size);
        }
        if let Some(max_time) = options.max_time {
            query = query.max_time(max_time);
        }
        if let Some(allow) = options.allow_disk_use {
            query = query.allow_disk_use(allow);
        }
        if let Some(comment) = options.comment {
            query = query.comment(Bson::String(comment));
        }

        let documents: Vec<Document> = query.await?.try_collect().await?;
        Ok(documents)
    }

    /// Insert a single document, returning its identifier.
    pub async fn insert_one(&self, record: Document) -> Result<Bson> {
        tracing::debug!(namespace = %self.namespace(), "insert one");
        let result = self.inner.insert_one(record).await?;
        Ok(result.inserted_id)
    }

    /// Insert multiple documents, returning their identifiers in input order.
    pub async fn insert_many(&self, records: Vec<Document>) -> Result<Vec<Bson>> {
        tracing::debug!(namespace = %self.namespace(), count = records.len(), "insert many");
        let result = self.inner.insert_many(records).await?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    /// Update the first matching document and return it after the update.
    ///
    /// With upsert (the default) and no match, the inserted document is
    /// returned; without upsert and no match, `None`.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<Option<Document>> {
        tracing::debug!(namespace = %self.namespace(), ?filter, "find one and update");

        let mut query = self
            .inner
            .find_one_and_update(filter, update)
            .upsert(options.effective_upsert())
            .return_document(ReturnDocument::After);
        if let Some(sort) = options.sort.as_ref().filter(|s| !s.is_empty()) {
            query = query.sort(sort.to_document());
        }
        if let Some(projection) = options.projection {
            query = query.projection(projection);
        }
        if let Some(array_filters) = options.array_filters {
            query = query.array_filters(array_filters);
        }
        if let Some(bypass) = options.bypass_document_validation {
            query = query.bypass_document_validation(bypass);
        }
        if let Some(max_time) = options.max_time {
            query = query.max_time(max_time);
        }

        Ok(query.await?)
    }

    /// Update all matching documents, returning the modified count.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<u64> {
        tracing::debug!(namespace = %self.namespace(), ?filter, "update many");

        let mut query = self
            .inner
            .update_many(filter, update)
            .upsert(options.effective_upsert());
        if let Some(array_filters) = options.array_filters {
            query = query.array_filters(array_filters);
        }
        if let Some(bypass) = options.bypass_document_validation {
            query = query.bypass_document_validation(bypass);
        }

        let result = query.await?;
        Ok(result.modified_count)
    }

    /// Delete the first matching document and return it as it was before deletion.
    pub async fn find_one_and_delete(
        &self,
        filter: Document,
        options: DeleteOptions,
    ) -> Result<Option<Document>> {
        tracing::debug!(namespace = %self.namespace(), ?filter, "find one and delete");

        let mut query = self.inner.find_one_and_delete(filter);
        if let Some(sort) = options.sort.as_ref().filter(|s| !s.is_empty()) {
            query = query.sort(sort.to_document());
        }
        if let Some(projection) = options.projection {
            query = query.projection(projection);
        }
        if let Some(max_time) = options.max_time {
            query = query.max_time(max_time);
        }

        Ok(query.await?)
    }

    /// Delete all matching documents, returning the deleted count.
    pub async fn delete_many(&self, filter: Document) -> Result<u64> {
        tracing::debug!(namespace = %self.namespace(), ?filter, "delete many");
        let result = self.inner.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    /// The underlying driver collection.
    pub fn driver(&self) -> &mongodb::Collection<Document> {
        &self.inner
    }
}
