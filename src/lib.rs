//! # mongo-keywords
//!
//! MongoDB keywords for test-automation runners.
//!
//! This crate wraps the official `mongodb` driver's CRUD operations with
//! test-friendly defaults: names are trimmed, missing filters match every
//! document, missing or negative limits mean no limit, and sort orders are
//! written as `"asc"`/`"desc"`. Driver errors are returned unchanged.
//!
//! ## Features
//!
//! - Connection from server, port and optional credentials
//! - Current database and collection, reported as pre-existing or new
//! - Find, insert, update and delete keywords
//! - Explicit [`Collection`] targets for callers that do not want shared selection state
//! - Keyword dispatch by name with JSON arguments, and a blocking [`KeywordRunner`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use mongo_keywords::{doc, ConnectionOptions, FindOptions, MongoLibrary, SortSpec};
//!
//! #[tokio::main]
//! async fn main() -> mongo_keywords::Result<()> {
//!     let mut library = MongoLibrary::new();
//!     library
//!         .connect(ConnectionOptions::builder().server("localhost").database("qa").build())
//!         .await?;
//!
//!     // Select a collection; false means MongoDB will create it.
//!     let existed = library.select_collection("users", None).await?;
//!
//!     let id = library.insert_record(doc! { "name": "John", "age": 30 }, None).await?;
//!
//!     let options = FindOptions::builder()
//!         .sort(SortSpec::parse([("age", "desc")])?)
//!         .limit(10)
//!         .build();
//!     let users = library.find_records(doc! { "_id": id }, options, None).await?;
//!
//!     library.delete_records(doc! {}, None).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod id;
pub mod keywords;
pub mod library;
pub mod sort;

// Re-export main types
pub use client::{ConnectionOptions, ConnectionOptionsBuilder, MongoClient};
pub use collection::{
    Collection, DeleteOptions, DeleteOptionsBuilder, FindOptions, FindOptionsBuilder,
    UpdateOptions, UpdateOptionsBuilder,
};
pub use config::LibraryConfig;
pub use db::Database;
pub use error::{ErrorKind, MongoLibraryError, Result};
pub use id::object_id;
pub use keywords::{dispatch, Arguments, Keyword, KeywordRunner, LIBRARY_SCOPE};
pub use library::MongoLibrary;
pub use sort::{SortOrder, SortSpec};

// Re-export bson for convenience
pub use bson;
pub use bson::doc;

/// Prelude module for common imports.
pub mod prelude {
    pub use super::collection::{Collection, DeleteOptions, FindOptions, UpdateOptions};
    pub use super::client::ConnectionOptions;
    pub use super::error::{MongoLibraryError, Result};
    pub use super::library::MongoLibrary;
    pub use super::sort::{SortOrder, SortSpec};
    pub use bson::{doc, oid::ObjectId, Bson, Document};
}

/// Get the library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
