//! Keyword surface for test-automation runners.
//!
//! Runners call keywords by name with JSON arguments, either positional (a
//! JSON array, in parameter order) or named (a JSON object). Names are
//! matched the way Robot Framework matches them: case-insensitively and
//! ignoring spaces and underscores, so `Selecionar Registros`,
//! `selecionar_registros` and `find records` all resolve.
//!
//! Documents are written in MongoDB extended JSON and results come back the
//! same way, e.g. an inserted identifier is `{"$oid": "..."}`.

use crate::client::{ConnectionOptions, DEFAULT_PORT, DEFAULT_SERVER};
use crate::collection::{DeleteOptions, FindOptions, UpdateOptions};
use crate::config::LibraryConfig;
use crate::convert::{bson_to_json, document_to_json, json_to_document};
use crate::error::{MongoLibraryError, Result};
use crate::id::object_id;
use crate::library::MongoLibrary;
use crate::sort::SortSpec;
use bson::{Bson, Document};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::time::Duration;

/// Library scope reported to the runner: one library instance per suite.
pub const LIBRARY_SCOPE: &str = "TEST SUITE";

/// A keyword parameter: name and default shown in the argument spec.
/// Parameters without a default are required.
type Param = (&'static str, Option<&'static str>);

const CONNECT: &[Param] = &[
    ("server", Some(DEFAULT_SERVER)),
    ("port", Some("27017")),
    ("user", Some("None")),
    ("password", Some("None")),
    ("database", Some("None")),
];
const SELECT_DATABASE: &[Param] = &[("database", None)];
const LIST_COLLECTIONS: &[Param] = &[("database", Some("None"))];
const SELECT_COLLECTION: &[Param] = &[("collection", None), ("database", Some("None"))];
const FIND_RECORDS: &[Param] = &[
    ("filter", Some("None")),
    ("fields", Some("None")),
    ("sort", Some("None")),
    ("limit", Some("None")),
    ("skip", Some("None")),
    ("collection", Some("None")),
    ("batch_size", Some("None")),
    ("max_time_ms", Some("None")),
    ("allow_disk_use", Some("None")),
    ("comment", Some("None")),
];
const INSERT_RECORD: &[Param] = &[("record", None), ("collection", Some("None"))];
const INSERT_RECORDS: &[Param] = &[("records", None), ("collection", Some("None"))];
const UPDATE_RECORD: &[Param] = &[
    ("filter", None),
    ("values", None),
    ("sort", Some("None")),
    ("upsert", Some("True")),
    ("collection", Some("None")),
    ("fields", Some("None")),
    ("array_filters", Some("None")),
    ("bypass_document_validation", Some("None")),
    ("max_time_ms", Some("None")),
];
const UPDATE_RECORDS: &[Param] = &[
    ("filter", None),
    ("values", None),
    ("upsert", Some("True")),
    ("collection", Some("None")),
    ("array_filters", Some("None")),
    ("bypass_document_validation", Some("None")),
];
const DELETE_RECORD: &[Param] = &[
    ("filter", None),
    ("sort", Some("None")),
    ("collection", Some("None")),
    ("fields", Some("None")),
    ("max_time_ms", Some("None")),
];
const DELETE_RECORDS: &[Param] = &[("filter", None), ("collection", Some("None"))];
const TO_OBJECT_ID: &[Param] = &[("id", None)];

/// Every keyword the library offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Connect,
    ListDatabases,
    SelectDatabase,
    ListCollections,
    SelectCollection,
    FindRecords,
    InsertRecord,
    InsertRecords,
    UpdateRecord,
    UpdateRecords,
    DeleteRecord,
    DeleteRecords,
    ToObjectId,
}

impl Keyword {
    /// All keywords, in documentation order.
    pub const ALL: [Keyword; 13] = [
        Keyword::Connect,
        Keyword::ListDatabases,
        Keyword::SelectDatabase,
        Keyword::ListCollections,
        Keyword::SelectCollection,
        Keyword::FindRecords,
        Keyword::InsertRecord,
        Keyword::InsertRecords,
        Keyword::UpdateRecord,
        Keyword::UpdateRecords,
        Keyword::DeleteRecord,
        Keyword::DeleteRecords,
        Keyword::ToObjectId,
    ];

    /// The keyword's published name.
    pub fn name(self) -> &'static str {
        match self {
            Keyword::Connect => "conectar_mongodb",
            Keyword::ListDatabases => "resgatar_databases",
            Keyword::SelectDatabase => "selecionar_database",
            Keyword::ListCollections => "resgatar_collections",
            Keyword::SelectCollection => "selecionar_collection",
            Keyword::FindRecords => "selecionar_registros",
            Keyword::InsertRecord => "inserir_registro",
            Keyword::InsertRecords => "inserir_multiplos_registros",
            Keyword::UpdateRecord => "atualizar_registro",
            Keyword::UpdateRecords => "atualizar_multiplos_registros",
            Keyword::DeleteRecord => "deletar_registro",
            Keyword::DeleteRecords => "deletar_multiplos_registros",
            Keyword::ToObjectId => "transformar_em_id",
        }
    }

    /// English alias accepted alongside the published name.
    pub fn alias(self) -> &'static str {
        match self {
            Keyword::Connect => "connect",
            Keyword::ListDatabases => "list_databases",
            Keyword::SelectDatabase => "select_database",
            Keyword::ListCollections => "list_collections",
            Keyword::SelectCollection => "select_collection",
            Keyword::FindRecords => "find_records",
            Keyword::InsertRecord => "insert_record",
            Keyword::InsertRecords => "insert_records",
            Keyword::UpdateRecord => "update_record",
            Keyword::UpdateRecords => "update_records",
            Keyword::DeleteRecord => "delete_record",
            Keyword::DeleteRecords => "delete_records",
            Keyword::ToObjectId => "to_object_id",
        }
    }

    /// Resolve a keyword by published name or alias.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = normalize(name);
        Keyword::ALL
            .into_iter()
            .find(|k| normalize(k.name()) == wanted || normalize(k.alias()) == wanted)
            .ok_or_else(|| MongoLibraryError::UnknownKeyword(name.to_string()))
    }

    fn params(self) -> &'static [Param] {
        match self {
            Keyword::Connect => CONNECT,
            Keyword::ListDatabases => &[],
            Keyword::SelectDatabase => SELECT_DATABASE,
            Keyword::ListCollections => LIST_COLLECTIONS,
            Keyword::SelectCollection => SELECT_COLLECTION,
            Keyword::FindRecords => FIND_RECORDS,
            Keyword::InsertRecord => INSERT_RECORD,
            Keyword::InsertRecords => INSERT_RECORDS,
            Keyword::UpdateRecord => UPDATE_RECORD,
            Keyword::UpdateRecords => UPDATE_RECORDS,
            Keyword::DeleteRecord => DELETE_RECORD,
            Keyword::DeleteRecords => DELETE_RECORDS,
            Keyword::ToObjectId => TO_OBJECT_ID,
        }
    }

    /// Argument spec in runner notation: `name` or `name=default`.
    pub fn arguments(self) -> Vec<String> {
        self.params()
            .iter()
            .map(|(name, default)| match default {
                Some(default) => format!("{}={}", name, default),
                None => name.to_string(),
            })
            .collect()
    }

    /// Keyword documentation shown by the runner.
    pub fn documentation(self) -> &'static str {
        match self {
            Keyword::Connect => {
                "Connects to MongoDB at `server`:`port`, with credentials when both `user` and \
                 `password` are given, and selects `database` when given."
            }
            Keyword::ListDatabases => "Returns the names of all databases.",
            Keyword::SelectDatabase => {
                "Selects the database used by later keywords and deselects the current \
                 collection; select a collection again before record keywords. Returns true \
                 if the database already existed, false if MongoDB will create it on first \
                 write."
            }
            Keyword::ListCollections => {
                "Returns the collection names of `database`, or of the selected database."
            }
            Keyword::SelectCollection => {
                "Selects the collection used by later keywords, selecting `database` first \
                 when given. Returns true if the collection already existed."
            }
            Keyword::FindRecords => {
                "Returns the documents matching `filter` (all when omitted). `fields` is a \
                 projection, `sort` a list of [field, \"asc\"|\"desc\"] pairs. Missing or \
                 negative `limit` and `skip` mean no limit and no skip."
            }
            Keyword::InsertRecord => "Inserts `record` and returns its id.",
            Keyword::InsertRecords => "Inserts `records` and returns their ids in order.",
            Keyword::UpdateRecord => {
                "Applies `values` to the first document matching `filter` and returns it \
                 after the update. With `upsert` (default true) a missing document is \
                 created; otherwise nothing is returned when no document matches."
            }
            Keyword::UpdateRecords => {
                "Applies `values` to every document matching `filter` and returns the \
                 number of modified documents."
            }
            Keyword::DeleteRecord => {
                "Deletes the first document matching `filter` and returns it as it was \
                 before deletion."
            }
            Keyword::DeleteRecords => {
                "Deletes every document matching `filter` and returns the number deleted."
            }
            Keyword::ToObjectId => "Converts a 24-character hex string into a MongoDB ObjectId.",
        }
    }
}

/// Runner-style name normalization.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Arguments bound to a keyword's parameters.
///
/// JSON `null` counts as not given, so defaults apply.
#[derive(Debug, Clone)]
pub struct Arguments {
    keyword: Keyword,
    values: HashMap<&'static str, JsonValue>,
}

impl Arguments {
    /// Bind a JSON array (positional), object (named) or `null` (none).
    pub fn bind(keyword: Keyword, args: JsonValue) -> Result<Self> {
        match args {
            JsonValue::Null => Self::bind_parts(keyword, Vec::new(), Map::new()),
            JsonValue::Array(positional) => Self::bind_parts(keyword, positional, Map::new()),
            JsonValue::Object(named) => Self::bind_parts(keyword, Vec::new(), named),
            other => Err(MongoLibraryError::invalid_argument(format!(
                "{}: arguments must be a JSON array or object, got {}",
                keyword.name(),
                other
            ))),
        }
    }

    /// Bind positional arguments first, then named ones.
    pub fn bind_parts(
        keyword: Keyword,
        positional: Vec<JsonValue>,
        named: Map<String, JsonValue>,
    ) -> Result<Self> {
        let params = keyword.params();
        if positional.len() > params.len() {
            return Err(MongoLibraryError::invalid_argument(format!(
                "{} expects at most {} arguments, got {}",
                keyword.name(),
                params.len(),
                positional.len()
            )));
        }

        let mut values = HashMap::new();
        for ((name, _), value) in params.iter().zip(positional) {
            if !value.is_null() {
                values.insert(*name, value);
            }
        }

        for (key, value) in named {
            let (name, _) = params
                .iter()
                .find(|(name, _)| *name == key.trim())
                .ok_or_else(|| {
                    MongoLibraryError::invalid_argument(format!(
                        "{} got an unexpected argument {:?}",
                        keyword.name(),
                        key
                    ))
                })?;
            if value.is_null() {
                continue;
            }
            if values.insert(*name, value).is_some() {
                return Err(MongoLibraryError::invalid_argument(format!(
                    "{} got multiple values for argument {:?}",
                    keyword.name(),
                    name
                )));
            }
        }

        if let Some((name, _)) = params
            .iter()
            .find(|(name, default)| default.is_none() && !values.contains_key(name))
        {
            return Err(MongoLibraryError::invalid_argument(format!(
                "{} is missing required argument {:?}",
                keyword.name(),
                name
            )));
        }

        Ok(Self { keyword, values })
    }

    /// The keyword these arguments were bound to.
    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    fn invalid(&self, name: &str, expected: &str, got: &JsonValue) -> MongoLibraryError {
        MongoLibraryError::invalid_argument(format!(
            "{}: argument {:?} must be {}, got {}",
            self.keyword.name(),
            name,
            expected,
            got
        ))
    }

    fn required<T>(&self, name: &str, value: Option<T>) -> Result<T> {
        value.ok_or_else(|| {
            MongoLibraryError::invalid_argument(format!(
                "{} is missing required argument {:?}",
                self.keyword.name(),
                name
            ))
        })
    }

    /// A string argument.
    pub fn string(&self, name: &str) -> Result<Option<String>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(name, "a string", other)),
        }
    }

    /// An integer argument; numeric strings are accepted.
    pub fn integer(&self, name: &str) -> Result<Option<i64>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.invalid(name, "an integer", &JsonValue::Number(n.clone()))),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(name, "an integer", &JsonValue::String(s.clone()))),
            Some(other) => Err(self.invalid(name, "an integer", other)),
        }
    }

    /// A port number.
    pub fn port(&self, name: &str) -> Result<Option<u16>> {
        match self.integer(name)? {
            None => Ok(None),
            Some(port) => u16::try_from(port)
                .map(Some)
                .map_err(|_| self.invalid(name, "a port number", &JsonValue::from(port))),
        }
    }

    /// A non-negative millisecond count as a duration.
    pub fn duration_ms(&self, name: &str) -> Result<Option<Duration>> {
        match self.integer(name)? {
            None => Ok(None),
            Some(ms) => u64::try_from(ms)
                .map(|ms| Some(Duration::from_millis(ms)))
                .map_err(|_| self.invalid(name, "a non-negative number", &JsonValue::from(ms))),
        }
    }

    /// A boolean argument; `"true"`/`"false"` strings are accepted.
    pub fn boolean(&self, name: &str) -> Result<Option<bool>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(JsonValue::Bool(b)) => Ok(Some(*b)),
            Some(JsonValue::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(self.invalid(name, "a boolean", &JsonValue::String(s.clone()))),
            },
            Some(other) => Err(self.invalid(name, "a boolean", other)),
        }
    }

    /// A document argument: an extended JSON object, or a string holding one.
    pub fn document(&self, name: &str) -> Result<Option<Document>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(JsonValue::String(s)) => {
                let value: JsonValue = serde_json::from_str(s)?;
                json_to_document(value).map(Some)
            }
            Some(value @ JsonValue::Object(_)) => json_to_document(value.clone()).map(Some),
            Some(other) => Err(self.invalid(name, "a document", other)),
        }
    }

    /// A list of documents.
    pub fn documents(&self, name: &str) -> Result<Option<Vec<Document>>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| match item {
                    JsonValue::Object(_) => json_to_document(item.clone()),
                    other => Err(self.invalid(name, "a list of documents", other)),
                })
                .collect::<Result<_>>()
                .map(Some),
            Some(other) => Err(self.invalid(name, "a list of documents", other)),
        }
    }

    /// A sort list of `[field, "asc"|"desc"]` pairs.
    pub fn sort(&self, name: &str) -> Result<Option<SortSpec>> {
        let Some(value) = self.values.get(name) else {
            return Ok(None);
        };
        let expected = "a list of [field, direction] pairs";
        let JsonValue::Array(items) = value else {
            return Err(self.invalid(name, expected, value));
        };

        let pairs = items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([JsonValue::String(field), JsonValue::String(direction)]) => {
                    Ok((field.clone(), direction.clone()))
                }
                _ => Err(self.invalid(name, expected, item)),
            })
            .collect::<Result<Vec<_>>>()?;

        SortSpec::parse(pairs).map(Some)
    }
}

fn names_to_json(names: Vec<String>) -> JsonValue {
    JsonValue::Array(names.into_iter().map(JsonValue::String).collect())
}

fn optional_document(document: Option<Document>) -> JsonValue {
    document.map(document_to_json).unwrap_or(JsonValue::Null)
}

/// Run one keyword against a library.
pub async fn dispatch(library: &mut MongoLibrary, args: Arguments) -> Result<JsonValue> {
    let keyword = args.keyword();
    tracing::debug!(keyword = keyword.name(), "running keyword");

    match keyword {
        Keyword::Connect => {
            let mut builder = ConnectionOptions::builder()
                .server(args.string("server")?.unwrap_or_else(|| DEFAULT_SERVER.to_string()))
                .port(args.port("port")?.unwrap_or(DEFAULT_PORT));
            if let Some(user) = args.string("user")? {
                builder = builder.user(user);
            }
            if let Some(password) = args.string("password")? {
                builder = builder.password(password);
            }
            if let Some(database) = args.string("database")? {
                builder = builder.database(database);
            }
            library.connect(builder.build()).await?;
            Ok(JsonValue::Null)
        }
        Keyword::ListDatabases => Ok(names_to_json(library.list_databases().await?)),
        Keyword::SelectDatabase => {
            let database = args.required("database", args.string("database")?)?;
            Ok(JsonValue::Bool(library.select_database(&database).await?))
        }
        Keyword::ListCollections => {
            let database = args.string("database")?;
            Ok(names_to_json(
                library.list_collections(database.as_deref()).await?,
            ))
        }
        Keyword::SelectCollection => {
            let collection = args.required("collection", args.string("collection")?)?;
            let database = args.string("database")?;
            let existed = library
                .select_collection(&collection, database.as_deref())
                .await?;
            Ok(JsonValue::Bool(existed))
        }
        Keyword::FindRecords => {
            let options = FindOptions {
                projection: args.document("fields")?,
                sort: args.sort("sort")?,
                limit: args.integer("limit")?,
                skip: args.integer("skip")?,
                batch_size: args
                    .integer("batch_size")?
                    .map(|n| u32::try_from(n).unwrap_or(0))
                    .filter(|n| *n > 0),
                max_time: args.duration_ms("max_time_ms")?,
                allow_disk_use: args.boolean("allow_disk_use")?,
                comment: args.string("comment")?,
            };
            let collection = args.string("collection")?;
            let records = library
                .find_records(args.document("filter")?, options, collection.as_deref())
                .await?;
            Ok(JsonValue::Array(
                records.into_iter().map(document_to_json).collect(),
            ))
        }
        Keyword::InsertRecord => {
            let record = args.required("record", args.document("record")?)?;
            let collection = args.string("collection")?;
            let id = library.insert_record(record, collection.as_deref()).await?;
            Ok(bson_to_json(id))
        }
        Keyword::InsertRecords => {
            let records = args.required("records", args.documents("records")?)?;
            let collection = args.string("collection")?;
            let ids = library.insert_records(records, collection.as_deref()).await?;
            Ok(JsonValue::Array(ids.into_iter().map(bson_to_json).collect()))
        }
        Keyword::UpdateRecord => {
            let filter = args.required("filter", args.document("filter")?)?;
            let values = args.required("values", args.document("values")?)?;
            let options = UpdateOptions {
                sort: args.sort("sort")?,
                upsert: args.boolean("upsert")?,
                projection: args.document("fields")?,
                array_filters: args.documents("array_filters")?,
                bypass_document_validation: args.boolean("bypass_document_validation")?,
                max_time: args.duration_ms("max_time_ms")?,
            };
            let collection = args.string("collection")?;
            let document = library
                .update_record(filter, values, options, collection.as_deref())
                .await?;
            Ok(optional_document(document))
        }
        Keyword::UpdateRecords => {
            let filter = args.required("filter", args.document("filter")?)?;
            let values = args.required("values", args.document("values")?)?;
            let options = UpdateOptions {
                upsert: args.boolean("upsert")?,
                array_filters: args.documents("array_filters")?,
                bypass_document_validation: args.boolean("bypass_document_validation")?,
                ..UpdateOptions::default()
            };
            let collection = args.string("collection")?;
            let modified = library
                .update_records(filter, values, options, collection.as_deref())
                .await?;
            Ok(JsonValue::from(modified))
        }
        Keyword::DeleteRecord => {
            let filter = args.required("filter", args.document("filter")?)?;
            let options = DeleteOptions {
                sort: args.sort("sort")?,
                projection: args.document("fields")?,
                max_time: args.duration_ms("max_time_ms")?,
            };
            let collection = args.string("collection")?;
            let document = library
                .delete_record(filter, options, collection.as_deref())
                .await?;
            Ok(optional_document(document))
        }
        Keyword::DeleteRecords => {
            let filter = args.required("filter", args.document("filter")?)?;
            let collection = args.string("collection")?;
            let deleted = library.delete_records(filter, collection.as_deref()).await?;
            Ok(JsonValue::from(deleted))
        }
        Keyword::ToObjectId => {
            let id = args.required("id", args.string("id")?)?;
            Ok(bson_to_json(Bson::ObjectId(object_id(&id)?)))
        }
    }
}

/// Blocking keyword runner for synchronous hosts.
///
/// Owns a single-threaded tokio runtime and drives the async library on it,
/// one keyword at a time.
///
/// # Example
///
/// ```ignore
/// use serde_json::json;
///
/// let mut runner = KeywordRunner::new()?;
/// runner.run_keyword("Conectar MongoDB", json!({ "database": "qa" }))?;
/// runner.run_keyword("Selecionar Collection", json!(["users"]))?;
/// let id = runner.run_keyword("Inserir Registro", json!([{ "name": "John" }]))?;
/// ```
#[derive(Debug)]
pub struct KeywordRunner {
    library: MongoLibrary,
    runtime: tokio::runtime::Runtime,
}

impl KeywordRunner {
    /// Create a runner with an unconnected library.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            library: MongoLibrary::new(),
            runtime,
        })
    }

    /// Create a runner, connecting when the configuration names a server and port.
    pub fn with_config(config: &LibraryConfig) -> Result<Self> {
        let mut runner = Self::new()?;
        runner.library = runner.runtime.block_on(MongoLibrary::with_config(config))?;
        Ok(runner)
    }

    /// Published names of all keywords.
    pub fn keyword_names(&self) -> Vec<&'static str> {
        Keyword::ALL.iter().map(|k| k.name()).collect()
    }

    /// Argument spec of a keyword.
    pub fn keyword_arguments(&self, name: &str) -> Result<Vec<String>> {
        Ok(Keyword::from_name(name)?.arguments())
    }

    /// Documentation of a keyword.
    pub fn keyword_documentation(&self, name: &str) -> Result<&'static str> {
        Ok(Keyword::from_name(name)?.documentation())
    }

    /// Run a keyword with a JSON array (positional) or object (named) of arguments.
    pub fn run_keyword(&mut self, name: &str, args: JsonValue) -> Result<JsonValue> {
        let keyword = Keyword::from_name(name)?;
        let args = Arguments::bind(keyword, args)?;
        self.runtime.block_on(dispatch(&mut self.library, args))
    }

    /// Run a keyword with both positional and named arguments.
    pub fn run_keyword_with(
        &mut self,
        name: &str,
        positional: Vec<JsonValue>,
        named: Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        let keyword = Keyword::from_name(name)?;
        let args = Arguments::bind_parts(keyword, positional, named)?;
        self.runtime.block_on(dispatch(&mut self.library, args))
    }

    /// The library driven by this runner.
    pub fn library(&self) -> &MongoLibrary {
        &self.library
    }
}

impl Drop for KeywordRunner {
    fn drop(&mut self) {
        // Driver handles must be released inside the runtime that created them.
        let _guard = self.runtime.enter();
        drop(std::mem::take(&mut self.library));
    }
}
