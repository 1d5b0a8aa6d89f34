//! Translation of human-readable sort specifications into driver sort documents.

use crate::error::{MongoLibraryError, Result};
use bson::{Bson, Document};
use std::fmt;
use std::str::FromStr;

/// Sort order of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending, driver value `1`.
    Ascending,
    /// Descending, driver value `-1`.
    Descending,
}

impl SortOrder {
    /// The driver's numeric sort constant.
    pub fn value(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

impl FromStr for SortOrder {
    type Err = MongoLibraryError;

    /// Parses `asc` or `desc`, ignoring case and surrounding whitespace.
    fn from_str(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(MongoLibraryError::InvalidSortDirection(token.to_string())),
        }
    }
}

impl From<SortOrder> for Bson {
    fn from(order: SortOrder) -> Self {
        Bson::Int32(order.value())
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("asc"),
            SortOrder::Descending => f.write_str("desc"),
        }
    }
}

/// An ordered list of `(field, order)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    fields: Vec<(String, SortOrder)>,
}

impl SortSpec {
    /// Create an empty sort specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate `(field, direction-token)` pairs.
    ///
    /// Fails on the first token that is not `asc` or `desc`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let sort = SortSpec::parse([("age", " DESC "), ("name", "asc")])?;
    /// assert_eq!(sort.to_document(), doc! { "age": -1, "name": 1 });
    /// ```
    pub fn parse<I, F, D>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (F, D)>,
        F: Into<String>,
        D: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(field, direction)| Ok((field.into(), direction.as_ref().parse()?)))
            .collect::<Result<_>>()?;
        Ok(Self { fields })
    }

    /// Append a field.
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.fields.push((field.into(), order));
        self
    }

    /// The translated pairs, in order.
    pub fn fields(&self) -> &[(String, SortOrder)] {
        &self.fields
    }

    /// Check if no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The driver sort document, preserving field order.
    pub fn to_document(&self) -> Document {
        self.fields
            .iter()
            .map(|(field, order)| (field.clone(), Bson::from(*order)))
            .collect()
    }
}
