//! Conversion between keyword JSON values and BSON.
//!
//! Keyword arguments and results travel as MongoDB extended JSON, so an
//! identifier is written `{"$oid": "..."}` and a date `{"$date": ...}`.
//! Both relaxed and canonical forms are accepted on input; output is relaxed.

use crate::error::{MongoLibraryError, Result};
use bson::{Bson, Document};
use serde_json::Value as JsonValue;

/// Convert an extended JSON value to BSON.
pub fn json_to_bson(value: JsonValue) -> Result<Bson> {
    Ok(Bson::try_from(value)?)
}

/// Convert an extended JSON object to a BSON document.
pub fn json_to_document(value: JsonValue) -> Result<Document> {
    match json_to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(MongoLibraryError::serialization(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Convert BSON to relaxed extended JSON.
pub fn bson_to_json(value: Bson) -> JsonValue {
    value.into_relaxed_extjson()
}

/// Convert a BSON document to relaxed extended JSON.
pub fn document_to_json(doc: Document) -> JsonValue {
    bson_to_json(Bson::Document(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_id_round_trip() {
        let oid = ObjectId::new();
        let value = json!({ "_id": { "$oid": oid.to_hex() }, "name": "John" });
        let document = json_to_document(value.clone()).unwrap();
        assert_eq!(document.get_object_id("_id").unwrap(), oid);
        assert_eq!(document_to_json(document), value);
    }

    #[test]
    fn test_plain_values() {
        let document = json_to_document(json!({
            "age": 30,
            "score": 9.5,
            "active": true,
            "tags": ["a", "b"],
            "nested": { "deleted": null }
        }))
        .unwrap();
        assert_eq!(
            document,
            doc! {
                "age": 30,
                "score": 9.5,
                "active": true,
                "tags": ["a", "b"],
                "nested": { "deleted": Bson::Null }
            }
        );
    }

    #[test]
    fn test_query_operators_pass_through() {
        let document = json_to_document(json!({ "age": { "$gte": 18 } })).unwrap();
        assert_eq!(document, doc! { "age": { "$gte": 18 } });
    }

    #[test]
    fn test_non_object_rejected() {
        let err = json_to_document(json!([1, 2])).unwrap_err();
        assert!(matches!(err, MongoLibraryError::Serialization(_)));
    }

    #[test]
    fn test_malformed_oid_rejected() {
        let err = json_to_document(json!({ "_id": { "$oid": "nope" } })).unwrap_err();
        assert!(matches!(err, MongoLibraryError::Serialization(_)));
    }

    #[test]
    fn test_bson_scalar_to_json() {
        assert_eq!(bson_to_json(Bson::Int64(7)), json!(7));
        assert_eq!(bson_to_json(Bson::Null), JsonValue::Null);
    }
}
