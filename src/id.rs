//! Document identifier coercion.

use crate::error::Result;
use bson::oid::ObjectId;

/// Parse a trimmed hex string into an [`ObjectId`].
///
/// Malformed input (wrong length or non-hex characters) fails with
/// [`MongoLibraryError::InvalidObjectId`](crate::MongoLibraryError::InvalidObjectId).
pub fn object_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoLibraryError;

    #[test]
    fn test_object_id_trims() {
        let oid = ObjectId::new();
        let padded = format!("  {}\n", oid.to_hex());
        assert_eq!(object_id(&padded).unwrap(), oid);
    }

    #[test]
    fn test_object_id_rejects_malformed() {
        for input in ["", "123", "zzzzzzzzzzzzzzzzzzzzzzzz", "507f1f77bcf86cd79943901"] {
            assert!(matches!(
                object_id(input),
                Err(MongoLibraryError::InvalidObjectId(_))
            ));
        }
    }

    #[test]
    fn test_object_id_known_value() {
        let oid = object_id("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(oid.to_hex(), "507f1f77bcf86cd799439011");
    }
}
