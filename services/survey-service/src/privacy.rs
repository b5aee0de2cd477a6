use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Fields replaced by their digest before a record is persisted.
pub const SENSITIVE_FIELDS: [&str; 2] = ["email", "age"];

pub fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Replaces each sensitive field with the hex SHA-256 of its string form.
///
/// The digest is unsalted so equal inputs stay joinable across records. That
/// makes this pseudonymization only: low-cardinality values such as `age`
/// can be recovered by hashing every candidate.
pub fn pseudonymize(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in SENSITIVE_FIELDS {
        if let Some(value) = fields.get_mut(key) {
            let plain = match value.take() {
                Value::String(text) => text,
                other => other.to_string(),
            };
            *value = Value::String(digest_hex(plain.as_bytes()));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(
            digest_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hashes_email_and_stringified_age() {
        let fields = json!({
            "email": "a@example.com",
            "age": 30,
            "rating": 4,
            "name": "Ada",
        });
        let Value::Object(fields) = fields else {
            panic!("expected object");
        };

        let hashed = pseudonymize(fields);
        assert_eq!(hashed["email"], json!(digest_hex(b"a@example.com")));
        assert_eq!(hashed["age"], json!(digest_hex(b"30")));
        assert_eq!(hashed["rating"], json!(4));
        assert_eq!(hashed["name"], json!("Ada"));
    }

    #[test]
    fn deterministic_without_salt() {
        let make = || {
            let mut fields = Map::new();
            fields.insert("email".to_string(), json!("same@example.com"));
            fields.insert("age".to_string(), json!(41));
            pseudonymize(fields)
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn absent_fields_stay_absent() {
        let mut fields = Map::new();
        fields.insert("rating".to_string(), json!(3));
        let hashed = pseudonymize(fields);
        assert!(!hashed.contains_key("email"));
        assert!(!hashed.contains_key("age"));
    }
}
