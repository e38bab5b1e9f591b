//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

use crate::error::{CacheError, Result};

/// Request body for the SET operation (POST /set)
///
/// `value` is captured as raw JSON text. Deserializing it checks the syntax
/// without building a value tree, and the exact bytes are what gets cached.
#[derive(Debug)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The JSON document to store
    pub value: Box<RawValue>,
}

/// Wire shape of the body; `value` is `None` only when the field is absent.
#[derive(Deserialize)]
struct SetBody {
    key: String,
    #[serde(default, deserialize_with = "present")]
    value: Option<Box<RawValue>>,
}

// `Option<T>` alone would read `null` as absent
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl SetRequest {
    /// Parses and validates a request body.
    ///
    /// Fails with `InvalidJson` if the body is not a JSON object with a
    /// string `key` and a syntactically valid `value`, with `InvalidValue`
    /// if `value` is absent, and with `MissingKey` if the key is empty.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let body: SetBody = serde_json::from_slice(body)?;
        let value = body.value.ok_or(CacheError::InvalidValue)?;
        if body.key.is_empty() {
            return Err(CacheError::MissingKey);
        }
        Ok(Self {
            key: body.key,
            value,
        })
    }

    /// Raw JSON text of the value.
    pub fn value_json(&self) -> &str {
        self.value.get()
    }
}

/// Query string for GET /get and DELETE /del
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

impl KeyQuery {
    /// Returns the key, treating an absent or empty parameter as missing.
    pub fn into_key(self) -> Result<String> {
        self.key
            .filter(|key| !key.is_empty())
            .ok_or(CacheError::MissingKey)
    }
}
