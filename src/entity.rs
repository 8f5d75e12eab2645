//! Request and response bodies.

use serde::{de::DeserializeOwned, Serialize};

/// The body of a request or response.
///
/// A `Text` entity is already in wire form and is sent as-is. A `Json` entity
/// is structured data that the content-negotiation interceptor serializes
/// according to the request's MIME type; without that interceptor the
/// transport refuses it.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A pre-serialized body.
    Text(String),
    /// Structured data awaiting serialization, or a decoded JSON response.
    Json(serde_json::Value),
}

impl Entity {
    /// Builds a `Json` entity from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> crate::Result<Self> {
        serde_json::to_value(value)
            .map(Entity::Json)
            .map_err(|e| crate::Error::SerializationFailed(e.to_string()))
    }

    /// Returns the text if this is a `Text` entity.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Entity::Text(text) => Some(text),
            Entity::Json(_) => None,
        }
    }

    /// Returns the value if this is a `Json` entity.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Entity::Json(value) => Some(value),
            Entity::Text(_) => None,
        }
    }

    /// Deserializes the entity into `T`.
    ///
    /// `Json` entities are converted directly; `Text` entities are parsed as JSON.
    pub fn parse<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        match self {
            Entity::Json(value) => T::deserialize(value),
            Entity::Text(text) => serde_json::from_str(text),
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::Text(String::new())
    }
}

impl From<String> for Entity {
    fn from(text: String) -> Self {
        Entity::Text(text)
    }
}

impl From<&str> for Entity {
    fn from(text: &str) -> Self {
        Entity::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Entity {
    fn from(value: serde_json::Value) -> Self {
        Entity::Json(value)
    }
}
