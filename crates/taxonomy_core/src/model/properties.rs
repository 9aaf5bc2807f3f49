//! Opaque item property payload.
//!
//! # Responsibility
//! - Model arbitrary client-defined key/value shapes without committing the
//!   store to any schema.
//! - Keep serialization lossless for nested shapes and numeric kinds.
//!
//! # Invariants
//! - Keys are ordered deterministically (BTreeMap), so serialized payloads
//!   are stable across round-trips.
//! - The reserved `id`/`internal_id` keys are stripped before persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property keys that collide with item identity fields and are never stored
/// inside the payload.
pub const RESERVED_PROPERTY_KEYS: [&str; 2] = ["id", "internal_id"];

/// Ordered map of client-defined properties.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Tagged value union for one property.
///
/// Mirrors the JSON data model; integers and floats are kept distinct so a
/// round-trip does not turn `3` into `3.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Removes the reserved identity keys from a payload in place.
pub fn strip_reserved_keys(properties: &mut Properties) {
    for key in RESERVED_PROPERTY_KEYS {
        properties.remove(key);
    }
}
