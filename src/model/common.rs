//! System and ACL fields shared by every persisted document.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Store-assigned system fields.
///
/// The id is assigned exactly once at insert time and is immutable; the
/// revision is replaced on every store-confirmed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Canonical document id, `"{collection}/{key}"`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Document key, unique within its collection.
    #[serde(rename = "_key")]
    pub key: String,
    /// Document revision.
    #[serde(rename = "_rev")]
    pub rev: String,
}

/// Embedded access-control fields.
///
/// `read` and `write` mix user ids and role names; the owner is implicitly
/// a member of both lists for permission decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclFields {
    pub owner: String,
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
}

/// Geographical location data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    pub country_code: String,
    #[serde(default)]
    pub administrative_area: String,
    #[serde(default)]
    pub sub_administrative_area: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub sub_locality: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
}

/// Current time as epoch milliseconds, the timestamp unit used throughout
/// the document model.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
