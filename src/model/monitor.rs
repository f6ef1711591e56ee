//! Monitoring sources: per-user watch targets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collections;
use super::common::{AclFields, DocumentMeta};
use super::entities::{EntityDraft, StoredEntity};

/// Creation payload for a monitoring source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSourceData {
    pub name: String,
    #[serde(rename = "type", default)]
    pub source_type: String,
    #[serde(default)]
    pub url: String,
    /// The user this watch target belongs to.
    pub user_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

/// A persisted monitoring source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSource {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(flatten)]
    pub acl: AclFields,
    #[serde(flatten)]
    pub data: MonitoringSourceData,
}

impl StoredEntity for MonitoringSource {
    const COLLECTION: &'static str = collections::MONITORING_SOURCE;

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn acl(&self) -> &AclFields {
        &self.acl
    }
}

impl EntityDraft for MonitoringSourceData {
    type Output = MonitoringSource;
}
