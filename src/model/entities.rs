//! The five entity kinds and the Relation edge type.
//!
//! Each kind is split into a payload struct (what callers supply at
//! creation time, `*Data`) and the persisted struct composing system
//! fields, ACL fields, and the payload via `#[serde(flatten)]`.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collections;
use super::common::{AclFields, DocumentMeta, Location};

/// A document kind persisted in a fixed collection.
pub trait StoredEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection this kind lives in.
    const COLLECTION: &'static str;

    /// Store-assigned system fields.
    fn meta(&self) -> &DocumentMeta;

    /// Embedded ACL fields.
    fn acl(&self) -> &AclFields;
}

/// Creation payload for a stored kind.
///
/// `search_text` composes the text that is embedded for vector search;
/// kinds returning `None` are never embedded.
pub trait EntityDraft: Serialize + Send + Sync {
    type Output: StoredEntity;

    fn search_text(&self) -> Option<String> {
        None
    }
}

macro_rules! stored_entity {
    ($entity:ident, $data:ident, $collection:expr) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $entity {
            #[serde(flatten)]
            pub meta: DocumentMeta,
            #[serde(flatten)]
            pub acl: AclFields,
            #[serde(flatten)]
            pub data: $data,
        }

        impl StoredEntity for $entity {
            const COLLECTION: &'static str = $collection;

            fn meta(&self) -> &DocumentMeta {
                &self.meta
            }

            fn acl(&self) -> &AclFields {
                &self.acl
            }
        }

        impl EntityDraft for $data {
            type Output = $entity;

            fn search_text(&self) -> Option<String> {
                self.search_text()
            }
        }
    };
}

// ============================================================================
// Person
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonData {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub birth_date: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl PersonData {
    fn search_text(&self) -> Option<String> {
        Some(format!(
            "{} {} {} {}",
            self.name,
            self.role,
            self.nationality,
            self.aliases.join(" ")
        ))
    }
}

stored_entity!(Person, PersonData, collections::PERSON);

// ============================================================================
// Organization
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationData {
    pub name: String,
    #[serde(rename = "type", default)]
    pub org_type: String,
    #[serde(default)]
    pub founded_at: i64,
    #[serde(default)]
    pub discovered_at: i64,
    #[serde(default)]
    pub last_visited: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl OrganizationData {
    fn search_text(&self) -> Option<String> {
        Some(format!(
            "{} {} {}",
            self.name,
            self.org_type,
            self.tags.join(" ")
        ))
    }
}

stored_entity!(Organization, OrganizationData, collections::ORGANIZATION);

// ============================================================================
// Website
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteData {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub founded_at: i64,
    #[serde(default)]
    pub discovered_at: i64,
    #[serde(default)]
    pub last_visited: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl WebsiteData {
    fn search_text(&self) -> Option<String> {
        Some(format!("{} {} {}", self.title, self.description, self.url))
    }
}

stored_entity!(Website, WebsiteData, collections::WEBSITE);

// ============================================================================
// Source
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceData {
    #[serde(rename = "type", default)]
    pub source_type: String,
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reliability: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl SourceData {
    fn search_text(&self) -> Option<String> {
        Some(format!(
            "{} {} {} {}",
            self.title, self.description, self.name, self.url
        ))
    }
}

stored_entity!(Source, SourceData, collections::SOURCE);

// ============================================================================
// Event
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub location: Location,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub happened_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl EventData {
    fn search_text(&self) -> Option<String> {
        Some(format!(
            "{} {} {} {} {} {}",
            self.title,
            self.description,
            self.event_type,
            self.location.country_code,
            self.location.locality,
            self.location.address
        ))
    }
}

stored_entity!(Event, EventData, collections::EVENT);

// ============================================================================
// Relation
// ============================================================================

/// Creation payload for a directed, labeled edge between two entities.
///
/// Relations have no fixed collection: they are persisted in an edge
/// collection derived from `(from collection, name, to collection)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationData {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub confidence: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(rename = "_from")]
    pub from_id: String,
    #[serde(rename = "_to")]
    pub to_id: String,
}

/// A persisted relation edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(flatten)]
    pub acl: AclFields,
    #[serde(flatten)]
    pub data: RelationData,
}

// ============================================================================
// Record
// ============================================================================

/// Union over the typed results the generic query mapper can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Person(Person),
    Organization(Organization),
    Website(Website),
    Source(Source),
    Event(Event),
    Relation(Relation),
}

impl Record {
    /// Canonical document id of the mapped row.
    pub fn id(&self) -> &str {
        match self {
            Record::Person(p) => &p.meta.id,
            Record::Organization(o) => &o.meta.id,
            Record::Website(w) => &w.meta.id,
            Record::Source(s) => &s.meta.id,
            Record::Event(e) => &e.meta.id,
            Record::Relation(r) => &r.meta.id,
        }
    }

    /// The event behind this record, if it is one.
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Record::Event(e) => Some(e),
            _ => None,
        }
    }

    /// The relation behind this record, if it is one.
    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Record::Relation(r) => Some(r),
            _ => None,
        }
    }
}
