//! Data model for the omnigraph store.
//!
//! Every persisted kind carries the store's system fields (`_id`, `_key`,
//! `_rev`), the embedded ACL fields, and its type-specific payload.

mod common;
mod entities;
mod monitor;
mod view;

pub use common::{now_ms, AclFields, DocumentMeta, Location};
pub use entities::{
    EntityDraft, Event, EventData, Organization, OrganizationData, Person, PersonData, Record,
    Relation, RelationData, Source, SourceData, StoredEntity, Website, WebsiteData,
};
pub use monitor::{MonitoringSource, MonitoringSourceData};
pub use view::{View, ViewConfig, ViewData, ViewMode, ViewUi};

/// Canonical collection names. Collection names are always lower-case.
pub mod collections {
    pub const PERSON: &str = "person";
    pub const ORGANIZATION: &str = "organization";
    pub const WEBSITE: &str = "website";
    pub const SOURCE: &str = "source";
    pub const EVENT: &str = "event";
    pub const VIEW: &str = "osintview";
    pub const MONITORING_SOURCE: &str = "monitoringsource";
}

/// Named graph holding every relation between entity collections.
pub const EVENT_RELATED_GRAPH: &str = "event_related_graph";

/// Named graph holding `includes` edges from views to entities.
pub const VIEW_GRAPH: &str = "osint_view_graph";

/// Search view over the event collection and event-to-event edge
/// collections.
pub const EVENT_VIEW: &str = "event_view";

/// Whether `name` is one of the five entity collections.
pub fn is_entity_collection(name: &str) -> bool {
    matches!(
        name,
        collections::PERSON
            | collections::ORGANIZATION
            | collections::WEBSITE
            | collections::SOURCE
            | collections::EVENT
    )
}
