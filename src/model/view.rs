//! Views: saved bundles of entity references with display configuration.

use serde::{Deserialize, Serialize};

use super::collections;
use super::common::{AclFields, DocumentMeta};
use super::entities::{EntityDraft, StoredEntity};

/// UI used to render a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewUi {
    Geovision,
    Sparkle,
}

impl Default for ViewUi {
    fn default() -> Self {
        ViewUi::Sparkle
    }
}

/// Display mode of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Default,
    Ruler,
    Compare,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Default
    }
}

/// One display configuration inside a view.
///
/// Every id in `entities` must resolve to an existing document at the
/// moment the config is added; there is no ongoing integrity maintenance
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub view_ui: ViewUi,
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Ordered entity ids rendered by this config.
    #[serde(default)]
    pub entities: Vec<String>,
}

/// Creation payload for a view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub configs: Vec<ViewConfig>,
}

/// A persisted view document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(flatten)]
    pub acl: AclFields,
    #[serde(flatten)]
    pub data: ViewData,
}

impl StoredEntity for View {
    const COLLECTION: &'static str = collections::VIEW;

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn acl(&self) -> &AclFields {
        &self.acl
    }
}

impl EntityDraft for ViewData {
    type Output = View;
}
