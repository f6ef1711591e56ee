//! Embedded document-level permission checks.
//!
//! Permissions live on the documents themselves: an `owner` plus `read`
//! and `write` lists mixing user ids and role names. Checks answer
//! questions about one principal and one document; there is no policy
//! store and no inheritance.

use std::sync::Arc;

use serde_json::Value;

use crate::dal::EntityAccessLayer;
use crate::error::Result;

pub struct PermissionEvaluator {
    entities: Arc<EntityAccessLayer>,
}

impl PermissionEvaluator {
    pub fn new(entities: Arc<EntityAccessLayer>) -> Self {
        Self { entities }
    }

    /// Whether `user` owns the document. Absent documents grant nothing.
    pub async fn is_owner(&self, id: &str, user: &str) -> Result<bool> {
        match self.entities.get_document(id).await? {
            Some(doc) => Ok(doc.get("owner").and_then(Value::as_str) == Some(user)),
            None => Ok(false),
        }
    }

    /// Whether `user` (or any of their roles) may read the document.
    pub async fn can_read(&self, id: &str, user: &str, roles: &[String]) -> Result<bool> {
        self.check(id, user, roles, "read").await
    }

    /// Whether `user` (or any of their roles) may write the document.
    pub async fn can_write(&self, id: &str, user: &str, roles: &[String]) -> Result<bool> {
        self.check(id, user, roles, "write").await
    }

    async fn check(&self, id: &str, user: &str, roles: &[String], list: &str) -> Result<bool> {
        let doc = match self.entities.get_document(id).await? {
            Some(doc) => doc,
            None => return Ok(false),
        };

        // The owner is implicitly on both lists.
        if doc.get("owner").and_then(Value::as_str) == Some(user) {
            return Ok(true);
        }

        let granted = match doc.get(list).and_then(Value::as_array) {
            Some(entries) => entries,
            None => return Ok(false),
        };
        Ok(granted.iter().filter_map(Value::as_str).any(|principal| {
            principal == user || roles.iter().any(|role| role == principal)
        }))
    }
}
