//! Best-effort audit trail.
//!
//! ## Summary
//! Administrative mutations and residence claims append one row each. Entries
//! are written after the data change has committed; a failed append is
//! logged at `error` and swallowed, so an audit outage never fails or rolls
//! back the operation that triggered it.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use neighborly_db::db::enums::AuditAction;
use neighborly_db::model::audit::NewAuditLogEntry;
use neighborly_db::store::prelude::*;

/// Builder for one audit row.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    actor_id: Uuid,
    action: AuditAction,
    resource_type: &'static str,
    resource_id: String,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
    details: String,
}

impl AuditEntry {
    #[must_use]
    pub fn new(
        actor_id: Uuid,
        action: AuditAction,
        resource_type: &'static str,
        resource_id: impl ToString,
    ) -> Self {
        Self {
            actor_id,
            action,
            resource_type,
            resource_id: resource_id.to_string(),
            before: None,
            after: None,
            details: String::new(),
        }
    }

    #[must_use]
    pub fn before(mut self, snapshot: &impl Serialize) -> Self {
        self.before = snapshot_of(snapshot);
        self
    }

    #[must_use]
    pub fn after(mut self, snapshot: &impl Serialize) -> Self {
        self.after = snapshot_of(snapshot);
        self
    }

    /// Free-form detail appended to the generated description.
    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// "Claim residence: 12 Symor Dr"
    #[must_use]
    pub fn description(&self) -> String {
        describe(self.action, self.resource_type, &self.details)
    }

    fn into_row(self) -> NewAuditLogEntry {
        let description = self.description();
        NewAuditLogEntry {
            id: Uuid::now_v7(),
            actor_id: self.actor_id,
            action: self.action,
            resource_type: self.resource_type.to_string(),
            resource_id: self.resource_id,
            old_values: self.before,
            new_values: self.after,
            description,
        }
    }
}

fn snapshot_of(value: &impl Serialize) -> Option<serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize audit snapshot");
            None
        }
    }
}

/// Capitalized action, resource type, then details.
#[must_use]
pub fn describe(action: AuditAction, resource_type: &str, details: &str) -> String {
    let action = action.as_str();
    let mut chars = action.chars();
    let action = chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    });
    let resource_type = resource_type.replace('_', " ");

    if details.is_empty() {
        format!("{action} {resource_type}")
    } else {
        format!("{action} {resource_type}: {details}")
    }
}

#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn Store>,
}

impl AuditLogger {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends the entry. Never fails.
    #[tracing::instrument(skip(self, entry), fields(action = %entry.action, resource_type = entry.resource_type))]
    pub async fn record(&self, entry: AuditEntry) {
        let row = entry.into_row();
        let resource_id = row.resource_id.clone();

        if let Err(e) = self.store.append_audit(row).await {
            tracing::error!(error = %e, %resource_id, "Audit logging failed");
        }
    }
}
