use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::{enums::AuditAction, schema};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::audit_logs)]
#[diesel(check_for_backend(Pg))]
pub struct AuditLogEntry {
    pub id: uuid::Uuid,
    pub actor_id: uuid::Uuid,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::audit_logs)]
pub struct NewAuditLogEntry {
    pub id: uuid::Uuid,
    pub actor_id: uuid::Uuid,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub description: String,
}
