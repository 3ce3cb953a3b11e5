//! Query functions for the audit log.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::audit_logs;
use crate::model::audit::{AuditLogEntry, NewAuditLogEntry};

/// ## Summary
/// Returns the newest `limit` entries.
#[must_use]
pub fn recent(limit: i64) -> audit_logs::BoxedQuery<'static, diesel::pg::Pg, diesel::dsl::AsSelect<AuditLogEntry, diesel::pg::Pg>> {
    audit_logs::table
        .select(AuditLogEntry::as_select())
        .order_by(audit_logs::created_at.desc())
        .limit(limit)
        .into_boxed()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn append(conn: &mut DbConnection<'_>, entry: &NewAuditLogEntry) -> QueryResult<usize> {
    diesel::insert_into(audit_logs::table)
        .values(entry)
        .execute(conn)
        .await
}
