//! Administrator dashboard and audit log.

use serde::Serialize;

use neighborly_db::model::allowed_email::AllowedEmail;
use neighborly_db::model::audit::AuditLogEntry;
use neighborly_db::model::event::CalendarEvent;
use neighborly_db::model::residence::{DirectoryFilter, Residence};
use neighborly_db::model::user::User;
use neighborly_db::store::prelude::*;

use crate::auth::{Action, Resource, Subjects};
use crate::context::ServiceContext;
use crate::error::ServiceResult;

const ADMIN_REQUIRED: &str = "Admin access required";
const RECENT_LIMIT: usize = 5;
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;
const MAX_AUDIT_LIMIT: i64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub residences: i64,
    pub claimed_residences: i64,
    pub users: i64,
    pub events: i64,
    pub clubs: i64,
    pub giveaways: i64,
    pub help_requests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub counts: DashboardCounts,
    /// Most recently created first.
    pub recent_events: Vec<CalendarEvent>,
    /// Most recently created first.
    pub recent_residences: Vec<Residence>,
    pub allowed_emails: Vec<AllowedEmail>,
}

fn newest<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows.truncate(RECENT_LIMIT);
    rows
}

/// ## Summary
/// Gathers site totals and the latest activity for the admin page.
///
/// ## Errors
/// `AuthorizationError` for non-administrators.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn dashboard(ctx: &ServiceContext, caller: &User) -> ServiceResult<Dashboard> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::Dashboard,
        Action::Read,
        ADMIN_REQUIRED,
    )?;

    let store = ctx.store();
    let directory = DirectoryFilter::default();
    let (residences, users, events, clubs, giveaways, help_requests) = futures::try_join!(
        store.count_residences(),
        store.count_users(),
        store.count_events(),
        store.count_clubs(),
        store.count_giveaways(),
        store.count_help_requests(),
    )?;
    let (all_events, all_residences, allowed_emails) = futures::try_join!(
        store.list_events(None),
        store.list_residences(&directory),
        store.list_allowed_emails(),
    )?;

    Ok(Dashboard {
        counts: DashboardCounts {
            residences: residences.total,
            claimed_residences: residences.claimed,
            users,
            events,
            clubs,
            giveaways,
            help_requests,
        },
        recent_events: newest(all_events, |e| e.created_at),
        recent_residences: newest(all_residences, |r| r.created_at),
        allowed_emails,
    })
}

/// Latest audit entries, newest first. `limit` is clamped to 1..=500.
///
/// ## Errors
/// `AuthorizationError` for non-administrators.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn recent_audit_log(
    ctx: &ServiceContext,
    caller: &User,
    limit: Option<i64>,
) -> ServiceResult<Vec<AuditLogEntry>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::AuditLog,
        Action::Read,
        ADMIN_REQUIRED,
    )?;

    let limit = limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    Ok(ctx.store().recent_audit(limit).await?)
}
