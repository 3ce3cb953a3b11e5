//! Allow-list administration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use neighborly_core::util::email::{normalize, split_bulk};
use neighborly_core::validation::validate_email;
use neighborly_db::db::enums::AuditAction;
use neighborly_db::error::DbError;
use neighborly_db::model::allowed_email::{AllowedEmail, NewAllowedEmail};
use neighborly_db::model::user::User;
use neighborly_db::store::prelude::*;

use crate::audit::AuditEntry;
use crate::auth::{Action, Resource, Subjects};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::view::{Mutation, View};

const RESOURCE_TYPE: &str = "allowed_email";
const ADMIN_REQUIRED: &str = "Admin access required";

#[derive(Debug, Clone, Deserialize)]
pub struct AllowedEmailInput {
    pub email: String,
    #[serde(default)]
    pub residence_id: Option<Uuid>,
}

/// Outcome of a bulk paste.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkAdd {
    pub inserted: usize,
    /// Already on the list.
    pub skipped: usize,
    /// Entries that are not valid addresses.
    pub invalid: Vec<String>,
}

fn require_admin(ctx: &ServiceContext, caller: &User, action: Action) -> ServiceResult<()> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::AllowedEmail,
        action,
        ADMIN_REQUIRED,
    )
}

/// ## Errors
/// `AuthorizationError` for non-administrators.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn list_allowed_emails(
    ctx: &ServiceContext,
    caller: &User,
) -> ServiceResult<Vec<AllowedEmail>> {
    require_admin(ctx, caller, Action::Read)?;
    Ok(ctx.store().list_allowed_emails().await?)
}

/// ## Summary
/// Adds one email to the allow list, optionally bound to a residence.
///
/// ## Errors
/// - `AuthorizationError` for non-administrators.
/// - `ValidationError` for a malformed email.
/// - `NotFound` if the residence does not exist.
/// - `Conflict` if the email is already listed.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn add_allowed_email(
    ctx: &ServiceContext,
    caller: &User,
    input: AllowedEmailInput,
) -> ServiceResult<Mutation<AllowedEmail>> {
    require_admin(ctx, caller, Action::Create)?;
    validate_email(Some(&input.email))?;

    if let Some(residence_id) = input.residence_id {
        ctx.store()
            .residence_by_id(residence_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Residence not found"))?;
    }

    let entry = ctx
        .store()
        .insert_allowed_email(NewAllowedEmail::new(
            normalize(&input.email),
            input.residence_id,
        ))
        .await
        .map_err(|e| match e {
            DbError::Conflict(_) => ServiceError::conflict("This email is already on the allow list"),
            other => other.into(),
        })?;

    tracing::info!(email = %entry.email, "Email added to allow list");
    ctx.audit()
        .record(
            AuditEntry::new(caller.id, AuditAction::Create, RESOURCE_TYPE, entry.id)
                .after(&entry)
                .details(entry.email.clone()),
        )
        .await;

    Ok(Mutation::new(entry, [View::Admin]))
}

/// ## Summary
/// Adds every address in a pasted block separated by commas, semicolons or
/// newlines. Addresses already listed are skipped; malformed ones are
/// reported back.
///
/// ## Errors
/// `AuthorizationError` for non-administrators.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn bulk_add_allowed_emails(
    ctx: &ServiceContext,
    caller: &User,
    input: &str,
) -> ServiceResult<Mutation<BulkAdd>> {
    require_admin(ctx, caller, Action::Create)?;

    let (valid, invalid): (Vec<String>, Vec<String>) = split_bulk(input)
        .into_iter()
        .partition(|email| validate_email(Some(email)).is_ok());

    let requested = valid.len();
    let inserted = ctx
        .store()
        .insert_allowed_emails(
            valid
                .into_iter()
                .map(|email| NewAllowedEmail::new(email, None))
                .collect(),
        )
        .await?;

    tracing::info!(
        inserted = inserted.len(),
        requested,
        invalid = invalid.len(),
        "Bulk allow list import"
    );

    if !inserted.is_empty() {
        let emails: Vec<&str> = inserted.iter().map(|e| e.email.as_str()).collect();
        ctx.audit()
            .record(
                AuditEntry::new(caller.id, AuditAction::Create, RESOURCE_TYPE, "bulk")
                    .after(&emails)
                    .details(format!("{} emails", inserted.len())),
            )
            .await;
    }

    Ok(Mutation::new(
        BulkAdd {
            inserted: inserted.len(),
            skipped: requested - inserted.len(),
            invalid,
        },
        [View::Admin],
    ))
}

/// ## Errors
/// `AuthorizationError` for non-administrators, `NotFound` for unknown ids.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn remove_allowed_email(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
) -> ServiceResult<Mutation<()>> {
    require_admin(ctx, caller, Action::Delete)?;

    let removed = ctx
        .store()
        .delete_allowed_email(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Allowed email not found"))?;

    tracing::info!(email = %removed.email, "Email removed from allow list");
    ctx.audit()
        .record(
            AuditEntry::new(caller.id, AuditAction::Delete, RESOURCE_TYPE, id)
                .before(&removed)
                .details(removed.email.clone()),
        )
        .await;

    Ok(Mutation::new((), [View::Admin]))
}
