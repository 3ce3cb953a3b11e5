//! Whitelist gate.
//!
//! ## Summary
//! Only addresses on the allow list may sign in or claim a residence. The
//! match is exact after trimming and lowercasing. Bootstrap administrators
//! from configuration get allow-list entries at start-up through
//! [`seed_bootstrap_admins`]; the gate itself only consults the table.

use neighborly_core::util::email::normalize;
use neighborly_db::error::DbError;
use neighborly_db::model::allowed_email::{AllowedEmail, NewAllowedEmail};
use neighborly_db::store::prelude::*;

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};

pub const NOT_WHITELISTED: &str =
    "This email is not authorized. Please contact an administrator to request access.";

/// ## Summary
/// Returns the allow-list entry for `email`, if any.
///
/// ## Errors
/// Returns an error if the store lookup fails.
#[tracing::instrument(skip(ctx))]
pub async fn clearance(ctx: &ServiceContext, email: &str) -> ServiceResult<Option<AllowedEmail>> {
    Ok(ctx.store().allowed_email_by_email(&normalize(email)).await?)
}

/// ## Summary
/// Like [`clearance`] but treats absence as a hard failure.
///
/// ## Errors
/// Returns `AuthorizationError` directing the caller to an administrator if
/// the email is not allowed.
pub async fn require_whitelisted(ctx: &ServiceContext, email: &str) -> ServiceResult<AllowedEmail> {
    clearance(ctx, email).await?.ok_or_else(|| {
        tracing::info!(%email, "Email rejected by whitelist gate");
        ServiceError::forbidden(NOT_WHITELISTED)
    })
}

/// What start-up seeding changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSeed {
    pub listed: usize,
    pub promoted: usize,
}

/// ## Summary
/// Puts every configured bootstrap administrator on the allow list and
/// promotes those who already have an account. Safe to run on every start.
///
/// ## Errors
/// Returns an error if a store call fails for a reason other than the entry
/// already existing.
#[tracing::instrument(skip(ctx))]
pub async fn seed_bootstrap_admins(ctx: &ServiceContext) -> ServiceResult<BootstrapSeed> {
    let mut seed = BootstrapSeed::default();

    for email in ctx.auth_config().bootstrap_admins.iter().map(|e| normalize(e)) {
        match ctx
            .store()
            .insert_allowed_email(NewAllowedEmail::new(email.clone(), None))
            .await
        {
            Ok(entry) => {
                seed.listed += 1;
                tracing::info!(email = %entry.email, "Bootstrap admin added to allow list");
            }
            Err(DbError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(user) = ctx.store().grant_admin(&email).await? {
            seed.promoted += 1;
            tracing::info!(user_id = %user.id, "Bootstrap admin promoted");
        }
    }

    tracing::info!(listed = seed.listed, promoted = seed.promoted, "Bootstrap admins seeded");
    Ok(seed)
}
