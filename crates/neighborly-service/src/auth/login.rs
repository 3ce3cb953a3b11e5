//! Passwordless sign-in.
//!
//! ## Summary
//! 1. `request_login_code`: whitelisted email gets a six digit code, stored
//!    hashed with a short expiry. A new request replaces any earlier code.
//! 2. `verify_login_code`: the code is consumed in one atomic step, the
//!    whitelist is checked again, the user is found or created, and an opaque
//!    session token is issued.
//! 3. `authenticate` resolves a presented token to its user; `sign_out`
//!    revokes it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use neighborly_core::util::email::normalize;
use neighborly_core::validation::validate_email;
use neighborly_db::error::DbError;
use neighborly_db::model::login::{LoginCode, Session};
use neighborly_db::model::user::{NewUser, User};
use neighborly_db::store::prelude::*;

use super::secret::{
    generate_login_code, generate_session_token, hash_login_code, hash_session_token,
};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::whitelist::require_whitelisted;

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// ## Summary
/// Issues a login code for a whitelisted email and hands it to the sender.
///
/// ## Errors
/// - `ValidationError` for a malformed email.
/// - `AuthorizationError` if the email is not whitelisted.
/// - Store or delivery failures.
#[tracing::instrument(skip(ctx))]
pub async fn request_login_code(ctx: &ServiceContext, email: &str) -> ServiceResult<()> {
    validate_email(Some(email))?;
    let email = normalize(email);

    require_whitelisted(ctx, &email).await?;

    let code = generate_login_code();
    let now = Utc::now();
    ctx.store()
        .put_login_code(LoginCode {
            email: email.clone(),
            code_hash: hash_login_code(&email, &code),
            expires_at: now + Duration::minutes(ctx.auth_config().login_code_ttl_minutes),
            created_at: now,
            attempts: 0,
        })
        .await?;

    ctx.sender().send(&email, &code).await?;

    tracing::debug!("Login code stored");
    Ok(())
}

/// ## Summary
/// Exchanges a login code for a session token.
///
/// ## Side Effects
/// - Deletes the login code
/// - Creates the user on first sign-in (as administrator for bootstrap admins)
/// - Counts a failed attempt on a wrong code
/// - Inserts a session row
///
/// Every wrong code counts against the outstanding one; after
/// `auth.login_code_max_attempts` misses it is discarded and a new code must
/// be requested.
///
/// ## Errors
/// - `InvalidLoginCode` if no matching unexpired code exists.
/// - `AuthorizationError` if the email was removed from the whitelist.
#[tracing::instrument(skip(ctx, code))]
pub async fn verify_login_code(
    ctx: &ServiceContext,
    email: &str,
    code: &str,
) -> ServiceResult<SignedIn> {
    validate_email(Some(email))?;
    let email = normalize(email);
    let now = Utc::now();

    let consumed = ctx
        .store()
        .consume_login_code(
            &email,
            &hash_login_code(&email, code),
            now,
            ctx.auth_config().login_code_max_attempts,
        )
        .await?;
    if consumed.is_none() {
        tracing::debug!("Login code rejected");
        return Err(ServiceError::InvalidLoginCode);
    }

    require_whitelisted(ctx, &email).await?;

    let user = find_or_create_user(ctx, &email).await?;

    let token = generate_session_token();
    let session = ctx
        .store()
        .create_session(Session {
            token_hash: hash_session_token(&token),
            user_id: user.id,
            expires_at: now + Duration::days(ctx.auth_config().session_ttl_days),
            created_at: now,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(SignedIn {
        token,
        user,
        expires_at: session.expires_at,
    })
}

async fn find_or_create_user(ctx: &ServiceContext, email: &str) -> ServiceResult<User> {
    if let Some(user) = ctx.store().user_by_email(email).await? {
        return Ok(user);
    }

    let is_admin = ctx.auth_config().is_bootstrap_admin(email);
    match ctx
        .store()
        .create_user(NewUser::new(email.to_string(), is_admin))
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, is_admin, "User created");
            Ok(user)
        }
        // Lost a race with a concurrent first sign-in.
        Err(DbError::Conflict(_)) => ctx
            .store()
            .user_by_email(email)
            .await?
            .ok_or(ServiceError::InvariantViolation(
                "user vanished after unique violation",
            )),
        Err(e) => Err(e.into()),
    }
}

/// ## Summary
/// Resolves a session token to its user.
///
/// ## Errors
/// Returns `NotAuthenticated` for an unknown or expired token.
#[tracing::instrument(skip_all)]
pub async fn authenticate(ctx: &ServiceContext, token: &str) -> ServiceResult<User> {
    ctx.store()
        .session_user(&hash_session_token(token), Utc::now())
        .await?
        .ok_or(ServiceError::NotAuthenticated)
}

/// ## Summary
/// Revokes a session token. Unknown tokens are ignored.
///
/// ## Errors
/// Returns an error if the store call fails.
#[tracing::instrument(skip_all)]
pub async fn sign_out(ctx: &ServiceContext, token: &str) -> ServiceResult<()> {
    let removed = ctx.store().delete_session(&hash_session_token(token)).await?;
    tracing::debug!(removed, "Session revoked");
    Ok(())
}

/// ## Summary
/// Deletes expired login codes and sessions.
///
/// ## Errors
/// Returns an error if the store call fails.
#[tracing::instrument(skip(ctx))]
pub async fn purge_expired(ctx: &ServiceContext) -> ServiceResult<usize> {
    let purged = ctx.store().purge_expired(Utc::now()).await?;
    if purged > 0 {
        tracing::info!(purged, "Expired login codes and sessions removed");
    }
    Ok(purged)
}
