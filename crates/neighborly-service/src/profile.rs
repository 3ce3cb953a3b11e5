use serde::Serialize;

use neighborly_core::validation::validate_phone;
use neighborly_db::model::residence::Residence;
use neighborly_db::model::user::User;
use neighborly_db::store::prelude::*;

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::view::{Mutation, View};

/// The caller with the residence they hold, if any.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub residence: Option<Residence>,
}

/// ## Errors
/// Returns an error if a store lookup fails.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn get_profile(ctx: &ServiceContext, caller: &User) -> ServiceResult<Profile> {
    // Re-read so a claim made earlier in the session shows up.
    let user = ctx
        .store()
        .user_by_id(caller.id)
        .await?
        .ok_or(ServiceError::NotAuthenticated)?;

    let residence = match user.residence_id {
        Some(id) => ctx.store().residence_by_id(id).await?,
        None => None,
    };

    Ok(Profile { user, residence })
}

/// ## Summary
/// Sets or clears the caller's phone number. Blank input clears it.
///
/// ## Errors
/// Returns `ValidationError` for a malformed number.
#[tracing::instrument(skip(ctx, caller, phone), fields(caller = %caller.id))]
pub async fn update_phone(
    ctx: &ServiceContext,
    caller: &User,
    phone: Option<&str>,
) -> ServiceResult<Mutation<User>> {
    validate_phone(phone)?;
    let phone = phone
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let user = ctx
        .store()
        .update_user_phone(caller.id, phone)
        .await?
        .ok_or(ServiceError::NotAuthenticated)?;

    Ok(Mutation::new(user, [View::Profile]))
}
