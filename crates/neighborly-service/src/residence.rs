//! Residences: the directory, the claim flow and administrator upkeep.
//!
//! ## Summary
//! A signed-in resident claims at most one residence and a residence is held
//! by at most one resident; the first claim wins. The caller's email must be
//! on the allow list, and an entry bound to a residence only admits that
//! residence. The link and the claimed flag are written in one store
//! transaction with both rows locked. Reassignment goes through an
//! administrator releasing the residence.

use serde::Deserialize;
use uuid::Uuid;

use neighborly_core::constants::DESCRIPTION_MAX_LEN;
use neighborly_core::validation::{
    FieldError, validate_email, validate_optional_text, validate_phone, validate_residence_name,
};
use neighborly_db::db::enums::{AuditAction, Street};
use neighborly_db::model::residence::{
    DirectoryFilter, NewResidence, Residence, ResidenceChangeset,
};
use neighborly_db::model::user::User;
use neighborly_db::store::ClaimOutcome;
use neighborly_db::store::prelude::*;

use crate::audit::AuditEntry;
use crate::auth::{Action, Resource, Subjects};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::view::{Mutation, View};
use crate::whitelist::require_whitelisted;

const RESOURCE_TYPE: &str = "residence";

pub const ALREADY_CLAIMED_BY_CALLER: &str = "You have already claimed a residence";
pub const ALREADY_CLAIMED: &str = "This residence has already been claimed";
pub const NOT_AUTHORIZED_TO_CLAIM: &str = "You are not authorized to claim this residence";
const ADMIN_REQUIRED: &str = "Admin access required";
const NOT_FOUND: &str = "Residence not found";

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    pub residence_id: Uuid,
    /// Contact email shown in the directory.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClaimRequest {
    #[must_use]
    pub const fn new(residence_id: Uuid) -> Self {
        Self {
            residence_id,
            email: None,
            notes: None,
        }
    }

    /// Validated details to merge into the residence, omitting blank fields.
    fn details(&self) -> Result<serde_json::Value, FieldError> {
        let mut details = serde_json::Map::new();

        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(Some(email))?;
            details.insert(
                "email".to_string(),
                neighborly_core::util::email::normalize(email).into(),
            );
        }

        validate_optional_text(self.notes.as_deref(), "notes", "Notes", DESCRIPTION_MAX_LEN)?;
        if let Some(notes) = self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            details.insert("notes".to_string(), notes.into());
        }

        Ok(serde_json::Value::Object(details))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResidenceInput {
    pub street_name: Option<String>,
    pub address: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Administrator edit. Absent fields stay as they are; a blank phone number
/// clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResidenceUpdate {
    pub street_name: Option<String>,
    pub address: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

fn parse_street(value: Option<&str>) -> Result<Street, FieldError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(FieldError::new("street_name", "Street name is required"));
    }
    value
        .parse::<Street>()
        .map_err(|e| FieldError::new("street_name", e.to_string()))
}

fn trimmed_phone(phone: Option<&str>) -> Option<String> {
    phone
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

fn require_admin(ctx: &ServiceContext, caller: &User, action: Action) -> ServiceResult<()> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::Residence,
        action,
        ADMIN_REQUIRED,
    )
}

/// ## Summary
/// Lists residences by street then address, optionally filtered by street
/// and by a case-insensitive search over address and surname.
///
/// ## Errors
/// Returns `ValidationError` for an unknown street.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn list_directory(
    ctx: &ServiceContext,
    caller: &User,
    street: Option<&str>,
    search: Option<&str>,
) -> ServiceResult<Vec<Residence>> {
    let street = match street.map(str::trim).filter(|s| !s.is_empty()) {
        Some(street) => Some(parse_street(Some(street))?),
        None => None,
    };
    let filter = DirectoryFilter {
        street,
        search: search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    Ok(ctx.store().list_residences(&filter).await?)
}

/// ## Summary
/// Links the caller to a residence and marks it claimed.
///
/// ## Side Effects
/// - Sets `users.residence_id` and `residences.is_claimed` in one transaction
/// - Merges contact email and notes into the residence details
/// - Appends a claim audit entry
///
/// ## Errors
/// - `AuthorizationError` if the caller's email is not whitelisted or is bound
///   to another residence.
/// - `Conflict` if the caller already holds a residence or the residence is
///   held by someone else.
/// - `NotFound` if the residence does not exist.
#[tracing::instrument(skip(ctx, caller, request), fields(caller = %caller.id, residence_id = %request.residence_id))]
pub async fn claim_residence(
    ctx: &ServiceContext,
    caller: &User,
    request: ClaimRequest,
) -> ServiceResult<Mutation<Residence>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::Residence,
        Action::Claim,
        NOT_AUTHORIZED_TO_CLAIM,
    )?;

    let entry = require_whitelisted(ctx, &caller.email)
        .await
        .map_err(|e| match e {
            ServiceError::AuthorizationError(_) => ServiceError::forbidden(NOT_AUTHORIZED_TO_CLAIM),
            other => other,
        })?;
    if entry
        .residence_id
        .is_some_and(|bound| bound != request.residence_id)
    {
        return Err(ServiceError::forbidden(NOT_AUTHORIZED_TO_CLAIM));
    }

    if caller.residence_id.is_some() {
        return Err(ServiceError::conflict(ALREADY_CLAIMED_BY_CALLER));
    }

    let details = request.details()?;

    match ctx
        .store()
        .claim_residence(caller.id, request.residence_id, details)
        .await?
    {
        ClaimOutcome::Claimed { before, after, .. } => {
            tracing::info!("Residence claimed");
            ctx.audit()
                .record(
                    AuditEntry::new(caller.id, AuditAction::Claim, RESOURCE_TYPE, after.id)
                        .before(&before)
                        .after(&after)
                        .details(after.address.clone()),
                )
                .await;
            Ok(Mutation::new(after, [View::Profile, View::Directory]))
        }
        ClaimOutcome::IdentityAlreadyLinked { .. } => {
            Err(ServiceError::conflict(ALREADY_CLAIMED_BY_CALLER))
        }
        ClaimOutcome::ResidenceTaken => Err(ServiceError::conflict(ALREADY_CLAIMED)),
        ClaimOutcome::ResidenceMissing => Err(ServiceError::not_found(NOT_FOUND)),
    }
}

/// ## Summary
/// Unlinks every resident from a residence and clears its claimed flag so it
/// can be claimed again.
///
/// ## Errors
/// `AuthorizationError` for non-administrators, `NotFound` for unknown ids.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn release_residence(
    ctx: &ServiceContext,
    caller: &User,
    residence_id: Uuid,
) -> ServiceResult<Mutation<Residence>> {
    require_admin(ctx, caller, Action::Release)?;

    let outcome = ctx
        .store()
        .release_residence(residence_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    tracing::info!(released = outcome.released_user_ids.len(), "Residence released");
    ctx.audit()
        .record(
            AuditEntry::new(caller.id, AuditAction::Release, RESOURCE_TYPE, residence_id)
                .before(&outcome.before)
                .after(&outcome.after)
                .details(outcome.after.address.clone()),
        )
        .await;

    Ok(Mutation::new(
        outcome.after,
        [View::Directory, View::Profile, View::Admin],
    ))
}

/// ## Errors
/// `AuthorizationError` for non-administrators, `ValidationError` for bad
/// fields, `Conflict` for a duplicate address.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_residence(
    ctx: &ServiceContext,
    caller: &User,
    input: ResidenceInput,
) -> ServiceResult<Mutation<Residence>> {
    require_admin(ctx, caller, Action::Create)?;

    let street = parse_street(input.street_name.as_deref())?;
    validate_residence_name(input.address.as_deref())?;
    validate_residence_name(input.last_name.as_deref())?;
    validate_phone(input.phone_number.as_deref())?;

    let new_residence = NewResidence::new(
        street,
        input.address.as_deref().unwrap_or_default().trim().to_string(),
        input.last_name.as_deref().unwrap_or_default().trim().to_string(),
        trimmed_phone(input.phone_number.as_deref()),
    );

    let residence = ctx
        .store()
        .create_residence(new_residence)
        .await
        .map_err(|e| match e {
            neighborly_db::error::DbError::Conflict(_) => {
                ServiceError::conflict("A residence with this address already exists")
            }
            other => other.into(),
        })?;

    ctx.audit()
        .record(
            AuditEntry::new(caller.id, AuditAction::Create, RESOURCE_TYPE, residence.id)
                .after(&residence)
                .details(residence.address.clone()),
        )
        .await;

    Ok(Mutation::new(residence, [View::Directory, View::Admin]))
}

/// ## Errors
/// `AuthorizationError` for non-administrators, `ValidationError` for bad
/// fields, `NotFound` for unknown ids.
#[tracing::instrument(skip(ctx, caller, update), fields(caller = %caller.id))]
pub async fn update_residence(
    ctx: &ServiceContext,
    caller: &User,
    residence_id: Uuid,
    update: ResidenceUpdate,
) -> ServiceResult<Mutation<Residence>> {
    require_admin(ctx, caller, Action::Update)?;

    let mut changes = ResidenceChangeset::default();
    if update.street_name.is_some() {
        changes.street_name = Some(parse_street(update.street_name.as_deref())?);
    }
    if let Some(address) = update.address.as_deref() {
        validate_residence_name(Some(address))?;
        changes.address = Some(address.trim().to_string());
    }
    if let Some(last_name) = update.last_name.as_deref() {
        validate_residence_name(Some(last_name))?;
        changes.last_name = Some(last_name.trim().to_string());
    }
    if let Some(phone) = update.phone_number.as_deref() {
        validate_phone(Some(phone))?;
        changes.phone_number = Some(trimmed_phone(Some(phone)));
    }

    let before = ctx
        .store()
        .residence_by_id(residence_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    if changes.is_empty() {
        return Ok(Mutation::unchanged(before));
    }
    changes.updated_at = Some(chrono::Utc::now());

    let after = ctx
        .store()
        .update_residence(residence_id, changes)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    ctx.audit()
        .record(
            AuditEntry::new(caller.id, AuditAction::Update, RESOURCE_TYPE, residence_id)
                .before(&before)
                .after(&after)
                .details(after.address.clone()),
        )
        .await;

    Ok(Mutation::new(after, [View::Directory, View::Admin]))
}

/// ## Summary
/// Deletes a residence, unlinking its residents in the same transaction.
///
/// ## Errors
/// `AuthorizationError` for non-administrators, `NotFound` for unknown ids.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn delete_residence(
    ctx: &ServiceContext,
    caller: &User,
    residence_id: Uuid,
) -> ServiceResult<Mutation<()>> {
    require_admin(ctx, caller, Action::Delete)?;

    let removal = ctx
        .store()
        .delete_residence(residence_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    ctx.audit()
        .record(
            AuditEntry::new(caller.id, AuditAction::Delete, RESOURCE_TYPE, residence_id)
                .before(&removal.residence)
                .details(removal.residence.address.clone()),
        )
        .await;

    Ok(Mutation::new(
        (),
        [View::Directory, View::Profile, View::Admin],
    ))
}
