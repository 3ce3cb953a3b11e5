//! Community board: charitable drives and needs, giveaways, help requests
//! and the comment threads under each.

use serde::Deserialize;
use uuid::Uuid;

use neighborly_core::constants::COMMENT_MAX_LEN;
use neighborly_core::validation::{
    FieldError, validate_description, validate_description_with_limit, validate_event_title,
};
use neighborly_db::db::enums::{
    AuditAction, CharitableItemType, CommunityItemKind, GiveawayStatus, HelpRequestType,
};
use neighborly_db::model::community::{
    CharitableItem, CommunityBoard, CommunityComment, Giveaway, HelpRequest, NewCharitableItem,
    NewCommunityComment, NewGiveaway, NewHelpRequest,
};
use neighborly_db::model::user::User;
use neighborly_db::store::prelude::*;

use crate::audit::AuditEntry;
use crate::auth::{Action, Resource, Subjects};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::view::{Mutation, View};

pub const DELETE_DENIED: &str = "Only admins or item creator can delete this";

/// Title, description and an optional subtype for a new posting.
///
/// `kind` is the charitable item type (`drive`/`need`) or the help request
/// type (`advice`/`help`) and is ignored for giveaways.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, alias = "item_type", alias = "request_type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub item_type: String,
    pub item_id: Uuid,
    pub content: String,
}

impl PostingInput {
    fn validated(&self) -> Result<(String, String), FieldError> {
        validate_event_title(self.title.as_deref())?;
        validate_description(self.description.as_deref())?;
        Ok((
            self.title.as_deref().unwrap_or_default().trim().to_string(),
            self.description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
        ))
    }

    fn kind_or<T>(&self, field: &'static str, default: T) -> Result<T, FieldError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.kind.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<T>()
                .map_err(|e| FieldError::new(field, e.to_string())),
            _ => Ok(default),
        }
    }
}

fn parse_item_kind(raw: &str) -> Result<CommunityItemKind, FieldError> {
    raw.trim()
        .parse::<CommunityItemKind>()
        .map_err(|e| FieldError::new("item_type", e.to_string()))
}

const fn resource_for(kind: CommunityItemKind) -> Resource {
    match kind {
        CommunityItemKind::Charitable => Resource::CharitableItem,
        CommunityItemKind::Giveaway => Resource::Giveaway,
        CommunityItemKind::HelpRequest => Resource::HelpRequest,
    }
}

const fn missing_message(kind: CommunityItemKind) -> &'static str {
    match kind {
        CommunityItemKind::Charitable => "Item not found",
        CommunityItemKind::Giveaway => "Giveaway not found",
        CommunityItemKind::HelpRequest => "Help request not found",
    }
}

/// Creator of a posting, or `None` if it does not exist.
async fn posting_owner(
    ctx: &ServiceContext,
    kind: CommunityItemKind,
    id: Uuid,
) -> ServiceResult<Option<Uuid>> {
    let store = ctx.store();
    Ok(match kind {
        CommunityItemKind::Charitable => store.charitable_item_by_id(id).await?.map(|i| i.created_by),
        CommunityItemKind::Giveaway => store.giveaway_by_id(id).await?.map(|g| g.created_by),
        CommunityItemKind::HelpRequest => store.help_request_by_id(id).await?.map(|r| r.created_by),
    })
}

fn require_resident(ctx: &ServiceContext, caller: &User, resource: Resource) -> ServiceResult<()> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        resource,
        Action::Create,
        "You must be signed in to post",
    )
}

/// Every posting on the board, newest first.
///
/// ## Errors
/// Store failures only.
#[tracing::instrument(skip(ctx))]
pub async fn community_board(ctx: &ServiceContext) -> ServiceResult<CommunityBoard> {
    let store = ctx.store();
    let (charitable_items, giveaways, help_requests) = futures::try_join!(
        store.list_charitable_items(),
        store.list_giveaways(),
        store.list_help_requests(),
    )?;
    Ok(CommunityBoard {
        charitable_items,
        giveaways,
        help_requests,
    })
}

/// ## Errors
/// `ValidationError` for bad fields or an item type other than `drive` or
/// `need`.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_charitable_item(
    ctx: &ServiceContext,
    caller: &User,
    input: PostingInput,
) -> ServiceResult<Mutation<CharitableItem>> {
    require_resident(ctx, caller, Resource::CharitableItem)?;
    let (title, description) = input.validated()?;
    let item_type = input.kind_or("item_type", CharitableItemType::Drive)?;

    let item = ctx
        .store()
        .create_charitable_item(NewCharitableItem {
            id: Uuid::now_v7(),
            title,
            description,
            item_type,
            created_by: caller.id,
        })
        .await?;

    Ok(Mutation::new(item, [View::Community]))
}

/// ## Errors
/// `ValidationError` for bad fields.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_giveaway(
    ctx: &ServiceContext,
    caller: &User,
    input: PostingInput,
) -> ServiceResult<Mutation<Giveaway>> {
    require_resident(ctx, caller, Resource::Giveaway)?;
    let (title, description) = input.validated()?;

    let giveaway = ctx
        .store()
        .create_giveaway(NewGiveaway {
            id: Uuid::now_v7(),
            title,
            description,
            created_by: caller.id,
        })
        .await?;

    Ok(Mutation::new(giveaway, [View::Community]))
}

/// ## Errors
/// `ValidationError` for bad fields or a request type other than `advice`
/// or `help`.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_help_request(
    ctx: &ServiceContext,
    caller: &User,
    input: PostingInput,
) -> ServiceResult<Mutation<HelpRequest>> {
    require_resident(ctx, caller, Resource::HelpRequest)?;
    let (title, description) = input.validated()?;
    let request_type = input.kind_or("request_type", HelpRequestType::Help)?;

    let request = ctx
        .store()
        .create_help_request(NewHelpRequest {
            id: Uuid::now_v7(),
            title,
            description,
            request_type,
            created_by: caller.id,
        })
        .await?;

    Ok(Mutation::new(request, [View::Community]))
}

/// ## Summary
/// Marks an available giveaway claimed by the caller.
///
/// ## Errors
/// - `NotFound` for unknown giveaways.
/// - `ValidationError` when the caller posted the giveaway.
/// - `Conflict` once the giveaway has been claimed.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn claim_giveaway(
    ctx: &ServiceContext,
    caller: &User,
    giveaway_id: Uuid,
) -> ServiceResult<Mutation<Giveaway>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::Giveaway,
        Action::Claim,
        "You must be signed in to claim a giveaway",
    )?;

    let giveaway = ctx
        .store()
        .giveaway_by_id(giveaway_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(missing_message(CommunityItemKind::Giveaway)))?;
    if giveaway.created_by == caller.id {
        return Err(FieldError::new("giveaway", "You cannot claim your own giveaway").into());
    }
    if giveaway.status != GiveawayStatus::Available {
        return Err(ServiceError::conflict("This giveaway has already been claimed"));
    }

    // The store re-checks availability under lock; a concurrent claim loses here.
    let claimed = ctx
        .store()
        .claim_giveaway(giveaway_id, caller.id)
        .await?
        .ok_or_else(|| ServiceError::conflict("This giveaway has already been claimed"))?;

    tracing::info!(giveaway_id = %giveaway_id, "Giveaway claimed");
    Ok(Mutation::new(claimed, [View::Community]))
}

/// ## Summary
/// Deletes a charitable item, giveaway or help request together with its
/// comments.
///
/// ## Errors
/// `NotFound` for unknown postings, `AuthorizationError` unless the caller
/// created the posting or is an administrator.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn delete_posting(
    ctx: &ServiceContext,
    caller: &User,
    kind: CommunityItemKind,
    id: Uuid,
) -> ServiceResult<Mutation<()>> {
    let owner = posting_owner(ctx, kind, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(missing_message(kind)))?;
    ctx.authorizer().require(
        &Subjects::for_user(caller).with_owner(caller, owner),
        resource_for(kind),
        Action::Delete,
        DELETE_DENIED,
    )?;

    let deleted = ctx
        .store()
        .delete_community_item(kind, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(missing_message(kind)))?;

    tracing::info!(%kind, item_id = %id, "Community posting deleted");
    if caller.is_admin && owner != caller.id {
        let details = deleted
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        ctx.audit()
            .record(
                AuditEntry::new(
                    caller.id,
                    AuditAction::Delete,
                    resource_for(kind).as_casbin_object(),
                    id,
                )
                .before(&deleted)
                .details(details),
            )
            .await;
    }

    Ok(Mutation::new((), [View::Community, View::Admin]))
}

/// ## Errors
/// See [`delete_posting`].
pub async fn delete_charitable_item(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
) -> ServiceResult<Mutation<()>> {
    delete_posting(ctx, caller, CommunityItemKind::Charitable, id).await
}

/// ## Errors
/// See [`delete_posting`].
pub async fn delete_giveaway(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
) -> ServiceResult<Mutation<()>> {
    delete_posting(ctx, caller, CommunityItemKind::Giveaway, id).await
}

/// ## Errors
/// See [`delete_posting`].
pub async fn delete_help_request(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
) -> ServiceResult<Mutation<()>> {
    delete_posting(ctx, caller, CommunityItemKind::HelpRequest, id).await
}

/// ## Errors
/// - `ValidationError` for an unknown item type or bad content.
/// - `NotFound` if the posting does not exist.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn add_community_comment(
    ctx: &ServiceContext,
    caller: &User,
    input: CommentInput,
) -> ServiceResult<Mutation<CommunityComment>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::CommunityComment,
        Action::Create,
        "You must be signed in to comment",
    )?;
    let kind = parse_item_kind(&input.item_type)?;
    validate_description_with_limit(Some(&input.content), COMMENT_MAX_LEN)?;

    posting_owner(ctx, kind, input.item_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(missing_message(kind)))?;

    let comment = ctx
        .store()
        .create_community_comment(NewCommunityComment {
            id: Uuid::now_v7(),
            item_id: input.item_id,
            item_type: kind,
            user_id: caller.id,
            content: input.content.trim().to_string(),
        })
        .await?;

    Ok(Mutation::new(comment, [View::Community]))
}

/// Comments on one posting, oldest first.
///
/// ## Errors
/// `ValidationError` for an unknown item type.
#[tracing::instrument(skip(ctx))]
pub async fn list_community_comments(
    ctx: &ServiceContext,
    item_type: &str,
    item_id: Uuid,
) -> ServiceResult<Vec<CommunityComment>> {
    let kind = parse_item_kind(item_type)?;
    Ok(ctx.store().community_comments(kind, item_id).await?)
}
