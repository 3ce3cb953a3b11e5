//! Clubs, their membership and their discussion boards.
//!
//! ## Summary
//! Any resident may start a club or join one. Posting and commenting require
//! membership of the club. Deleting a club removes its members, posts and
//! comments in one store transaction.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use neighborly_core::constants::COMMENT_MAX_LEN;
use neighborly_core::validation::{
    FieldError, validate_club_name, validate_description, validate_description_with_limit,
    validate_event_title,
};
use neighborly_db::db::enums::{AuditAction, PostType};
use neighborly_db::model::club::{
    Club, ClubMember, ClubPost, ClubPostComment, ClubSummary, NewClub, NewClubPost,
    NewClubPostComment,
};
use neighborly_db::model::user::User;
use neighborly_db::store::prelude::*;

use crate::audit::AuditEntry;
use crate::auth::{Action, Resource, Subjects};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::view::{Mutation, View};

const RESOURCE_TYPE: &str = "club";
const NOT_FOUND: &str = "Club not found";
pub const MEMBERS_ONLY: &str = "You must be a member of this club to post";

/// A club as listed for one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubListing {
    #[serde(flatten)]
    pub summary: ClubSummary,
    /// Whether the caller is a member.
    pub joined: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostThread {
    #[serde(flatten)]
    pub post: ClubPost,
    pub comments: Vec<ClubPostComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubDetail {
    #[serde(flatten)]
    pub club: Club,
    pub members: Vec<ClubMember>,
    pub is_member: bool,
    /// Newest first.
    pub posts: Vec<PostThread>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubPostInput {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Defaults to `discussion`.
    pub post_type: Option<String>,
}

fn trimmed(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_string()
}

async fn load_club(ctx: &ServiceContext, club_id: Uuid) -> ServiceResult<Club> {
    ctx.store()
        .club_by_id(club_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))
}

/// ## Errors
/// Store failures only.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn list_clubs(ctx: &ServiceContext, caller: &User) -> ServiceResult<Vec<ClubListing>> {
    let (clubs, joined) = futures::try_join!(
        ctx.store().list_clubs(),
        ctx.store().clubs_joined_by(caller.id),
    )?;
    let joined: HashSet<Uuid> = joined.into_iter().collect();

    Ok(clubs
        .into_iter()
        .map(|summary| ClubListing {
            joined: joined.contains(&summary.club.id),
            summary,
        })
        .collect())
}

/// ## Summary
/// Loads a club with its members and its posts, each with comments oldest
/// first.
///
/// ## Errors
/// `NotFound` for unknown ids.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn club_detail(
    ctx: &ServiceContext,
    caller: &User,
    club_id: Uuid,
) -> ServiceResult<ClubDetail> {
    let club = load_club(ctx, club_id).await?;
    let (members, posts) = futures::try_join!(
        ctx.store().club_members(club_id),
        ctx.store().club_posts(club_id),
    )?;

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let mut comments = ctx.store().club_post_comments(&post_ids).await?;

    let posts = posts
        .into_iter()
        .map(|post| {
            let (mine, rest): (Vec<ClubPostComment>, Vec<ClubPostComment>) =
                std::mem::take(&mut comments)
                    .into_iter()
                    .partition(|c| c.post_id == post.id);
            comments = rest;
            PostThread {
                post,
                comments: mine,
            }
        })
        .collect();

    Ok(ClubDetail {
        is_member: members.iter().any(|m| m.user_id == caller.id),
        club,
        members,
        posts,
    })
}

/// ## Errors
/// `ValidationError` for a bad name or description.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_club(
    ctx: &ServiceContext,
    caller: &User,
    input: ClubInput,
) -> ServiceResult<Mutation<Club>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::Club,
        Action::Create,
        "You must be signed in to create a club",
    )?;
    validate_club_name(input.name.as_deref())?;
    validate_description(input.description.as_deref())?;

    let club = ctx
        .store()
        .create_club(NewClub {
            id: Uuid::now_v7(),
            name: trimmed(input.name.as_deref()),
            description: trimmed(input.description.as_deref()),
            created_by: caller.id,
        })
        .await?;

    tracing::info!(club_id = %club.id, "Club created");
    Ok(Mutation::new(club, [View::Clubs]))
}

/// ## Errors
/// `NotFound` for unknown ids, `Conflict` if the caller already belongs.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn join_club(
    ctx: &ServiceContext,
    caller: &User,
    club_id: Uuid,
) -> ServiceResult<Mutation<()>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::Club,
        Action::Join,
        "You must be signed in to join a club",
    )?;
    load_club(ctx, club_id).await?;

    if !ctx.store().add_club_member(club_id, caller.id).await? {
        return Err(ServiceError::conflict("You are already a member of this club"));
    }

    Ok(Mutation::new((), [View::Club(club_id), View::Clubs]))
}

/// ## Errors
/// `NotFound` for unknown ids, `AuthorizationError` if the caller is not a
/// member.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn leave_club(
    ctx: &ServiceContext,
    caller: &User,
    club_id: Uuid,
) -> ServiceResult<Mutation<()>> {
    load_club(ctx, club_id).await?;
    let is_member = ctx.store().is_club_member(club_id, caller.id).await?;
    ctx.authorizer().require(
        &Subjects::for_user(caller).with_membership(is_member),
        Resource::Club,
        Action::Leave,
        "You are not a member of this club",
    )?;

    ctx.store().remove_club_member(club_id, caller.id).await?;

    Ok(Mutation::new((), [View::Club(club_id), View::Clubs]))
}

/// ## Summary
/// Deletes a club together with its members, posts and post comments.
///
/// ## Errors
/// `NotFound` for unknown ids, `AuthorizationError` unless the caller created
/// the club or is an administrator.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn delete_club(
    ctx: &ServiceContext,
    caller: &User,
    club_id: Uuid,
) -> ServiceResult<Mutation<()>> {
    let club = load_club(ctx, club_id).await?;
    ctx.authorizer().require(
        &Subjects::for_user(caller).with_owner(caller, club.created_by),
        Resource::Club,
        Action::Delete,
        "Only club creator or admin can delete this club",
    )?;

    ctx.store()
        .delete_club(club_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    tracing::info!(club_id = %club_id, "Club deleted");
    if caller.is_admin && club.created_by != caller.id {
        ctx.audit()
            .record(
                AuditEntry::new(caller.id, AuditAction::Delete, RESOURCE_TYPE, club_id)
                    .before(&club)
                    .details(club.name.clone()),
            )
            .await;
    }

    Ok(Mutation::new((), [View::Clubs, View::Club(club_id), View::Admin]))
}

/// ## Errors
/// - `NotFound` for unknown clubs.
/// - `AuthorizationError` if the caller is not a member.
/// - `ValidationError` for bad fields or an unknown post type.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_club_post(
    ctx: &ServiceContext,
    caller: &User,
    club_id: Uuid,
    input: ClubPostInput,
) -> ServiceResult<Mutation<ClubPost>> {
    load_club(ctx, club_id).await?;
    let is_member = ctx.store().is_club_member(club_id, caller.id).await?;
    ctx.authorizer().require(
        &Subjects::for_user(caller).with_membership(is_member),
        Resource::ClubPost,
        Action::Create,
        MEMBERS_ONLY,
    )?;

    validate_event_title(input.title.as_deref())?;
    validate_description(input.description.as_deref())?;
    let post_type = match input.post_type.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<PostType>()
            .map_err(|e| FieldError::new("post_type", e.to_string()))?,
        _ => PostType::Discussion,
    };

    let post = ctx
        .store()
        .create_club_post(NewClubPost {
            id: Uuid::now_v7(),
            club_id,
            user_id: caller.id,
            title: trimmed(input.title.as_deref()),
            description: trimmed(input.description.as_deref()),
            post_type,
        })
        .await?;

    Ok(Mutation::new(post, [View::Club(club_id)]))
}

/// ## Errors
/// - `NotFound` for unknown posts.
/// - `AuthorizationError` if the caller is not a member of the post's club.
/// - `ValidationError` for empty or oversized content.
#[tracing::instrument(skip(ctx, caller, content), fields(caller = %caller.id))]
pub async fn add_club_post_comment(
    ctx: &ServiceContext,
    caller: &User,
    post_id: Uuid,
    content: &str,
) -> ServiceResult<Mutation<ClubPostComment>> {
    let post = ctx
        .store()
        .club_post_by_id(post_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Post not found"))?;
    let is_member = ctx.store().is_club_member(post.club_id, caller.id).await?;
    ctx.authorizer().require(
        &Subjects::for_user(caller).with_membership(is_member),
        Resource::ClubPostComment,
        Action::Create,
        "You must be a member of this club to comment",
    )?;

    validate_description_with_limit(Some(content), COMMENT_MAX_LEN)?;

    let comment = ctx
        .store()
        .create_club_post_comment(NewClubPostComment {
            id: Uuid::now_v7(),
            post_id,
            user_id: caller.id,
            content: content.trim().to_string(),
        })
        .await?;

    Ok(Mutation::new(comment, [View::Clubs, View::Club(post.club_id)]))
}
