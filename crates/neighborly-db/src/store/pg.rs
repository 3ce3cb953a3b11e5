//! `PostgreSQL` adapter for the store ports.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::OptionalExtension;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use uuid::Uuid;

use super::{
    AllowedEmailStore, AuditStore, ClaimOutcome, ClubStore, CommunityStore, EventStore,
    LoginStore, ReleaseOutcome, ResidenceCounts, ResidenceRemoval, ResidenceStore, UserStore,
};
use crate::db::DbProvider;
use crate::db::connection::DbPool;
use crate::db::enums::CommunityItemKind;
use crate::db::query;
use crate::db::transaction::with_transaction;
use crate::error::{DbError, DbResult};
use crate::model::{
    allowed_email::{AllowedEmail, NewAllowedEmail},
    audit::{AuditLogEntry, NewAuditLogEntry},
    club::{
        Club, ClubMember, ClubPost, ClubPostComment, ClubSummary, NewClub, NewClubMember,
        NewClubPost, NewClubPostComment,
    },
    community::{
        CharitableItem, CommunityComment, Giveaway, HelpRequest, NewCharitableItem,
        NewCommunityComment, NewGiveaway, NewHelpRequest,
    },
    event::{CalendarEvent, EventChangeset, NewCalendarEvent},
    login::{LoginCode, Session},
    residence::{
        DirectoryFilter, NewResidence, Residence, ResidenceChangeset, merge_details,
    },
    user::{NewUser, User},
};

/// Store backed by a bb8 pool of async `PostgreSQL` connections.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::user::get_user(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::user::by_email(email)
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    #[tracing::instrument(skip(self, new_user), fields(user_id = %new_user.id))]
    async fn create_user(&self, new_user: NewUser) -> DbResult<User> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::user::create_user(&mut conn, &new_user).await?)
    }

    #[tracing::instrument(skip(self, phone))]
    async fn update_user_phone(&self, id: Uuid, phone: Option<String>) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::user::set_phone(&mut conn, id, phone).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn grant_admin(&self, email: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::user::grant_admin(&mut conn, email).await?)
    }

    async fn count_users(&self) -> DbResult<i64> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::user::count(&mut conn).await?)
    }
}

#[async_trait]
impl ResidenceStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn residence_by_id(&self, id: Uuid) -> DbResult<Option<Residence>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::residence::get_residence(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_residences(&self, filter: &DirectoryFilter) -> DbResult<Vec<Residence>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::residence::directory(filter).load(&mut conn).await?)
    }

    #[tracing::instrument(skip(self, new_residence), fields(address = %new_residence.address))]
    async fn create_residence(&self, new_residence: NewResidence) -> DbResult<Residence> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::residence::create_residence(&mut conn, &new_residence).await?)
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update_residence(
        &self,
        id: Uuid,
        changes: ResidenceChangeset,
    ) -> DbResult<Option<Residence>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::residence::update_residence(&mut conn, id, &changes).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_residence(&self, id: Uuid) -> DbResult<Option<ResidenceRemoval>> {
        let mut conn = self.pool.get_connection().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                if query::residence::lock_residence(tx, id).await?.is_none() {
                    return Ok(None);
                }
                let released_user_ids = query::user::unlink_residence(tx, id).await?;
                let residence = query::residence::delete_residence(tx, id).await?;
                Ok(residence.map(|residence| ResidenceRemoval {
                    residence,
                    released_user_ids,
                }))
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, details))]
    async fn claim_residence(
        &self,
        user_id: Uuid,
        residence_id: Uuid,
        details: serde_json::Value,
    ) -> DbResult<ClaimOutcome> {
        let mut conn = self.pool.get_connection().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                // Lock order is user then residence.
                let user = query::user::lock_user(tx, user_id)
                    .await?
                    .ok_or(DbError::DatabaseError(diesel::result::Error::NotFound))?;
                if let Some(linked) = user.residence_id {
                    return Ok(ClaimOutcome::IdentityAlreadyLinked {
                        residence_id: linked,
                    });
                }

                let Some(before) = query::residence::lock_residence(tx, residence_id).await?
                else {
                    return Ok(ClaimOutcome::ResidenceMissing);
                };
                let holders = query::user::count_linked_to(tx, residence_id).await?;
                if before.is_claimed || holders > 0 {
                    return Ok(ClaimOutcome::ResidenceTaken);
                }

                let merged = merge_details(&before.additional_details, details);
                let after = query::residence::set_claimed(tx, residence_id, true, &merged).await?;
                let user = query::user::link_residence(tx, user_id, residence_id).await?;

                Ok(ClaimOutcome::Claimed {
                    user,
                    before,
                    after,
                })
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn release_residence(&self, residence_id: Uuid) -> DbResult<Option<ReleaseOutcome>> {
        let mut conn = self.pool.get_connection().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                let Some(before) = query::residence::lock_residence(tx, residence_id).await?
                else {
                    return Ok(None);
                };
                let released_user_ids = query::user::unlink_residence(tx, residence_id).await?;
                let after = query::residence::set_claimed(
                    tx,
                    residence_id,
                    false,
                    &before.additional_details,
                )
                .await?;

                Ok(Some(ReleaseOutcome {
                    before,
                    after,
                    released_user_ids,
                }))
            }
            .scope_boxed()
        })
        .await
    }

    async fn count_residences(&self) -> DbResult<ResidenceCounts> {
        let mut conn = self.pool.get_connection().await?;
        let (total, claimed) = query::residence::count(&mut conn).await?;
        Ok(ResidenceCounts { total, claimed })
    }
}

#[async_trait]
impl AllowedEmailStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn allowed_email_by_email(&self, email: &str) -> DbResult<Option<AllowedEmail>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::allowed_email::by_email(email)
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    async fn list_allowed_emails(&self) -> DbResult<Vec<AllowedEmail>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::allowed_email::all().load(&mut conn).await?)
    }

    #[tracing::instrument(skip(self, entry), fields(email = %entry.email))]
    async fn insert_allowed_email(&self, entry: NewAllowedEmail) -> DbResult<AllowedEmail> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::allowed_email::insert(&mut conn, &entry).await?)
    }

    #[tracing::instrument(skip(self, entries), fields(count = entries.len()))]
    async fn insert_allowed_emails(
        &self,
        entries: Vec<NewAllowedEmail>,
    ) -> DbResult<Vec<AllowedEmail>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::allowed_email::insert_skipping_existing(&mut conn, &entries).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_allowed_email(&self, id: Uuid) -> DbResult<Option<AllowedEmail>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::allowed_email::delete(&mut conn, id).await?)
    }
}

#[async_trait]
impl EventStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn list_events(&self, from: Option<NaiveDate>) -> DbResult<Vec<CalendarEvent>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::upcoming(from).load(&mut conn).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn event_by_id(&self, id: Uuid) -> DbResult<Option<CalendarEvent>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::by_id(id)
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    #[tracing::instrument(skip(self, event), fields(event_id = %event.id))]
    async fn create_event(&self, event: NewCalendarEvent) -> DbResult<CalendarEvent> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::create_event(&mut conn, &event).await?)
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update_event(
        &self,
        id: Uuid,
        changes: EventChangeset,
    ) -> DbResult<Option<CalendarEvent>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::update_event(&mut conn, id, &changes).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_event(&self, id: Uuid) -> DbResult<Option<CalendarEvent>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::delete_event(&mut conn, id).await?)
    }

    async fn count_events(&self) -> DbResult<i64> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::event::count(&mut conn).await?)
    }
}

#[async_trait]
impl ClubStore for PgStore {
    async fn list_clubs(&self) -> DbResult<Vec<ClubSummary>> {
        let mut conn = self.pool.get_connection().await?;
        let clubs: Vec<Club> = query::club::all().load(&mut conn).await?;
        let counts: std::collections::HashMap<Uuid, i64> = query::club::member_counts(&mut conn)
            .await?
            .into_iter()
            .collect();

        Ok(clubs
            .into_iter()
            .map(|club| ClubSummary {
                member_count: counts.get(&club.id).copied().unwrap_or(0),
                club,
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn club_by_id(&self, id: Uuid) -> DbResult<Option<Club>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::get_club(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self, club), fields(club_id = %club.id))]
    async fn create_club(&self, club: NewClub) -> DbResult<Club> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::create_club(&mut conn, &club).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_club(&self, id: Uuid) -> DbResult<Option<Club>> {
        let mut conn = self.pool.get_connection().await?;

        with_transaction(&mut conn, move |tx| {
            async move { Ok(query::club::delete_club_cascade(tx, id).await?) }.scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn add_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        let inserted =
            query::club::add_member(&mut conn, &NewClubMember { club_id, user_id }).await?;
        Ok(inserted > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn remove_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::remove_member(&mut conn, club_id, user_id).await? > 0)
    }

    async fn is_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::is_member(&mut conn, club_id, user_id).await?)
    }

    async fn club_members(&self, club_id: Uuid) -> DbResult<Vec<ClubMember>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::members_of(&mut conn, club_id).await?)
    }

    async fn clubs_joined_by(&self, user_id: Uuid) -> DbResult<Vec<Uuid>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::clubs_joined_by(&mut conn, user_id).await?)
    }

    #[tracing::instrument(skip(self, post), fields(club_id = %post.club_id))]
    async fn create_club_post(&self, post: NewClubPost) -> DbResult<ClubPost> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::create_post(&mut conn, &post).await?)
    }

    async fn club_post_by_id(&self, id: Uuid) -> DbResult<Option<ClubPost>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::get_post(&mut conn, id).await?)
    }

    async fn club_posts(&self, club_id: Uuid) -> DbResult<Vec<ClubPost>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::posts_of(club_id).load(&mut conn).await?)
    }

    #[tracing::instrument(skip(self, comment), fields(post_id = %comment.post_id))]
    async fn create_club_post_comment(
        &self,
        comment: NewClubPostComment,
    ) -> DbResult<ClubPostComment> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::create_comment(&mut conn, &comment).await?)
    }

    async fn club_post_comments(&self, post_ids: &[Uuid]) -> DbResult<Vec<ClubPostComment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::comments_on(post_ids).load(&mut conn).await?)
    }

    async fn count_clubs(&self) -> DbResult<i64> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::club::count(&mut conn).await?)
    }
}

#[async_trait]
impl CommunityStore for PgStore {
    async fn list_charitable_items(&self) -> DbResult<Vec<CharitableItem>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::list_charitable(&mut conn).await?)
    }

    async fn charitable_item_by_id(&self, id: Uuid) -> DbResult<Option<CharitableItem>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::get_charitable(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self, item), fields(item_id = %item.id))]
    async fn create_charitable_item(&self, item: NewCharitableItem) -> DbResult<CharitableItem> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::create_charitable(&mut conn, &item).await?)
    }

    async fn list_giveaways(&self) -> DbResult<Vec<Giveaway>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::list_giveaways(&mut conn).await?)
    }

    async fn giveaway_by_id(&self, id: Uuid) -> DbResult<Option<Giveaway>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::get_giveaway(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self, giveaway), fields(giveaway_id = %giveaway.id))]
    async fn create_giveaway(&self, giveaway: NewGiveaway) -> DbResult<Giveaway> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::create_giveaway(&mut conn, &giveaway).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn claim_giveaway(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<Giveaway>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::claim_giveaway(&mut conn, id, user_id).await?)
    }

    async fn list_help_requests(&self) -> DbResult<Vec<HelpRequest>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::list_help_requests(&mut conn).await?)
    }

    async fn help_request_by_id(&self, id: Uuid) -> DbResult<Option<HelpRequest>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::get_help_request(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    async fn create_help_request(&self, request: NewHelpRequest) -> DbResult<HelpRequest> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::create_help_request(&mut conn, &request).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_community_item(
        &self,
        kind: CommunityItemKind,
        id: Uuid,
    ) -> DbResult<Option<serde_json::Value>> {
        let mut conn = self.pool.get_connection().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                query::community::delete_comments_on(tx, kind, id).await?;
                Ok(query::community::delete_item(tx, kind, id).await?)
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, comment), fields(item_id = %comment.item_id))]
    async fn create_community_comment(
        &self,
        comment: NewCommunityComment,
    ) -> DbResult<CommunityComment> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::create_comment(&mut conn, &comment).await?)
    }

    async fn community_comments(
        &self,
        kind: CommunityItemKind,
        item_id: Uuid,
    ) -> DbResult<Vec<CommunityComment>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::comments_on(kind, item_id)
            .load(&mut conn)
            .await?)
    }

    async fn count_giveaways(&self) -> DbResult<i64> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::count_giveaways(&mut conn).await?)
    }

    async fn count_help_requests(&self) -> DbResult<i64> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::community::count_help_requests(&mut conn).await?)
    }
}

#[async_trait]
impl AuditStore for PgStore {
    #[tracing::instrument(skip(self, entry), fields(action = %entry.action, resource = %entry.resource_type))]
    async fn append_audit(&self, entry: NewAuditLogEntry) -> DbResult<()> {
        let mut conn = self.pool.get_connection().await?;
        query::audit::append(&mut conn, &entry).await?;
        Ok(())
    }

    async fn recent_audit(&self, limit: i64) -> DbResult<Vec<AuditLogEntry>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::audit::recent(limit).load(&mut conn).await?)
    }
}

#[async_trait]
impl LoginStore for PgStore {
    #[tracing::instrument(skip(self, code), fields(email = %code.email))]
    async fn put_login_code(&self, code: LoginCode) -> DbResult<()> {
        let mut conn = self.pool.get_connection().await?;
        query::login::put_code(&mut conn, &code).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, code_hash))]
    async fn consume_login_code(
        &self,
        email: &str,
        code_hash: &str,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> DbResult<Option<LoginCode>> {
        let mut conn = self.pool.get_connection().await?;
        let email = email.to_string();
        let code_hash = code_hash.to_string();

        with_transaction(&mut conn, move |tx| {
            async move {
                if let Some(code) =
                    query::login::consume_code(tx, &email, &code_hash, now, max_attempts).await?
                {
                    return Ok(Some(code));
                }
                let attempts =
                    query::login::record_failed_attempt(tx, &email, now, max_attempts).await?;
                tracing::debug!(?attempts, "Login code attempt failed");
                Ok(None)
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn create_session(&self, session: Session) -> DbResult<Session> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::login::create_session(&mut conn, &session).await?)
    }

    #[tracing::instrument(skip(self, token_hash))]
    async fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::login::session_user(&mut conn, token_hash, now).await?)
    }

    #[tracing::instrument(skip(self, token_hash))]
    async fn delete_session(&self, token_hash: &str) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::login::delete_session(&mut conn, token_hash).await? > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let mut conn = self.pool.get_connection().await?;
        Ok(query::login::purge_expired(&mut conn, now).await?)
    }
}
