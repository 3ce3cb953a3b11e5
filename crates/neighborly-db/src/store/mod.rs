//! Persistence ports.
//!
//! The service layer talks to storage only through these traits. [`PgStore`]
//! is the `PostgreSQL` adapter; `MemoryStore` (feature `test-support`) keeps
//! everything in process for tests. Each method is a single atomic unit:
//! multi-row transitions such as claiming a residence are one method so the
//! adapter can run them inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::enums::CommunityItemKind;
use crate::error::DbResult;
use crate::model::{
    allowed_email::{AllowedEmail, NewAllowedEmail},
    audit::{AuditLogEntry, NewAuditLogEntry},
    club::{
        Club, ClubMember, ClubPost, ClubPostComment, ClubSummary, NewClub, NewClubPost,
        NewClubPostComment,
    },
    community::{
        CharitableItem, CommunityComment, Giveaway, HelpRequest, NewCharitableItem,
        NewCommunityComment, NewGiveaway, NewHelpRequest,
    },
    event::{CalendarEvent, EventChangeset, NewCalendarEvent},
    login::{LoginCode, Session},
    residence::{DirectoryFilter, NewResidence, Residence, ResidenceChangeset},
    user::{NewUser, User},
};

#[cfg(feature = "test-support")]
pub mod memory;
pub mod pg;

#[cfg(feature = "test-support")]
pub use memory::MemoryStore;
pub use pg::PgStore;

/// The store traits, for calling port methods through `dyn Store`.
pub mod prelude {
    pub use super::{
        AllowedEmailStore, AuditStore, ClubStore, CommunityStore, EventStore, LoginStore,
        ResidenceStore, Store, UserStore,
    };
}

/// Result of an attempt to link a user to a residence.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed {
        user: User,
        /// Residence as it was before the claim.
        before: Residence,
        after: Residence,
    },
    /// The user is already linked to a residence (possibly this one).
    IdentityAlreadyLinked { residence_id: Uuid },
    /// Another user holds the residence.
    ResidenceTaken,
    ResidenceMissing,
}

/// Result of an administrator releasing a residence.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub before: Residence,
    pub after: Residence,
    /// Users whose residence link was cleared.
    pub released_user_ids: Vec<Uuid>,
}

/// Result of deleting a residence.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidenceRemoval {
    pub residence: Residence,
    pub released_user_ids: Vec<Uuid>,
}

/// Residence totals for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResidenceCounts {
    pub total: i64,
    pub claimed: i64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_by_id(&self, id: Uuid) -> DbResult<Option<User>>;

    /// Looks up a user by already-normalised email.
    async fn user_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// ## Errors
    /// Returns [`DbError::Conflict`](crate::error::DbError::Conflict) when the
    /// email is already registered.
    async fn create_user(&self, new_user: NewUser) -> DbResult<User>;

    async fn update_user_phone(&self, id: Uuid, phone: Option<String>) -> DbResult<Option<User>>;

    /// Promotes an existing user to administrator. `None` if there is no such
    /// user or nothing changed.
    async fn grant_admin(&self, email: &str) -> DbResult<Option<User>>;

    async fn count_users(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait ResidenceStore: Send + Sync {
    async fn residence_by_id(&self, id: Uuid) -> DbResult<Option<Residence>>;

    /// Lists residences ordered by street then address.
    async fn list_residences(&self, filter: &DirectoryFilter) -> DbResult<Vec<Residence>>;

    async fn create_residence(&self, new_residence: NewResidence) -> DbResult<Residence>;

    async fn update_residence(
        &self,
        id: Uuid,
        changes: ResidenceChangeset,
    ) -> DbResult<Option<Residence>>;

    /// Deletes the residence and unlinks its residents atomically.
    async fn delete_residence(&self, id: Uuid) -> DbResult<Option<ResidenceRemoval>>;

    /// Atomically links `user_id` to `residence_id`, sets the claimed flag and
    /// merges `details` into the residence's additional details. Both rows are
    /// locked for the duration.
    async fn claim_residence(
        &self,
        user_id: Uuid,
        residence_id: Uuid,
        details: serde_json::Value,
    ) -> DbResult<ClaimOutcome>;

    /// Atomically unlinks every user from the residence and clears its
    /// claimed flag.
    async fn release_residence(&self, residence_id: Uuid) -> DbResult<Option<ReleaseOutcome>>;

    async fn count_residences(&self) -> DbResult<ResidenceCounts>;
}

#[async_trait]
pub trait AllowedEmailStore: Send + Sync {
    /// Looks up a whitelist entry by already-normalised email.
    async fn allowed_email_by_email(&self, email: &str) -> DbResult<Option<AllowedEmail>>;

    async fn list_allowed_emails(&self) -> DbResult<Vec<AllowedEmail>>;

    /// ## Errors
    /// Returns [`DbError::Conflict`](crate::error::DbError::Conflict) for a
    /// duplicate email or an unknown residence.
    async fn insert_allowed_email(&self, entry: NewAllowedEmail) -> DbResult<AllowedEmail>;

    /// Inserts all entries, skipping emails already present. Returns the rows
    /// actually inserted.
    async fn insert_allowed_emails(
        &self,
        entries: Vec<NewAllowedEmail>,
    ) -> DbResult<Vec<AllowedEmail>>;

    async fn delete_allowed_email(&self, id: Uuid) -> DbResult<Option<AllowedEmail>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Lists events ordered by date and time, optionally from a start date.
    async fn list_events(&self, from: Option<NaiveDate>) -> DbResult<Vec<CalendarEvent>>;

    async fn event_by_id(&self, id: Uuid) -> DbResult<Option<CalendarEvent>>;

    async fn create_event(&self, event: NewCalendarEvent) -> DbResult<CalendarEvent>;

    async fn update_event(
        &self,
        id: Uuid,
        changes: EventChangeset,
    ) -> DbResult<Option<CalendarEvent>>;

    async fn delete_event(&self, id: Uuid) -> DbResult<Option<CalendarEvent>>;

    async fn count_events(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait ClubStore: Send + Sync {
    /// Lists clubs by name with member counts.
    async fn list_clubs(&self) -> DbResult<Vec<ClubSummary>>;

    async fn club_by_id(&self, id: Uuid) -> DbResult<Option<Club>>;

    async fn create_club(&self, club: NewClub) -> DbResult<Club>;

    /// Deletes the club with its members, posts and post comments atomically.
    async fn delete_club(&self, id: Uuid) -> DbResult<Option<Club>>;

    /// Returns `false` if the user was already a member.
    async fn add_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool>;

    /// Returns `false` if the user was not a member.
    async fn remove_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool>;

    async fn is_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool>;

    async fn club_members(&self, club_id: Uuid) -> DbResult<Vec<ClubMember>>;

    async fn clubs_joined_by(&self, user_id: Uuid) -> DbResult<Vec<Uuid>>;

    async fn create_club_post(&self, post: NewClubPost) -> DbResult<ClubPost>;

    async fn club_post_by_id(&self, id: Uuid) -> DbResult<Option<ClubPost>>;

    /// Posts of a club, newest first.
    async fn club_posts(&self, club_id: Uuid) -> DbResult<Vec<ClubPost>>;

    async fn create_club_post_comment(
        &self,
        comment: NewClubPostComment,
    ) -> DbResult<ClubPostComment>;

    /// Comments on any of the given posts, oldest first.
    async fn club_post_comments(&self, post_ids: &[Uuid]) -> DbResult<Vec<ClubPostComment>>;

    async fn count_clubs(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn list_charitable_items(&self) -> DbResult<Vec<CharitableItem>>;
    async fn charitable_item_by_id(&self, id: Uuid) -> DbResult<Option<CharitableItem>>;
    async fn create_charitable_item(&self, item: NewCharitableItem) -> DbResult<CharitableItem>;

    async fn list_giveaways(&self) -> DbResult<Vec<Giveaway>>;
    async fn giveaway_by_id(&self, id: Uuid) -> DbResult<Option<Giveaway>>;
    async fn create_giveaway(&self, giveaway: NewGiveaway) -> DbResult<Giveaway>;

    /// Marks an available giveaway claimed by `user_id`. Returns `None` if the
    /// giveaway does not exist or is no longer available.
    async fn claim_giveaway(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<Giveaway>>;

    async fn list_help_requests(&self) -> DbResult<Vec<HelpRequest>>;
    async fn help_request_by_id(&self, id: Uuid) -> DbResult<Option<HelpRequest>>;
    async fn create_help_request(&self, request: NewHelpRequest) -> DbResult<HelpRequest>;

    /// Deletes a posting of the given kind together with its comments.
    /// Returns the deleted row as JSON, or `None` if it did not exist.
    async fn delete_community_item(
        &self,
        kind: CommunityItemKind,
        id: Uuid,
    ) -> DbResult<Option<serde_json::Value>>;

    async fn create_community_comment(
        &self,
        comment: NewCommunityComment,
    ) -> DbResult<CommunityComment>;

    /// Comments on one posting, oldest first.
    async fn community_comments(
        &self,
        kind: CommunityItemKind,
        item_id: Uuid,
    ) -> DbResult<Vec<CommunityComment>>;

    async fn count_giveaways(&self) -> DbResult<i64>;
    async fn count_help_requests(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, entry: NewAuditLogEntry) -> DbResult<()>;

    /// Most recent entries first.
    async fn recent_audit(&self, limit: i64) -> DbResult<Vec<AuditLogEntry>>;
}

#[async_trait]
pub trait LoginStore: Send + Sync {
    /// Stores a code for the email, replacing any outstanding one.
    async fn put_login_code(&self, code: LoginCode) -> DbResult<()>;

    /// Deletes and returns the matching unexpired code in one step, so a code
    /// can be redeemed at most once.
    ///
    /// A mismatch counts as a failed attempt against the outstanding code for
    /// `email`; once `max_attempts` failures are recorded the code is deleted
    /// and even the right code is refused.
    async fn consume_login_code(
        &self,
        email: &str,
        code_hash: &str,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> DbResult<Option<LoginCode>>;

    async fn create_session(&self, session: Session) -> DbResult<Session>;

    /// Returns the user owning an unexpired session.
    async fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> DbResult<Option<User>>;

    async fn delete_session(&self, token_hash: &str) -> DbResult<bool>;

    /// Removes expired codes and sessions. Returns how many rows went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<usize>;
}

/// Everything the service layer needs from storage.
pub trait Store:
    UserStore
    + ResidenceStore
    + AllowedEmailStore
    + EventStore
    + ClubStore
    + CommunityStore
    + AuditStore
    + LoginStore
{
}

impl<T> Store for T where
    T: UserStore
        + ResidenceStore
        + AllowedEmailStore
        + EventStore
        + ClubStore
        + CommunityStore
        + AuditStore
        + LoginStore
{
}
