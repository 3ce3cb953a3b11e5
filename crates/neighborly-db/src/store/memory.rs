//! In-process store for tests.
//!
//! All state sits behind one mutex, so every method is atomic the same way a
//! transaction is in [`PgStore`](super::PgStore). Constraint behaviour
//! (unique emails, one user per residence, cascades) mirrors the migrations.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{
    AllowedEmailStore, AuditStore, ClaimOutcome, ClubStore, CommunityStore, EventStore,
    LoginStore, ReleaseOutcome, ResidenceCounts, ResidenceRemoval, ResidenceStore, UserStore,
};
use crate::db::enums::{CommunityItemKind, GiveawayStatus};
use crate::error::{DbError, DbResult};
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
    residence::{DirectoryFilter, NewResidence, Residence, ResidenceChangeset, merge_details},
    user::{NewUser, User},
};

#[derive(Default)]
struct State {
    users: BTreeMap<Uuid, User>,
    residences: BTreeMap<Uuid, Residence>,
    allowed_emails: BTreeMap<Uuid, AllowedEmail>,
    events: BTreeMap<Uuid, CalendarEvent>,
    clubs: BTreeMap<Uuid, Club>,
    club_members: Vec<ClubMember>,
    club_posts: BTreeMap<Uuid, ClubPost>,
    club_post_comments: Vec<ClubPostComment>,
    charitable_items: BTreeMap<Uuid, CharitableItem>,
    giveaways: BTreeMap<Uuid, Giveaway>,
    help_requests: BTreeMap<Uuid, HelpRequest>,
    community_comments: Vec<CommunityComment>,
    audit_logs: Vec<AuditLogEntry>,
    login_codes: HashMap<String, LoginCode>,
    sessions: HashMap<String, Session>,
    /// Monotonic clock so rows created in one test never tie on timestamps.
    ticks: i64,
}

impl State {
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc::now() + chrono::Duration::microseconds(self.ticks)
    }

    fn unlink_residence(&mut self, residence_id: Uuid, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut released = Vec::new();
        for user in self.users.values_mut() {
            if user.residence_id == Some(residence_id) {
                user.residence_id = None;
                user.updated_at = now;
                released.push(user.id);
            }
        }
        released
    }
}

/// Store keeping all rows in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    audit_fails: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent audit append fail, to exercise best-effort
    /// audit handling.
    pub fn fail_audit_writes(&self, fail: bool) {
        self.audit_fails
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Locks the state and recovers from poisoning.
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.state.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

fn conflict(message: &str) -> DbError {
    DbError::Conflict(message.to_string())
}

fn newest_first<T: Clone>(rows: &BTreeMap<Uuid, T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.values().cloned().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> DbResult<User> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(conflict("duplicate key value violates unique constraint \"users_email_uniq\""));
        }
        let now = state.now();
        let user = User {
            id: new_user.id,
            email: new_user.email,
            phone_number: None,
            is_admin: new_user.is_admin,
            residence_id: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_phone(&self, id: Uuid, phone: Option<String>) -> DbResult<Option<User>> {
        let mut state = self.lock();
        let now = state.now();
        Ok(state.users.get_mut(&id).map(|user| {
            user.phone_number = phone;
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn grant_admin(&self, email: &str) -> DbResult<Option<User>> {
        let mut state = self.lock();
        let now = state.now();
        Ok(state
            .users
            .values_mut()
            .find(|user| user.email == email && !user.is_admin)
            .map(|user| {
                user.is_admin = true;
                user.updated_at = now;
                user.clone()
            }))
    }

    async fn count_users(&self) -> DbResult<i64> {
        Ok(i64::try_from(self.lock().users.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl ResidenceStore for MemoryStore {
    async fn residence_by_id(&self, id: Uuid) -> DbResult<Option<Residence>> {
        Ok(self.lock().residences.get(&id).cloned())
    }

    async fn list_residences(&self, filter: &DirectoryFilter) -> DbResult<Vec<Residence>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut rows: Vec<Residence> = self
            .lock()
            .residences
            .values()
            .filter(|r| filter.street.is_none_or(|street| r.street_name == street))
            .filter(|r| {
                search.as_ref().is_none_or(|needle| {
                    r.address.to_lowercase().contains(needle)
                        || r.last_name.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.street_name.as_str(), a.address.as_str())
                .cmp(&(b.street_name.as_str(), b.address.as_str()))
        });
        Ok(rows)
    }

    async fn create_residence(&self, new_residence: NewResidence) -> DbResult<Residence> {
        let mut state = self.lock();
        let address = new_residence.address.to_lowercase();
        if state
            .residences
            .values()
            .any(|r| r.address.to_lowercase() == address)
        {
            return Err(conflict("duplicate key value violates unique constraint \"residences_address_uniq\""));
        }
        let now = state.now();
        let residence = Residence {
            id: new_residence.id,
            street_name: new_residence.street_name,
            address: new_residence.address,
            last_name: new_residence.last_name,
            phone_number: new_residence.phone_number,
            is_claimed: false,
            additional_details: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        };
        state.residences.insert(residence.id, residence.clone());
        Ok(residence)
    }

    async fn update_residence(
        &self,
        id: Uuid,
        changes: ResidenceChangeset,
    ) -> DbResult<Option<Residence>> {
        let mut state = self.lock();
        let Some(residence) = state.residences.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(street) = changes.street_name {
            residence.street_name = street;
        }
        if let Some(address) = changes.address {
            residence.address = address;
        }
        if let Some(last_name) = changes.last_name {
            residence.last_name = last_name;
        }
        if let Some(phone) = changes.phone_number {
            residence.phone_number = phone;
        }
        if let Some(updated_at) = changes.updated_at {
            residence.updated_at = updated_at;
        }
        Ok(Some(residence.clone()))
    }

    async fn delete_residence(&self, id: Uuid) -> DbResult<Option<ResidenceRemoval>> {
        let mut state = self.lock();
        if !state.residences.contains_key(&id) {
            return Ok(None);
        }
        let now = state.now();
        let released_user_ids = state.unlink_residence(id, now);
        for entry in state.allowed_emails.values_mut() {
            if entry.residence_id == Some(id) {
                entry.residence_id = None;
            }
        }
        Ok(state.residences.remove(&id).map(|residence| ResidenceRemoval {
            residence,
            released_user_ids,
        }))
    }

    async fn claim_residence(
        &self,
        user_id: Uuid,
        residence_id: Uuid,
        details: serde_json::Value,
    ) -> DbResult<ClaimOutcome> {
        let mut state = self.lock();
        let now = state.now();

        let Some(user) = state.users.get(&user_id) else {
            return Err(DbError::DatabaseError(diesel::result::Error::NotFound));
        };
        if let Some(linked) = user.residence_id {
            return Ok(ClaimOutcome::IdentityAlreadyLinked {
                residence_id: linked,
            });
        }

        let Some(before) = state.residences.get(&residence_id).cloned() else {
            return Ok(ClaimOutcome::ResidenceMissing);
        };
        let held = state
            .users
            .values()
            .any(|u| u.residence_id == Some(residence_id));
        if before.is_claimed || held {
            return Ok(ClaimOutcome::ResidenceTaken);
        }

        let mut after = before.clone();
        after.is_claimed = true;
        after.additional_details = merge_details(&before.additional_details, details);
        after.updated_at = now;
        state.residences.insert(residence_id, after.clone());

        let Some(user) = state.users.get_mut(&user_id) else {
            return Err(DbError::DatabaseError(diesel::result::Error::NotFound));
        };
        user.residence_id = Some(residence_id);
        user.updated_at = now;
        let user = user.clone();

        Ok(ClaimOutcome::Claimed {
            user,
            before,
            after,
        })
    }

    async fn release_residence(&self, residence_id: Uuid) -> DbResult<Option<ReleaseOutcome>> {
        let mut state = self.lock();
        let Some(before) = state.residences.get(&residence_id).cloned() else {
            return Ok(None);
        };
        let now = state.now();
        let released_user_ids = state.unlink_residence(residence_id, now);

        let mut after = before.clone();
        after.is_claimed = false;
        after.updated_at = now;
        state.residences.insert(residence_id, after.clone());

        Ok(Some(ReleaseOutcome {
            before,
            after,
            released_user_ids,
        }))
    }

    async fn count_residences(&self) -> DbResult<ResidenceCounts> {
        let state = self.lock();
        let claimed = state.residences.values().filter(|r| r.is_claimed).count();
        Ok(ResidenceCounts {
            total: i64::try_from(state.residences.len()).unwrap_or(i64::MAX),
            claimed: i64::try_from(claimed).unwrap_or(i64::MAX),
        })
    }
}

#[async_trait]
impl AllowedEmailStore for MemoryStore {
    async fn allowed_email_by_email(&self, email: &str) -> DbResult<Option<AllowedEmail>> {
        Ok(self
            .lock()
            .allowed_emails
            .values()
            .find(|entry| entry.email == email)
            .cloned())
    }

    async fn list_allowed_emails(&self) -> DbResult<Vec<AllowedEmail>> {
        let mut rows: Vec<AllowedEmail> = self.lock().allowed_emails.values().cloned().collect();
        rows.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(rows)
    }

    async fn insert_allowed_email(&self, entry: NewAllowedEmail) -> DbResult<AllowedEmail> {
        let mut state = self.lock();
        if state.allowed_emails.values().any(|e| e.email == entry.email) {
            return Err(conflict("duplicate key value violates unique constraint \"allowed_emails_email_uniq\""));
        }
        if entry
            .residence_id
            .is_some_and(|residence_id| !state.residences.contains_key(&residence_id))
        {
            return Err(conflict("insert violates foreign key constraint on \"residence_id\""));
        }
        let now = state.now();
        let row = AllowedEmail {
            id: entry.id,
            email: entry.email,
            residence_id: entry.residence_id,
            created_at: now,
        };
        state.allowed_emails.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_allowed_emails(
        &self,
        entries: Vec<NewAllowedEmail>,
    ) -> DbResult<Vec<AllowedEmail>> {
        let mut state = self.lock();
        let mut inserted = Vec::new();
        for entry in entries {
            if state.allowed_emails.values().any(|e| e.email == entry.email) {
                continue;
            }
            let now = state.now();
            let row = AllowedEmail {
                id: entry.id,
                email: entry.email,
                residence_id: entry.residence_id,
                created_at: now,
            };
            state.allowed_emails.insert(row.id, row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn delete_allowed_email(&self, id: Uuid) -> DbResult<Option<AllowedEmail>> {
        Ok(self.lock().allowed_emails.remove(&id))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self, from: Option<NaiveDate>) -> DbResult<Vec<CalendarEvent>> {
        let mut rows: Vec<CalendarEvent> = self
            .lock()
            .events
            .values()
            .filter(|e| from.is_none_or(|from| e.event_date >= from))
            .cloned()
            .collect();
        // Untimed events sort after timed ones on the same day, as NULLs do in ASC order.
        rows.sort_by_key(|e| (e.event_date, e.event_time.is_none(), e.event_time));
        Ok(rows)
    }

    async fn event_by_id(&self, id: Uuid) -> DbResult<Option<CalendarEvent>> {
        Ok(self.lock().events.get(&id).cloned())
    }

    async fn create_event(&self, event: NewCalendarEvent) -> DbResult<CalendarEvent> {
        let mut state = self.lock();
        let now = state.now();
        let row = CalendarEvent {
            id: event.id,
            title: event.title,
            description: event.description,
            event_date: event.event_date,
            event_time: event.event_time,
            location: event.location,
            category: event.category,
            created_by: event.created_by,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_event(
        &self,
        id: Uuid,
        changes: EventChangeset,
    ) -> DbResult<Option<CalendarEvent>> {
        let mut state = self.lock();
        Ok(state.events.get_mut(&id).map(|event| {
            event.title = changes.title;
            event.description = changes.description;
            event.event_date = changes.event_date;
            event.event_time = changes.event_time;
            event.location = changes.location;
            event.category = changes.category;
            event.updated_at = changes.updated_at;
            event.clone()
        }))
    }

    async fn delete_event(&self, id: Uuid) -> DbResult<Option<CalendarEvent>> {
        Ok(self.lock().events.remove(&id))
    }

    async fn count_events(&self) -> DbResult<i64> {
        Ok(i64::try_from(self.lock().events.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl ClubStore for MemoryStore {
    async fn list_clubs(&self) -> DbResult<Vec<ClubSummary>> {
        let state = self.lock();
        let mut clubs: Vec<ClubSummary> = state
            .clubs
            .values()
            .map(|club| ClubSummary {
                member_count: i64::try_from(
                    state
                        .club_members
                        .iter()
                        .filter(|m| m.club_id == club.id)
                        .count(),
                )
                .unwrap_or(i64::MAX),
                club: club.clone(),
            })
            .collect();
        clubs.sort_by(|a, b| a.club.name.cmp(&b.club.name));
        Ok(clubs)
    }

    async fn club_by_id(&self, id: Uuid) -> DbResult<Option<Club>> {
        Ok(self.lock().clubs.get(&id).cloned())
    }

    async fn create_club(&self, club: NewClub) -> DbResult<Club> {
        let mut state = self.lock();
        let now = state.now();
        let row = Club {
            id: club.id,
            name: club.name,
            description: club.description,
            created_by: club.created_by,
            created_at: now,
        };
        state.clubs.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_club(&self, id: Uuid) -> DbResult<Option<Club>> {
        let mut state = self.lock();
        let Some(club) = state.clubs.remove(&id) else {
            return Ok(None);
        };
        let post_ids: Vec<Uuid> = state
            .club_posts
            .values()
            .filter(|p| p.club_id == id)
            .map(|p| p.id)
            .collect();
        state
            .club_post_comments
            .retain(|c| !post_ids.contains(&c.post_id));
        state.club_posts.retain(|_, p| p.club_id != id);
        state.club_members.retain(|m| m.club_id != id);
        Ok(Some(club))
    }

    async fn add_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let mut state = self.lock();
        if !state.clubs.contains_key(&club_id) {
            return Err(conflict("insert violates foreign key constraint on \"club_id\""));
        }
        if state
            .club_members
            .iter()
            .any(|m| m.club_id == club_id && m.user_id == user_id)
        {
            return Ok(false);
        }
        let now = state.now();
        state.club_members.push(ClubMember {
            club_id,
            user_id,
            joined_at: now,
        });
        Ok(true)
    }

    async fn remove_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let mut state = self.lock();
        let before = state.club_members.len();
        state
            .club_members
            .retain(|m| !(m.club_id == club_id && m.user_id == user_id));
        Ok(state.club_members.len() < before)
    }

    async fn is_club_member(&self, club_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        Ok(self
            .lock()
            .club_members
            .iter()
            .any(|m| m.club_id == club_id && m.user_id == user_id))
    }

    async fn club_members(&self, club_id: Uuid) -> DbResult<Vec<ClubMember>> {
        Ok(self
            .lock()
            .club_members
            .iter()
            .filter(|m| m.club_id == club_id)
            .cloned()
            .collect())
    }

    async fn clubs_joined_by(&self, user_id: Uuid) -> DbResult<Vec<Uuid>> {
        Ok(self
            .lock()
            .club_members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.club_id)
            .collect())
    }

    async fn create_club_post(&self, post: NewClubPost) -> DbResult<ClubPost> {
        let mut state = self.lock();
        if !state.clubs.contains_key(&post.club_id) {
            return Err(conflict("insert violates foreign key constraint on \"club_id\""));
        }
        let now = state.now();
        let row = ClubPost {
            id: post.id,
            club_id: post.club_id,
            user_id: post.user_id,
            title: post.title,
            description: post.description,
            post_type: post.post_type,
            created_at: now,
        };
        state.club_posts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn club_post_by_id(&self, id: Uuid) -> DbResult<Option<ClubPost>> {
        Ok(self.lock().club_posts.get(&id).cloned())
    }

    async fn club_posts(&self, club_id: Uuid) -> DbResult<Vec<ClubPost>> {
        let state = self.lock();
        let mut posts: Vec<ClubPost> = state
            .club_posts
            .values()
            .filter(|p| p.club_id == club_id)
            .cloned()
            .collect();
        posts.sort_by_key(|p| std::cmp::Reverse(p.created_at));
        Ok(posts)
    }

    async fn create_club_post_comment(
        &self,
        comment: NewClubPostComment,
    ) -> DbResult<ClubPostComment> {
        let mut state = self.lock();
        if !state.club_posts.contains_key(&comment.post_id) {
            return Err(conflict("insert violates foreign key constraint on \"post_id\""));
        }
        let now = state.now();
        let row = ClubPostComment {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: now,
        };
        state.club_post_comments.push(row.clone());
        Ok(row)
    }

    async fn club_post_comments(&self, post_ids: &[Uuid]) -> DbResult<Vec<ClubPostComment>> {
        let mut rows: Vec<ClubPostComment> = self
            .lock()
            .club_post_comments
            .iter()
            .filter(|c| post_ids.contains(&c.post_id))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn count_clubs(&self) -> DbResult<i64> {
        Ok(i64::try_from(self.lock().clubs.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn list_charitable_items(&self) -> DbResult<Vec<CharitableItem>> {
        Ok(newest_first(&self.lock().charitable_items, |i| i.created_at))
    }

    async fn charitable_item_by_id(&self, id: Uuid) -> DbResult<Option<CharitableItem>> {
        Ok(self.lock().charitable_items.get(&id).cloned())
    }

    async fn create_charitable_item(&self, item: NewCharitableItem) -> DbResult<CharitableItem> {
        let mut state = self.lock();
        let now = state.now();
        let row = CharitableItem {
            id: item.id,
            title: item.title,
            description: item.description,
            item_type: item.item_type,
            created_by: item.created_by,
            created_at: now,
        };
        state.charitable_items.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_giveaways(&self) -> DbResult<Vec<Giveaway>> {
        Ok(newest_first(&self.lock().giveaways, |g| g.created_at))
    }

    async fn giveaway_by_id(&self, id: Uuid) -> DbResult<Option<Giveaway>> {
        Ok(self.lock().giveaways.get(&id).cloned())
    }

    async fn create_giveaway(&self, giveaway: NewGiveaway) -> DbResult<Giveaway> {
        let mut state = self.lock();
        let now = state.now();
        let row = Giveaway {
            id: giveaway.id,
            title: giveaway.title,
            description: giveaway.description,
            status: GiveawayStatus::Available,
            created_by: giveaway.created_by,
            claimed_by: None,
            created_at: now,
        };
        state.giveaways.insert(row.id, row.clone());
        Ok(row)
    }

    async fn claim_giveaway(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<Giveaway>> {
        let mut state = self.lock();
        Ok(state
            .giveaways
            .get_mut(&id)
            .filter(|g| g.status == GiveawayStatus::Available)
            .map(|g| {
                g.status = GiveawayStatus::Claimed;
                g.claimed_by = Some(user_id);
                g.clone()
            }))
    }

    async fn list_help_requests(&self) -> DbResult<Vec<HelpRequest>> {
        Ok(newest_first(&self.lock().help_requests, |r| r.created_at))
    }

    async fn help_request_by_id(&self, id: Uuid) -> DbResult<Option<HelpRequest>> {
        Ok(self.lock().help_requests.get(&id).cloned())
    }

    async fn create_help_request(&self, request: NewHelpRequest) -> DbResult<HelpRequest> {
        let mut state = self.lock();
        let now = state.now();
        let row = HelpRequest {
            id: request.id,
            title: request.title,
            description: request.description,
            request_type: request.request_type,
            created_by: request.created_by,
            created_at: now,
        };
        state.help_requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_community_item(
        &self,
        kind: CommunityItemKind,
        id: Uuid,
    ) -> DbResult<Option<serde_json::Value>> {
        let mut state = self.lock();
        let deleted = match kind {
            CommunityItemKind::Charitable => state
                .charitable_items
                .remove(&id)
                .map(serde_json::to_value)
                .transpose()?,
            CommunityItemKind::Giveaway => state
                .giveaways
                .remove(&id)
                .map(serde_json::to_value)
                .transpose()?,
            CommunityItemKind::HelpRequest => state
                .help_requests
                .remove(&id)
                .map(serde_json::to_value)
                .transpose()?,
        };
        state
            .community_comments
            .retain(|c| !(c.item_type == kind && c.item_id == id));
        Ok(deleted)
    }

    async fn create_community_comment(
        &self,
        comment: NewCommunityComment,
    ) -> DbResult<CommunityComment> {
        let mut state = self.lock();
        let now = state.now();
        let row = CommunityComment {
            id: comment.id,
            item_id: comment.item_id,
            item_type: comment.item_type,
            user_id: comment.user_id,
            content: comment.content,
            created_at: now,
        };
        state.community_comments.push(row.clone());
        Ok(row)
    }

    async fn community_comments(
        &self,
        kind: CommunityItemKind,
        item_id: Uuid,
    ) -> DbResult<Vec<CommunityComment>> {
        let mut rows: Vec<CommunityComment> = self
            .lock()
            .community_comments
            .iter()
            .filter(|c| c.item_type == kind && c.item_id == item_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn count_giveaways(&self) -> DbResult<i64> {
        Ok(i64::try_from(self.lock().giveaways.len()).unwrap_or(i64::MAX))
    }

    async fn count_help_requests(&self) -> DbResult<i64> {
        Ok(i64::try_from(self.lock().help_requests.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, entry: NewAuditLogEntry) -> DbResult<()> {
        if self.audit_fails.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DbError::DatabaseError(diesel::result::Error::BrokenTransactionManager));
        }
        let mut state = self.lock();
        let now = state.now();
        state.audit_logs.push(AuditLogEntry {
            id: entry.id,
            actor_id: entry.actor_id,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            old_values: entry.old_values,
            new_values: entry.new_values,
            description: entry.description,
            created_at: now,
        });
        Ok(())
    }

    async fn recent_audit(&self, limit: i64) -> DbResult<Vec<AuditLogEntry>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .lock()
            .audit_logs
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LoginStore for MemoryStore {
    async fn put_login_code(&self, code: LoginCode) -> DbResult<()> {
        self.lock().login_codes.insert(code.email.clone(), code);
        Ok(())
    }

    async fn consume_login_code(
        &self,
        email: &str,
        code_hash: &str,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> DbResult<Option<LoginCode>> {
        let mut state = self.lock();
        let Some(code) = state
            .login_codes
            .get_mut(email)
            .filter(|code| code.expires_at > now)
        else {
            return Ok(None);
        };

        if code.code_hash == code_hash && code.attempts < max_attempts {
            return Ok(state.login_codes.remove(email));
        }

        code.attempts += 1;
        if code.attempts >= max_attempts {
            state.login_codes.remove(email);
        }
        Ok(None)
    }

    async fn create_session(&self, session: Session) -> DbResult<Session> {
        let mut state = self.lock();
        if !state.users.contains_key(&session.user_id) {
            return Err(conflict("insert violates foreign key constraint on \"user_id\""));
        }
        state
            .sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> DbResult<Option<User>> {
        let state = self.lock();
        Ok(state
            .sessions
            .get(token_hash)
            .filter(|s| s.expires_at > now)
            .and_then(|s| state.users.get(&s.user_id))
            .cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> DbResult<bool> {
        Ok(self.lock().sessions.remove(token_hash).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let mut state = self.lock();
        let before = state.login_codes.len() + state.sessions.len();
        state.login_codes.retain(|_, c| c.expires_at > now);
        state.sessions.retain(|_, s| s.expires_at > now);
        Ok(before - state.login_codes.len() - state.sessions.len())
    }
}
