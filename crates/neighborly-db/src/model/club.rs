use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::{enums::PostType, schema};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::clubs)]
#[diesel(check_for_backend(Pg))]
pub struct Club {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::clubs)]
pub struct NewClub {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub created_by: uuid::Uuid,
}

/// A club with its current member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubSummary {
    #[serde(flatten)]
    pub club: Club,
    pub member_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::club_members)]
#[diesel(check_for_backend(Pg))]
#[diesel(primary_key(club_id, user_id))]
pub struct ClubMember {
    pub club_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::club_members)]
pub struct NewClubMember {
    pub club_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::club_posts)]
#[diesel(check_for_backend(Pg))]
pub struct ClubPost {
    pub id: uuid::Uuid,
    pub club_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub post_type: PostType,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::club_posts)]
pub struct NewClubPost {
    pub id: uuid::Uuid,
    pub club_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub post_type: PostType,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::club_post_comments)]
#[diesel(check_for_backend(Pg))]
pub struct ClubPostComment {
    pub id: uuid::Uuid,
    pub post_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::club_post_comments)]
pub struct NewClubPostComment {
    pub id: uuid::Uuid,
    pub post_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub content: String,
}
