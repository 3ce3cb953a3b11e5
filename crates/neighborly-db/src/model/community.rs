use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::{
    enums::{CharitableItemType, CommunityItemKind, GiveawayStatus, HelpRequestType},
    schema,
};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::charitable_items)]
#[diesel(check_for_backend(Pg))]
pub struct CharitableItem {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub item_type: CharitableItemType,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::charitable_items)]
pub struct NewCharitableItem {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub item_type: CharitableItemType,
    pub created_by: uuid::Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::giveaways)]
#[diesel(check_for_backend(Pg))]
pub struct Giveaway {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub status: GiveawayStatus,
    pub created_by: uuid::Uuid,
    pub claimed_by: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// New giveaways always start out available.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::giveaways)]
pub struct NewGiveaway {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub created_by: uuid::Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::help_requests)]
#[diesel(check_for_backend(Pg))]
pub struct HelpRequest {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub request_type: HelpRequestType,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::help_requests)]
pub struct NewHelpRequest {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub request_type: HelpRequestType,
    pub created_by: uuid::Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::community_comments)]
#[diesel(check_for_backend(Pg))]
pub struct CommunityComment {
    pub id: uuid::Uuid,
    pub item_id: uuid::Uuid,
    pub item_type: CommunityItemKind,
    pub user_id: uuid::Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::community_comments)]
pub struct NewCommunityComment {
    pub id: uuid::Uuid,
    pub item_id: uuid::Uuid,
    pub item_type: CommunityItemKind,
    pub user_id: uuid::Uuid,
    pub content: String,
}

/// Every posting shown on the community page, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommunityBoard {
    pub charitable_items: Vec<CharitableItem>,
    pub giveaways: Vec<Giveaway>,
    pub help_requests: Vec<HelpRequest>,
}
