//! Query functions for the community board.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::enums::{CommunityItemKind, GiveawayStatus};
use crate::db::schema::{charitable_items, community_comments, giveaways, help_requests};
use crate::model::community::{
    CharitableItem, CommunityComment, Giveaway, HelpRequest, NewCharitableItem,
    NewCommunityComment, NewGiveaway, NewHelpRequest,
};

/// ## Summary
/// Returns a query for the comments on one posting, oldest first.
#[must_use]
pub fn comments_on(
    kind: CommunityItemKind,
    item_id: uuid::Uuid,
) -> community_comments::BoxedQuery<'static, diesel::pg::Pg, diesel::dsl::AsSelect<CommunityComment, diesel::pg::Pg>> {
    community_comments::table
        .select(CommunityComment::as_select())
        .filter(community_comments::item_type.eq(kind))
        .filter(community_comments::item_id.eq(item_id))
        .order_by(community_comments::created_at.asc())
        .into_boxed()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_charitable(conn: &mut DbConnection<'_>) -> QueryResult<Vec<CharitableItem>> {
    charitable_items::table
        .select(CharitableItem::as_select())
        .order_by(charitable_items::created_at.desc())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_charitable(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<CharitableItem>> {
    charitable_items::table
        .find(id)
        .select(CharitableItem::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_charitable(
    conn: &mut DbConnection<'_>,
    item: &NewCharitableItem,
) -> QueryResult<CharitableItem> {
    diesel::insert_into(charitable_items::table)
        .values(item)
        .returning(CharitableItem::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_giveaways(conn: &mut DbConnection<'_>) -> QueryResult<Vec<Giveaway>> {
    giveaways::table
        .select(Giveaway::as_select())
        .order_by(giveaways::created_at.desc())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_giveaway(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<Giveaway>> {
    giveaways::table
        .find(id)
        .select(Giveaway::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_giveaway(
    conn: &mut DbConnection<'_>,
    giveaway: &NewGiveaway,
) -> QueryResult<Giveaway> {
    diesel::insert_into(giveaways::table)
        .values(giveaway)
        .returning(Giveaway::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Claims a giveaway only while it is still available; the status check and
/// the write are one statement.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn claim_giveaway(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    user_id: uuid::Uuid,
) -> QueryResult<Option<Giveaway>> {
    diesel::update(
        giveaways::table
            .find(id)
            .filter(giveaways::status.eq(GiveawayStatus::Available)),
    )
    .set((
        giveaways::status.eq(GiveawayStatus::Claimed),
        giveaways::claimed_by.eq(Some(user_id)),
    ))
    .returning(Giveaway::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_help_requests(conn: &mut DbConnection<'_>) -> QueryResult<Vec<HelpRequest>> {
    help_requests::table
        .select(HelpRequest::as_select())
        .order_by(help_requests::created_at.desc())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_help_request(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<HelpRequest>> {
    help_requests::table
        .find(id)
        .select(HelpRequest::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_help_request(
    conn: &mut DbConnection<'_>,
    request: &NewHelpRequest,
) -> QueryResult<HelpRequest> {
    diesel::insert_into(help_requests::table)
        .values(request)
        .returning(HelpRequest::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes all comments on one posting. Returns the number removed.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_comments_on(
    conn: &mut DbConnection<'_>,
    kind: CommunityItemKind,
    item_id: uuid::Uuid,
) -> QueryResult<usize> {
    diesel::delete(
        community_comments::table
            .filter(community_comments::item_type.eq(kind))
            .filter(community_comments::item_id.eq(item_id)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Deletes one posting of the given kind and returns it serialized.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_item(
    conn: &mut DbConnection<'_>,
    kind: CommunityItemKind,
    id: uuid::Uuid,
) -> QueryResult<Option<serde_json::Value>> {
    let deleted = match kind {
        CommunityItemKind::Charitable => diesel::delete(charitable_items::table.find(id))
            .returning(CharitableItem::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .map(serde_json::to_value),
        CommunityItemKind::Giveaway => diesel::delete(giveaways::table.find(id))
            .returning(Giveaway::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .map(serde_json::to_value),
        CommunityItemKind::HelpRequest => diesel::delete(help_requests::table.find(id))
            .returning(HelpRequest::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .map(serde_json::to_value),
    };

    deleted
        .transpose()
        .map_err(|e| diesel::result::Error::SerializationError(Box::new(e)))
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_comment(
    conn: &mut DbConnection<'_>,
    comment: &NewCommunityComment,
) -> QueryResult<CommunityComment> {
    diesel::insert_into(community_comments::table)
        .values(comment)
        .returning(CommunityComment::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count_giveaways(conn: &mut DbConnection<'_>) -> QueryResult<i64> {
    giveaways::table.count().get_result(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count_help_requests(conn: &mut DbConnection<'_>) -> QueryResult<i64> {
    help_requests::table.count().get_result(conn).await
}
