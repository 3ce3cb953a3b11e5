//! Query functions for clubs, memberships, posts and post comments.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::{club_members, club_post_comments, club_posts, clubs};
use crate::model::club::{
    Club, ClubMember, ClubPost, ClubPostComment, NewClub, NewClubMember, NewClubPost,
    NewClubPostComment,
};

/// ## Summary
/// Returns a query to select all clubs by name.
#[must_use]
pub fn all() -> clubs::BoxedQuery<'static, diesel::pg::Pg, diesel::dsl::AsSelect<Club, diesel::pg::Pg>> {
    clubs::table
        .select(Club::as_select())
        .order_by(clubs::name.asc())
        .into_boxed()
}

/// ## Summary
/// Returns a query for the posts of a club, newest first.
#[must_use]
pub fn posts_of(club_id: uuid::Uuid) -> club_posts::BoxedQuery<'static, diesel::pg::Pg, diesel::dsl::AsSelect<ClubPost, diesel::pg::Pg>> {
    club_posts::table
        .select(ClubPost::as_select())
        .filter(club_posts::club_id.eq(club_id))
        .order_by(club_posts::created_at.desc())
        .into_boxed()
}

/// ## Summary
/// Returns a query for comments on any of `post_ids`, oldest first.
#[must_use]
pub fn comments_on(
    post_ids: &[uuid::Uuid],
) -> club_post_comments::BoxedQuery<'static, diesel::pg::Pg, diesel::dsl::AsSelect<ClubPostComment, diesel::pg::Pg>> {
    club_post_comments::table
        .select(ClubPostComment::as_select())
        .filter(club_post_comments::post_id.eq_any(post_ids.to_vec()))
        .order_by(club_post_comments::created_at.asc())
        .into_boxed()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_club(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> QueryResult<Option<Club>> {
    clubs::table
        .find(id)
        .select(Club::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Member count per club, for clubs with at least one member.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn member_counts(conn: &mut DbConnection<'_>) -> QueryResult<Vec<(uuid::Uuid, i64)>> {
    club_members::table
        .group_by(club_members::club_id)
        .select((club_members::club_id, diesel::dsl::count_star()))
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_club(conn: &mut DbConnection<'_>, club: &NewClub) -> QueryResult<Club> {
    diesel::insert_into(clubs::table)
        .values(club)
        .returning(Club::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes a club's post comments, posts and memberships, then the club.
/// Run inside a transaction.
///
/// ## Errors
/// Returns a database error if any delete fails.
pub async fn delete_club_cascade(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<Club>> {
    let post_ids = club_posts::table
        .filter(club_posts::club_id.eq(id))
        .select(club_posts::id);

    diesel::delete(club_post_comments::table.filter(club_post_comments::post_id.eq_any(post_ids)))
        .execute(conn)
        .await?;
    diesel::delete(club_posts::table.filter(club_posts::club_id.eq(id)))
        .execute(conn)
        .await?;
    diesel::delete(club_members::table.filter(club_members::club_id.eq(id)))
        .execute(conn)
        .await?;

    diesel::delete(clubs::table.find(id))
        .returning(Club::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Adds a membership. Returns the number of rows inserted: zero when the
/// user was already a member.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn add_member(conn: &mut DbConnection<'_>, member: &NewClubMember) -> QueryResult<usize> {
    diesel::insert_into(club_members::table)
        .values(member)
        .on_conflict((club_members::club_id, club_members::user_id))
        .do_nothing()
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn remove_member(
    conn: &mut DbConnection<'_>,
    club_id: uuid::Uuid,
    user_id: uuid::Uuid,
) -> QueryResult<usize> {
    diesel::delete(club_members::table.find((club_id, user_id)))
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn is_member(
    conn: &mut DbConnection<'_>,
    club_id: uuid::Uuid,
    user_id: uuid::Uuid,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        club_members::table.find((club_id, user_id)),
    ))
    .get_result(conn)
    .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn members_of(
    conn: &mut DbConnection<'_>,
    club_id: uuid::Uuid,
) -> QueryResult<Vec<ClubMember>> {
    club_members::table
        .filter(club_members::club_id.eq(club_id))
        .select(ClubMember::as_select())
        .order_by(club_members::joined_at.asc())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn clubs_joined_by(
    conn: &mut DbConnection<'_>,
    user_id: uuid::Uuid,
) -> QueryResult<Vec<uuid::Uuid>> {
    club_members::table
        .filter(club_members::user_id.eq(user_id))
        .select(club_members::club_id)
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_post(conn: &mut DbConnection<'_>, post: &NewClubPost) -> QueryResult<ClubPost> {
    diesel::insert_into(club_posts::table)
        .values(post)
        .returning(ClubPost::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_post(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> QueryResult<Option<ClubPost>> {
    club_posts::table
        .find(id)
        .select(ClubPost::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_comment(
    conn: &mut DbConnection<'_>,
    comment: &NewClubPostComment,
) -> QueryResult<ClubPostComment> {
    diesel::insert_into(club_post_comments::table)
        .values(comment)
        .returning(ClubPostComment::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count(conn: &mut DbConnection<'_>) -> QueryResult<i64> {
    clubs::table.count().get_result(conn).await
}
