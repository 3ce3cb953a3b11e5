//! Query functions for users.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::users;
use crate::model::user::{NewUser, User};

type BoxedQuery<'a, T> = users::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// ## Summary
/// Returns a query to select all users.
#[must_use]
pub fn all() -> BoxedQuery<'static, User> {
    users::table.select(User::as_select()).into_boxed()
}

/// ## Summary
/// Returns a query to find a user by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static, User> {
    all().filter(users::id.eq(id))
}

/// ## Summary
/// Returns a query to find a user by normalised email.
#[must_use]
pub fn by_email(email: &str) -> BoxedQuery<'_, User> {
    all().filter(users::email.eq(email))
}

/// ## Summary
/// Returns a query for the users linked to a residence.
#[must_use]
pub fn by_residence(residence_id: uuid::Uuid) -> BoxedQuery<'static, User> {
    all().filter(users::residence_id.eq(residence_id))
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> QueryResult<Option<User>> {
    by_id(id).get_result(conn).await.optional()
}

/// ## Errors
/// Returns a database error if the insert fails, including unique violations.
pub async fn create_user(conn: &mut DbConnection<'_>, new_user: &NewUser) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_phone(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    phone: Option<String>,
) -> QueryResult<Option<User>> {
    diesel::update(users::table.find(id))
        .set((
            users::phone_number.eq(phone),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(User::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Marks the user with `email` as an administrator. Returns `None` when no
/// such user exists or it already is one.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn grant_admin(conn: &mut DbConnection<'_>, email: &str) -> QueryResult<Option<User>> {
    diesel::update(
        users::table
            .filter(users::email.eq(email))
            .filter(users::is_admin.eq(false)),
    )
    .set((
        users::is_admin.eq(true),
        users::updated_at.eq(chrono::Utc::now()),
    ))
    .returning(User::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Locks and returns a user row for the rest of the transaction.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn lock_user(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> QueryResult<Option<User>> {
    users::table
        .find(id)
        .select(User::as_select())
        .for_update()
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn link_residence(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    residence_id: uuid::Uuid,
) -> QueryResult<User> {
    diesel::update(users::table.find(id))
        .set((
            users::residence_id.eq(Some(residence_id)),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Clears every user's link to the residence and returns their IDs.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn unlink_residence(
    conn: &mut DbConnection<'_>,
    residence_id: uuid::Uuid,
) -> QueryResult<Vec<uuid::Uuid>> {
    diesel::update(users::table.filter(users::residence_id.eq(residence_id)))
        .set((
            users::residence_id.eq(None::<uuid::Uuid>),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(users::id)
        .get_results(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count_linked_to(
    conn: &mut DbConnection<'_>,
    residence_id: uuid::Uuid,
) -> QueryResult<i64> {
    users::table
        .filter(users::residence_id.eq(residence_id))
        .count()
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count(conn: &mut DbConnection<'_>) -> QueryResult<i64> {
    users::table.count().get_result(conn).await
}
