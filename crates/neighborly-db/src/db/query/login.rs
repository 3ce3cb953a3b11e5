//! Query functions for login codes and sessions.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::{login_codes, sessions, users};
use crate::model::login::{LoginCode, Session};
use crate::model::user::User;

/// ## Summary
/// Stores a code, replacing any outstanding code for the same email.
///
/// ## Errors
/// Returns a database error if the upsert fails.
pub async fn put_code(conn: &mut DbConnection<'_>, code: &LoginCode) -> QueryResult<usize> {
    diesel::insert_into(login_codes::table)
        .values(code)
        .on_conflict(login_codes::email)
        .do_update()
        .set((
            login_codes::code_hash.eq(excluded(login_codes::code_hash)),
            login_codes::expires_at.eq(excluded(login_codes::expires_at)),
            login_codes::created_at.eq(excluded(login_codes::created_at)),
            login_codes::attempts.eq(0),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes the matching unexpired code and returns it. A single statement, so
/// two concurrent redemptions cannot both succeed. Codes that have used up
/// their attempts never match.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn consume_code(
    conn: &mut DbConnection<'_>,
    email: &str,
    code_hash: &str,
    now: DateTime<Utc>,
    max_attempts: i32,
) -> QueryResult<Option<LoginCode>> {
    diesel::delete(
        login_codes::table
            .filter(login_codes::email.eq(email))
            .filter(login_codes::code_hash.eq(code_hash))
            .filter(login_codes::expires_at.gt(now))
            .filter(login_codes::attempts.lt(max_attempts)),
    )
    .returning(LoginCode::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Counts a wrong guess against the outstanding code for `email` and deletes
/// the code once `max_attempts` is reached. Returns the new attempt count, or
/// `None` if there was no live code.
///
/// ## Errors
/// Returns a database error if the update or delete fails.
pub async fn record_failed_attempt(
    conn: &mut DbConnection<'_>,
    email: &str,
    now: DateTime<Utc>,
    max_attempts: i32,
) -> QueryResult<Option<i32>> {
    let attempts: Option<i32> = diesel::update(
        login_codes::table
            .filter(login_codes::email.eq(email))
            .filter(login_codes::expires_at.gt(now)),
    )
    .set(login_codes::attempts.eq(login_codes::attempts + 1))
    .returning(login_codes::attempts)
    .get_result(conn)
    .await
    .optional()?;

    if attempts.is_some_and(|n| n >= max_attempts) {
        diesel::delete(login_codes::table.filter(login_codes::email.eq(email)))
            .execute(conn)
            .await?;
    }
    Ok(attempts)
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_session(conn: &mut DbConnection<'_>, session: &Session) -> QueryResult<Session> {
    diesel::insert_into(sessions::table)
        .values(session)
        .returning(Session::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Returns the owner of an unexpired session.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn session_user(
    conn: &mut DbConnection<'_>,
    token_hash: &str,
    now: DateTime<Utc>,
) -> QueryResult<Option<User>> {
    sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(token_hash))
        .filter(sessions::expires_at.gt(now))
        .select(User::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_session(conn: &mut DbConnection<'_>, token_hash: &str) -> QueryResult<usize> {
    diesel::delete(sessions::table.filter(sessions::token_hash.eq(token_hash)))
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if either delete fails.
pub async fn purge_expired(conn: &mut DbConnection<'_>, now: DateTime<Utc>) -> QueryResult<usize> {
    let codes = diesel::delete(login_codes::table.filter(login_codes::expires_at.le(now)))
        .execute(conn)
        .await?;
    let sessions = diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
        .execute(conn)
        .await?;
    Ok(codes + sessions)
}
