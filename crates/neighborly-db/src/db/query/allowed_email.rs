//! Query functions for the email whitelist.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::allowed_emails;
use crate::model::allowed_email::{AllowedEmail, NewAllowedEmail};

type BoxedQuery<'a, T> = allowed_emails::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// ## Summary
/// Returns a query to select the whole whitelist, ordered by email.
#[must_use]
pub fn all() -> BoxedQuery<'static, AllowedEmail> {
    allowed_emails::table
        .select(AllowedEmail::as_select())
        .order_by(allowed_emails::email.asc())
        .into_boxed()
}

/// ## Summary
/// Returns a query to find a whitelist entry by normalised email.
#[must_use]
pub fn by_email(email: &str) -> BoxedQuery<'_, AllowedEmail> {
    allowed_emails::table
        .select(AllowedEmail::as_select())
        .filter(allowed_emails::email.eq(email))
        .into_boxed()
}

/// ## Errors
/// Returns a database error if the insert fails, including unique violations.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    entry: &NewAllowedEmail,
) -> QueryResult<AllowedEmail> {
    diesel::insert_into(allowed_emails::table)
        .values(entry)
        .returning(AllowedEmail::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Inserts entries, silently skipping emails that are already listed.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_skipping_existing(
    conn: &mut DbConnection<'_>,
    entries: &[NewAllowedEmail],
) -> QueryResult<Vec<AllowedEmail>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    diesel::insert_into(allowed_emails::table)
        .values(entries)
        .on_conflict(allowed_emails::email)
        .do_nothing()
        .returning(AllowedEmail::as_returning())
        .get_results(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<AllowedEmail>> {
    diesel::delete(allowed_emails::table.find(id))
        .returning(AllowedEmail::as_returning())
        .get_result(conn)
        .await
        .optional()
}
