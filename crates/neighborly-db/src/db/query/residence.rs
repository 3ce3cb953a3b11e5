//! Query functions for residences.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::query::escape_like;
use crate::db::schema::residences;
use crate::model::residence::{DirectoryFilter, NewResidence, Residence, ResidenceChangeset};

type BoxedQuery<'a, T> = residences::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// ## Summary
/// Returns a query to select all residences.
#[must_use]
pub fn all() -> BoxedQuery<'static, Residence> {
    residences::table.select(Residence::as_select()).into_boxed()
}

/// ## Summary
/// Returns a query to find a residence by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static, Residence> {
    all().filter(residences::id.eq(id))
}

/// ## Summary
/// Returns the directory listing query: optional street and search filters,
/// ordered by street then address.
#[must_use]
pub fn directory(filter: &DirectoryFilter) -> BoxedQuery<'static, Residence> {
    let mut query = all();

    if let Some(street) = filter.street {
        query = query.filter(residences::street_name.eq(street));
    }

    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            residences::address
                .ilike(pattern.clone())
                .or(residences::last_name.ilike(pattern)),
        );
    }

    query.order_by((residences::street_name.asc(), residences::address.asc()))
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_residence(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<Residence>> {
    by_id(id).get_result(conn).await.optional()
}

/// ## Summary
/// Locks and returns a residence row for the rest of the transaction.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn lock_residence(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<Residence>> {
    residences::table
        .find(id)
        .select(Residence::as_select())
        .for_update()
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_residence(
    conn: &mut DbConnection<'_>,
    new_residence: &NewResidence,
) -> QueryResult<Residence> {
    diesel::insert_into(residences::table)
        .values(new_residence)
        .returning(Residence::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_residence(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    changes: &ResidenceChangeset,
) -> QueryResult<Option<Residence>> {
    diesel::update(residences::table.find(id))
        .set(changes)
        .returning(Residence::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Sets the claimed flag and replaces the additional details.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_claimed(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    claimed: bool,
    details: &serde_json::Value,
) -> QueryResult<Residence> {
    diesel::update(residences::table.find(id))
        .set((
            residences::is_claimed.eq(claimed),
            residences::additional_details.eq(details),
            residences::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(Residence::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_residence(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<Residence>> {
    diesel::delete(residences::table.find(id))
        .returning(Residence::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Counts all residences and the claimed ones.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn count(conn: &mut DbConnection<'_>) -> QueryResult<(i64, i64)> {
    let total = residences::table.count().get_result(conn).await?;
    let claimed = residences::table
        .filter(residences::is_claimed.eq(true))
        .count()
        .get_result(conn)
        .await?;
    Ok((total, claimed))
}
