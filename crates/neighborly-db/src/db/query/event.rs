//! Query functions for calendar events.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::calendar_events;
use crate::model::event::{CalendarEvent, EventChangeset, NewCalendarEvent};

type BoxedQuery<'a, T> = calendar_events::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// ## Summary
/// Returns a query to select all events.
#[must_use]
pub fn all() -> BoxedQuery<'static, CalendarEvent> {
    calendar_events::table
        .select(CalendarEvent::as_select())
        .into_boxed()
}

/// ## Summary
/// Returns a query to find an event by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static, CalendarEvent> {
    all().filter(calendar_events::id.eq(id))
}

/// ## Summary
/// Returns events in calendar order, optionally starting at a date.
#[must_use]
pub fn upcoming(from: Option<chrono::NaiveDate>) -> BoxedQuery<'static, CalendarEvent> {
    let mut query = all();
    if let Some(from) = from {
        query = query.filter(calendar_events::event_date.ge(from));
    }
    query.order_by((
        calendar_events::event_date.asc(),
        calendar_events::event_time.asc(),
    ))
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_event(
    conn: &mut DbConnection<'_>,
    event: &NewCalendarEvent,
) -> QueryResult<CalendarEvent> {
    diesel::insert_into(calendar_events::table)
        .values(event)
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_event(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    changes: &EventChangeset,
) -> QueryResult<Option<CalendarEvent>> {
    diesel::update(calendar_events::table.find(id))
        .set(changes)
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_event(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> QueryResult<Option<CalendarEvent>> {
    diesel::delete(calendar_events::table.find(id))
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count(conn: &mut DbConnection<'_>) -> QueryResult<i64> {
    calendar_events::table.count().get_result(conn).await
}
