use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::{enums::EventCategory, schema};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::calendar_events)]
#[diesel(check_for_backend(Pg))]
pub struct CalendarEvent {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: chrono::NaiveDate,
    pub event_time: Option<chrono::NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_events)]
pub struct NewCalendarEvent {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: chrono::NaiveDate,
    pub event_time: Option<chrono::NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub created_by: uuid::Uuid,
}

/// Full replacement of the editable event fields. Empty optionals are
/// written as NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::calendar_events)]
#[diesel(treat_none_as_null = true)]
pub struct EventChangeset {
    pub title: String,
    pub description: Option<String>,
    pub event_date: chrono::NaiveDate,
    pub event_time: Option<chrono::NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
