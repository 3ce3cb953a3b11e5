//! Shared neighborhood calendar.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use neighborly_core::constants::{DESCRIPTION_MAX_LEN, LOCATION_MAX_LEN};
use neighborly_core::validation::{FieldError, validate_event_title, validate_optional_text};
use neighborly_db::db::enums::{AuditAction, EventCategory};
use neighborly_db::model::event::{CalendarEvent, EventChangeset, NewCalendarEvent};
use neighborly_db::model::user::User;
use neighborly_db::store::prelude::*;

use crate::audit::AuditEntry;
use crate::auth::{Action, Resource, Subjects};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::view::{Mutation, View};

const RESOURCE_TYPE: &str = "calendar_event";
const NOT_FOUND: &str = "Event not found";

/// Event form fields as submitted. Used for both create and full update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    pub event_date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

/// Validated event fields.
struct EventFields {
    title: String,
    description: Option<String>,
    event_date: NaiveDate,
    event_time: Option<NaiveTime>,
    location: Option<String>,
    category: EventCategory,
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl EventInput {
    fn validate(&self) -> Result<EventFields, FieldError> {
        validate_event_title(self.title.as_deref())?;
        validate_optional_text(
            self.description.as_deref(),
            "description",
            "Description",
            DESCRIPTION_MAX_LEN,
        )?;
        validate_optional_text(self.location.as_deref(), "location", "Location", LOCATION_MAX_LEN)?;

        let event_date = match self.event_date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| FieldError::new("event_date", format!("Invalid event date: {e}")))?,
            _ => return Err(FieldError::new("event_date", "Event date is required")),
        };

        let event_time = match blank_to_none(self.event_time.as_deref()) {
            Some(time) => Some(
                NaiveTime::parse_from_str(&time, "%H:%M:%S")
                    .or_else(|_err| NaiveTime::parse_from_str(&time, "%H:%M"))
                    .map_err(|e| FieldError::new("event_time", format!("Invalid event time: {e}")))?,
            ),
            None => None,
        };

        let category = match blank_to_none(self.category.as_deref()) {
            Some(category) => category
                .parse::<EventCategory>()
                .map_err(|e| FieldError::new("category", e.to_string()))?,
            None => EventCategory::Social,
        };

        Ok(EventFields {
            title: self.title.as_deref().unwrap_or_default().trim().to_string(),
            description: blank_to_none(self.description.as_deref()),
            event_date,
            event_time,
            location: blank_to_none(self.location.as_deref()),
            category,
        })
    }
}

/// Events ordered by date then time, optionally starting from `from`.
///
/// ## Errors
/// Store failures only.
#[tracing::instrument(skip(ctx))]
pub async fn list_events(
    ctx: &ServiceContext,
    from: Option<NaiveDate>,
) -> ServiceResult<Vec<CalendarEvent>> {
    Ok(ctx.store().list_events(from).await?)
}

/// ## Errors
/// `ValidationError` for bad fields.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn create_event(
    ctx: &ServiceContext,
    caller: &User,
    input: EventInput,
) -> ServiceResult<Mutation<CalendarEvent>> {
    ctx.authorizer().require(
        &Subjects::for_user(caller),
        Resource::CalendarEvent,
        Action::Create,
        "You must be signed in to create events",
    )?;
    let fields = input.validate()?;

    let event = ctx
        .store()
        .create_event(NewCalendarEvent {
            id: Uuid::now_v7(),
            title: fields.title,
            description: fields.description,
            event_date: fields.event_date,
            event_time: fields.event_time,
            location: fields.location,
            category: fields.category,
            created_by: caller.id,
        })
        .await?;

    tracing::info!(event_id = %event.id, "Event created");
    Ok(Mutation::new(event, [View::Calendar]))
}

async fn load_owned(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
    action: Action,
    denial: &str,
) -> ServiceResult<CalendarEvent> {
    let event = ctx
        .store()
        .event_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;
    ctx.authorizer().require(
        &Subjects::for_user(caller).with_owner(caller, event.created_by),
        Resource::CalendarEvent,
        action,
        denial,
    )?;
    Ok(event)
}

/// ## Summary
/// Replaces every editable field of an event. Blank description, time and
/// location are cleared.
///
/// ## Errors
/// - `NotFound` for unknown ids.
/// - `AuthorizationError` unless the caller created the event or is an
///   administrator.
/// - `ValidationError` for bad fields.
#[tracing::instrument(skip(ctx, caller, input), fields(caller = %caller.id))]
pub async fn update_event(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
    input: EventInput,
) -> ServiceResult<Mutation<CalendarEvent>> {
    let before = load_owned(
        ctx,
        caller,
        id,
        Action::Update,
        "Only the event creator or an admin can edit this event",
    )
    .await?;
    let fields = input.validate()?;

    let after = ctx
        .store()
        .update_event(
            id,
            EventChangeset {
                title: fields.title,
                description: fields.description,
                event_date: fields.event_date,
                event_time: fields.event_time,
                location: fields.location,
                category: fields.category,
                updated_at: chrono::Utc::now(),
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    if caller.is_admin && before.created_by != caller.id {
        ctx.audit()
            .record(
                AuditEntry::new(caller.id, AuditAction::Update, RESOURCE_TYPE, id)
                    .before(&before)
                    .after(&after)
                    .details(after.title.clone()),
            )
            .await;
    }

    Ok(Mutation::new(after, [View::Calendar]))
}

/// ## Errors
/// `NotFound` for unknown ids, `AuthorizationError` unless the caller created
/// the event or is an administrator.
#[tracing::instrument(skip(ctx, caller), fields(caller = %caller.id))]
pub async fn delete_event(
    ctx: &ServiceContext,
    caller: &User,
    id: Uuid,
) -> ServiceResult<Mutation<()>> {
    let event = load_owned(
        ctx,
        caller,
        id,
        Action::Delete,
        "Only the event creator or an admin can delete this event",
    )
    .await?;

    ctx.store()
        .delete_event(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(NOT_FOUND))?;

    tracing::info!(event_id = %id, "Event deleted");
    if caller.is_admin && event.created_by != caller.id {
        ctx.audit()
            .record(
                AuditEntry::new(caller.id, AuditAction::Delete, RESOURCE_TYPE, id)
                    .before(&event)
                    .details(event.title.clone()),
            )
            .await;
    }

    Ok(Mutation::new((), [View::Calendar]))
}
