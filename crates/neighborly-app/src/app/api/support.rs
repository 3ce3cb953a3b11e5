//! Request extraction and response helpers shared by the API handlers.

use salvo::http::header::{HeaderName, HeaderValue};
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use neighborly_core::constants::REVALIDATE_HEADER;
use neighborly_db::model::user::User;
use neighborly_service::auth::depot::get_user_from_depot;
use neighborly_service::context::ServiceContext;
use neighborly_service::view::{Mutation, StaleViews};

use crate::error::{AppError, AppResult};

pub use crate::service_handler::get_context_from_depot as context;

/// The signed-in caller.
///
/// ## Errors
/// `NotAuthenticated` for public requests.
pub fn caller(depot: &Depot) -> AppResult<User> {
    Ok(get_user_from_depot(depot)?.clone())
}

/// Context and caller together, for handlers that need both.
///
/// ## Errors
/// See [`context`] and [`caller`].
pub fn session(depot: &Depot) -> AppResult<(ServiceContext, User)> {
    Ok((context(depot)?, caller(depot)?))
}

/// ## Errors
/// `BadRequest` if the parameter is missing or not a UUID.
pub fn path_id(req: &Request, name: &str) -> AppResult<Uuid> {
    let raw = req
        .param::<String>(name)
        .ok_or_else(|| AppError::BadRequest(format!("Missing path parameter {name}")))?;
    Uuid::parse_str(&raw).map_err(|e| AppError::BadRequest(format!("Invalid {name}: {e}")))
}

/// ## Errors
/// `BadRequest` if the body is not valid JSON for `T`.
pub async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to parse request body");
        AppError::BadRequest("Invalid request body".to_string())
    })
}

fn mark_stale(res: &mut Response, stale: &StaleViews) {
    if stale.is_empty() {
        return;
    }
    match HeaderValue::from_str(&stale.header_value()) {
        Ok(value) => {
            res.headers_mut()
                .insert(HeaderName::from_static(REVALIDATE_HEADER), value);
        }
        Err(e) => tracing::warn!(error = %e, "Stale view list is not a valid header value"),
    }
}

/// Renders the written record and advertises the stale views.
pub fn render_mutation<T: Serialize + Send>(res: &mut Response, mutation: Mutation<T>) {
    mark_stale(res, &mutation.stale);
    res.render(Json(mutation.value));
}

/// Like [`render_mutation`] with `201 Created`.
pub fn render_created<T: Serialize + Send>(res: &mut Response, mutation: Mutation<T>) {
    res.status_code(StatusCode::CREATED);
    render_mutation(res, mutation);
}

/// `204 No Content` plus the stale views, for deletes and membership changes.
pub fn render_done(res: &mut Response, mutation: &Mutation<()>) {
    mark_stale(res, &mutation.stale);
    res.status_code(StatusCode::NO_CONTENT);
}
