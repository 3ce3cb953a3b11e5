mod admin;
mod allowed_emails;
mod app_specific;
mod auth;
mod clubs;
mod community;
mod events;
mod profile;
mod residences;
pub mod support;

use salvo::Router;

use crate::middleware::auth::AuthMiddleware;

pub use neighborly_core::constants::{API_ROUTE_COMPONENT, API_ROUTE_PREFIX};

/// ## Summary
/// Constructs the API router. Every route sits behind [`AuthMiddleware`];
/// handlers that need a signed-in caller reject public requests themselves.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .hoop(AuthMiddleware)
        .push(app_specific::routes())
        .push(auth::routes())
        .push(profile::routes())
        .push(residences::directory_routes())
        .push(residences::routes())
        .push(allowed_emails::routes())
        .push(events::routes())
        .push(clubs::routes())
        .push(clubs::post_routes())
        .push(community::routes())
        .push(admin::routes())
}
