//! Depot helpers for extracting the authenticated caller from Salvo requests.

use neighborly_db::model::user::User;

use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const AUTHENTICATED_PRINCIPAL: &str = "__authenticated_principal";
    /// Raw session token the caller presented, kept for sign-out.
    pub const SESSION_TOKEN: &str = "__session_token";
}

/// Who the auth middleware resolved the request to.
#[derive(Debug, Clone)]
pub enum DepotUser {
    User(User),
    Public,
}

/// Get the authenticated user from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if no user is found in the depot or if the user is public.
pub fn get_user_from_depot(depot: &salvo::Depot) -> ServiceResult<&User> {
    let depot_user = depot
        .get::<DepotUser>(depot_keys::AUTHENTICATED_PRINCIPAL)
        .map_err(|_e| ServiceError::NotAuthenticated)?;

    match depot_user {
        DepotUser::User(user) => Ok(user),
        DepotUser::Public => Err(ServiceError::NotAuthenticated),
    }
}

/// Check if the request is from an authenticated user (not public).
#[must_use]
pub fn is_authenticated(depot: &salvo::Depot) -> bool {
    depot
        .get::<DepotUser>(depot_keys::AUTHENTICATED_PRINCIPAL)
        .is_ok_and(|u| matches!(u, DepotUser::User(_)))
}

/// Session token presented with the request, if any.
#[must_use]
pub fn get_session_token_from_depot(depot: &salvo::Depot) -> Option<&str> {
    depot
        .get::<String>(depot_keys::SESSION_TOKEN)
        .ok()
        .map(String::as_str)
}
