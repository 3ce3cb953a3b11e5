use salvo::Depot;
use salvo::http::header::AUTHORIZATION;
use tracing::error;

use crate::error::AppError;
use crate::service_handler::get_context_from_depot;
use neighborly_core::constants::SESSION_COOKIE_NAME;
use neighborly_service::auth::depot::{DepotUser, depot_keys};
use neighborly_service::auth::login::authenticate;
use neighborly_service::error::ServiceError;

/// Session token from `Authorization: Bearer <token>`, falling back to the
/// session cookie.
fn presented_token(req: &salvo::Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer
        .map(str::to_string)
        .or_else(|| req.cookie(SESSION_COOKIE_NAME).map(|c| c.value().to_string()))
        .filter(|token| !token.is_empty())
}

/// ## Summary
/// Resolves the caller from the presented session token and stores it in the
/// depot. Requests without a valid token continue as public; handlers that
/// need a user reject them with 401.
///
/// ## Side Effects
/// Inserts a [`DepotUser`] under `AUTHENTICATED_PRINCIPAL`, and the raw token
/// under `SESSION_TOKEN` when one was presented.
///
/// ## Errors
/// Responds 503 when the store is unreachable and 500 for any other failure.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authenticating request");

        let Some(token) = presented_token(req) else {
            depot.insert(depot_keys::AUTHENTICATED_PRINCIPAL, DepotUser::Public);
            return;
        };

        let context = match get_context_from_depot(depot) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(error = ?e, "Failed to get service context from depot");
                res.status_code(salvo::http::StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        match authenticate(&context, &token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "User authenticated successfully");
                depot.insert(depot_keys::AUTHENTICATED_PRINCIPAL, DepotUser::User(user));
                depot.insert(depot_keys::SESSION_TOKEN, token);
            }
            Err(ServiceError::NotAuthenticated) => {
                tracing::debug!("Session token unknown or expired, treating as public");
                depot.insert(depot_keys::AUTHENTICATED_PRINCIPAL, DepotUser::Public);
            }
            Err(service_err) => {
                let err = AppError::from(service_err);
                error!(error = ?err, "Authentication failed with error");
                res.status_code(err.status_code());
                res.render(salvo::writing::Json(crate::error::ErrorResponse {
                    error: err.public_message(),
                }));
                ctrl.skip_rest();
            }
        }
    }
}

/// ## Summary
/// Middleware handler for authentication.
/// Use this as a handler in routes to resolve the caller.
pub struct AuthMiddleware;
