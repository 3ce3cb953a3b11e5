//! Passwordless sign-in endpoints.

use salvo::http::cookie::time::Duration;
use salvo::http::cookie::{Cookie, SameSite};
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;
use serde_json::json;

use neighborly_core::constants::SESSION_COOKIE_NAME;
use neighborly_service::auth::depot::get_session_token_from_depot;
use neighborly_service::auth::login;

use super::support::{context, json_body};
use crate::config::get_config_from_depot;
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
struct CodeRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    email: String,
    code: String,
}

/// POST /api/auth/code
///
/// ## Errors
/// 400 for a malformed email, 403 if the email is not whitelisted.
#[handler]
async fn request_code(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let body: CodeRequest = json_body(req).await?;
    let ctx = context(depot)?;

    login::request_login_code(&ctx, &body.email).await?;

    res.status_code(StatusCode::ACCEPTED);
    res.render(Json(json!({"status": "sent"})));
    Ok(())
}

/// POST /api/auth/verify
///
/// ## Side Effects
/// Sets the `session` cookie alongside the JSON token.
///
/// ## Errors
/// 401 for a wrong, expired or already used code, 403 if the email has been
/// removed from the allow list since the code was sent.
#[handler]
async fn verify_code(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let body: VerifyRequest = json_body(req).await?;
    let ctx = context(depot)?;
    let settings = get_config_from_depot(depot)?;

    let signed_in = login::verify_login_code(&ctx, &body.email, &body.code).await?;

    let cookie = Cookie::build((SESSION_COOKIE_NAME, signed_in.token.clone()))
        .path("/")
        .http_only(true)
        .secure(settings.auth.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(settings.auth.session_ttl_days))
        .build();
    res.add_cookie(cookie);
    res.render(Json(signed_in));
    Ok(())
}

/// POST /api/auth/sign-out
///
/// Revokes the presented session, if any, and clears the cookie.
#[handler]
async fn sign_out(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let ctx = context(depot)?;
    if let Some(token) = get_session_token_from_depot(depot) {
        login::sign_out(&ctx, token).await?;
    }

    res.add_cookie(
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .path("/")
            .http_only(true)
            .max_age(Duration::ZERO)
            .build(),
    );
    res.status_code(StatusCode::NO_CONTENT);
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("auth")
        .push(Router::with_path("code").post(request_code))
        .push(Router::with_path("verify").post(verify_code))
        .push(Router::with_path("sign-out").post(sign_out))
}
