use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;

use neighborly_service::profile;
use neighborly_service::residence::{ClaimRequest, claim_residence};

use super::support::{json_body, render_mutation, session};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
struct PhoneRequest {
    #[serde(default)]
    phone_number: Option<String>,
}

#[handler]
async fn get_profile(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    res.render(Json(profile::get_profile(&ctx, &caller).await?));
    Ok(())
}

#[handler]
async fn update_phone(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: PhoneRequest = json_body(req).await?;
    let mutation = profile::update_phone(&ctx, &caller, body.phone_number.as_deref()).await?;
    render_mutation(res, mutation);
    Ok(())
}

/// POST /api/profile/claim
///
/// ## Errors
/// 403 if the caller may not claim this residence, 409 if the caller or the
/// residence is already linked, 404 for an unknown residence.
#[handler]
async fn claim(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: ClaimRequest = json_body(req).await?;
    render_mutation(res, claim_residence(&ctx, &caller, body).await?);
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("profile")
        .get(get_profile)
        .push(Router::with_path("phone").put(update_phone))
        .push(Router::with_path("claim").post(claim))
}
