use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;

use neighborly_service::allowed_email::{self, AllowedEmailInput};

use super::support::{json_body, path_id, render_created, render_done, render_mutation, session};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
struct BulkRequest {
    /// Addresses separated by commas, semicolons or newlines.
    emails: String,
}

#[handler]
async fn list(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    res.render(Json(allowed_email::list_allowed_emails(&ctx, &caller).await?));
    Ok(())
}

#[handler]
async fn add(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: AllowedEmailInput = json_body(req).await?;
    render_created(res, allowed_email::add_allowed_email(&ctx, &caller, body).await?);
    Ok(())
}

#[handler]
async fn bulk_add(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: BulkRequest = json_body(req).await?;
    render_mutation(
        res,
        allowed_email::bulk_add_allowed_emails(&ctx, &caller, &body.emails).await?,
    );
    Ok(())
}

#[handler]
async fn remove(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &allowed_email::remove_allowed_email(&ctx, &caller, id).await?);
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("allowed-emails")
        .get(list)
        .post(add)
        .push(Router::with_path("bulk").post(bulk_add))
        .push(Router::with_path("{id}").delete(remove))
}
