//! Directory listing and administrator residence upkeep.

use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use neighborly_service::residence::{self, ResidenceInput, ResidenceUpdate};

use super::support::{
    json_body, path_id, render_created, render_done, render_mutation, session,
};
use crate::error::AppResult;

/// GET /api/directory?street=&search=
#[handler]
async fn directory(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let street = req.query::<String>("street");
    let search = req.query::<String>("search");

    let rows =
        residence::list_directory(&ctx, &caller, street.as_deref(), search.as_deref()).await?;
    res.render(Json(rows));
    Ok(())
}

#[handler]
async fn create(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: ResidenceInput = json_body(req).await?;
    render_created(res, residence::create_residence(&ctx, &caller, body).await?);
    Ok(())
}

#[handler]
async fn update(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    let body: ResidenceUpdate = json_body(req).await?;
    render_mutation(res, residence::update_residence(&ctx, &caller, id, body).await?);
    Ok(())
}

#[handler]
async fn delete(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &residence::delete_residence(&ctx, &caller, id).await?);
    Ok(())
}

#[handler]
async fn release(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_mutation(res, residence::release_residence(&ctx, &caller, id).await?);
    Ok(())
}

#[must_use]
pub fn directory_routes() -> Router {
    Router::with_path("directory").get(directory)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("residences").post(create).push(
        Router::with_path("{id}")
            .put(update)
            .delete(delete)
            .push(Router::with_path("release").post(release)),
    )
}
