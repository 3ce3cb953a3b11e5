use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;

use neighborly_service::club::{self, ClubInput, ClubPostInput};

use super::support::{json_body, path_id, render_created, render_done, session};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
}

#[handler]
async fn list(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    res.render(Json(club::list_clubs(&ctx, &caller).await?));
    Ok(())
}

#[handler]
async fn detail(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    res.render(Json(club::club_detail(&ctx, &caller, id).await?));
    Ok(())
}

#[handler]
async fn create(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: ClubInput = json_body(req).await?;
    render_created(res, club::create_club(&ctx, &caller, body).await?);
    Ok(())
}

#[handler]
async fn delete(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &club::delete_club(&ctx, &caller, id).await?);
    Ok(())
}

#[handler]
async fn join(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &club::join_club(&ctx, &caller, id).await?);
    Ok(())
}

#[handler]
async fn leave(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &club::leave_club(&ctx, &caller, id).await?);
    Ok(())
}

/// POST /api/clubs/{id}/posts
///
/// ## Errors
/// 403 unless the caller is a member of the club.
#[handler]
async fn create_post(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    let body: ClubPostInput = json_body(req).await?;
    render_created(res, club::create_club_post(&ctx, &caller, id, body).await?);
    Ok(())
}

#[handler]
async fn comment(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let post_id = path_id(req, "id")?;
    let body: CommentRequest = json_body(req).await?;
    render_created(
        res,
        club::add_club_post_comment(&ctx, &caller, post_id, &body.content).await?,
    );
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("clubs").get(list).post(create).push(
        Router::with_path("{id}")
            .get(detail)
            .delete(delete)
            .push(Router::with_path("join").post(join))
            .push(Router::with_path("leave").post(leave))
            .push(Router::with_path("posts").post(create_post)),
    )
}

#[must_use]
pub fn post_routes() -> Router {
    Router::with_path("club-posts/{id}/comments").post(comment)
}
