use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use neighborly_db::db::enums::CommunityItemKind;
use neighborly_service::community::{self, CommentInput, PostingInput};

use super::support::{json_body, path_id, render_created, render_done, render_mutation, session};
use crate::error::{AppError, AppResult};

#[handler]
async fn board(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, _caller) = session(depot)?;
    res.render(Json(community::community_board(&ctx).await?));
    Ok(())
}

#[handler]
async fn create_charitable(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: PostingInput = json_body(req).await?;
    render_created(res, community::create_charitable_item(&ctx, &caller, body).await?);
    Ok(())
}

#[handler]
async fn create_giveaway(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: PostingInput = json_body(req).await?;
    render_created(res, community::create_giveaway(&ctx, &caller, body).await?);
    Ok(())
}

#[handler]
async fn claim_giveaway(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_mutation(res, community::claim_giveaway(&ctx, &caller, id).await?);
    Ok(())
}

#[handler]
async fn create_help_request(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: PostingInput = json_body(req).await?;
    render_created(res, community::create_help_request(&ctx, &caller, body).await?);
    Ok(())
}

async fn delete_posting(
    req: &Request,
    depot: &Depot,
    res: &mut Response,
    kind: CommunityItemKind,
) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &community::delete_posting(&ctx, &caller, kind, id).await?);
    Ok(())
}

#[handler]
async fn delete_charitable(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    delete_posting(req, depot, res, CommunityItemKind::Charitable).await
}

#[handler]
async fn delete_giveaway(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    delete_posting(req, depot, res, CommunityItemKind::Giveaway).await
}

#[handler]
async fn delete_help_request(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    delete_posting(req, depot, res, CommunityItemKind::HelpRequest).await
}

/// GET /api/community/comments?item_type=&item_id=
#[handler]
async fn list_comments(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, _caller) = session(depot)?;
    let item_type = req
        .query::<String>("item_type")
        .ok_or_else(|| AppError::BadRequest("item_type is required".to_string()))?;
    let item_id = req
        .query::<String>("item_id")
        .ok_or_else(|| AppError::BadRequest("item_id is required".to_string()))?;
    let item_id = uuid::Uuid::parse_str(&item_id)
        .map_err(|e| AppError::BadRequest(format!("Invalid item_id: {e}")))?;

    res.render(Json(
        community::list_community_comments(&ctx, &item_type, item_id).await?,
    ));
    Ok(())
}

#[handler]
async fn add_comment(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: CommentInput = json_body(req).await?;
    render_created(res, community::add_community_comment(&ctx, &caller, body).await?);
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("community")
        .get(board)
        .push(
            Router::with_path("charitable")
                .post(create_charitable)
                .push(Router::with_path("{id}").delete(delete_charitable)),
        )
        .push(
            Router::with_path("giveaways").post(create_giveaway).push(
                Router::with_path("{id}")
                    .delete(delete_giveaway)
                    .push(Router::with_path("claim").post(claim_giveaway)),
            ),
        )
        .push(
            Router::with_path("help-requests")
                .post(create_help_request)
                .push(Router::with_path("{id}").delete(delete_help_request)),
        )
        .push(
            Router::with_path("comments")
                .get(list_comments)
                .post(add_comment),
        )
}
