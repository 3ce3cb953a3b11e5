use chrono::NaiveDate;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use neighborly_service::calendar::{self, EventInput};

use super::support::{json_body, path_id, render_created, render_done, render_mutation, session};
use crate::error::{AppError, AppResult};

/// GET /api/events?from=YYYY-MM-DD
#[handler]
async fn list(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, _caller) = session(depot)?;
    let from = match req.query::<String>("from") {
        Some(raw) if !raw.trim().is_empty() => Some(
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| AppError::BadRequest(format!("Invalid from date: {e}")))?,
        ),
        _ => None,
    };
    res.render(Json(calendar::list_events(&ctx, from).await?));
    Ok(())
}

#[handler]
async fn create(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let body: EventInput = json_body(req).await?;
    render_created(res, calendar::create_event(&ctx, &caller, body).await?);
    Ok(())
}

#[handler]
async fn update(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    let body: EventInput = json_body(req).await?;
    render_mutation(res, calendar::update_event(&ctx, &caller, id, body).await?);
    Ok(())
}

#[handler]
async fn delete(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let id = path_id(req, "id")?;
    render_done(res, &calendar::delete_event(&ctx, &caller, id).await?);
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("events")
        .get(list)
        .post(create)
        .push(Router::with_path("{id}").put(update).delete(delete))
}
