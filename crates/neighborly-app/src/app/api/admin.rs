use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use neighborly_service::admin;

use super::support::session;
use crate::error::AppResult;

#[handler]
async fn dashboard(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    res.render(Json(admin::dashboard(&ctx, &caller).await?));
    Ok(())
}

/// GET /api/admin/audit-log?limit=
#[handler]
async fn audit_log(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let (ctx, caller) = session(depot)?;
    let limit = req.query::<i64>("limit");
    res.render(Json(admin::recent_audit_log(&ctx, &caller, limit).await?));
    Ok(())
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("admin")
        .push(Router::with_path("dashboard").get(dashboard))
        .push(Router::with_path("audit-log").get(audit_log))
}
