use salvo::async_trait;

use crate::error::AppResult;
use neighborly_core::error::CoreError;
use neighborly_service::context::ServiceContext;

/// Injects the shared [`ServiceContext`] into every request's depot.
pub struct ServiceContextHandler {
    pub context: ServiceContext,
}

#[async_trait]
impl salvo::Handler for ServiceContextHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.context.clone());
    }
}

/// ## Summary
/// Retrieves the service context from the depot.
///
/// ## Errors
/// Returns an error if the service context is not found in the depot.
pub fn get_context_from_depot(depot: &salvo::Depot) -> AppResult<ServiceContext> {
    depot
        .obtain::<ServiceContext>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Service context not found in depot").into())
}
