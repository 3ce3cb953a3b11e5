use casbin::{CoreApi, MgmtApi};
use string_adapter::StringAdapter;

use crate::error::ServiceResult;

const MODEL: &str = include_str!("casbin_model.conf");
const POLICY: &str = include_str!("casbin_policy.csv");

/// ## Summary
/// Initialize a Casbin enforcer from the embedded model and policy.
///
/// The policy is static: it maps caller relations (resident, admin, creator,
/// member) to the actions they may take on each resource kind.
///
/// ## Errors
/// Returns an error if the model or policy fails to parse.
#[tracing::instrument]
pub async fn init_casbin() -> ServiceResult<casbin::Enforcer> {
    tracing::debug!("Initializing Casbin enforcer");

    let model = casbin::DefaultModel::from_str(MODEL).await?;
    tracing::debug!("Casbin model loaded");

    let adapter = StringAdapter::new(POLICY);
    let enforcer = casbin::Enforcer::new(model, adapter).await?;

    let policy_count = enforcer.get_policy().len();
    tracing::info!(policy_count, "Casbin enforcer initialized successfully");

    Ok(enforcer)
}
