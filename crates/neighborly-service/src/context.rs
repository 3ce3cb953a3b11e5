use std::sync::Arc;

use neighborly_core::config::AuthConfig;
use neighborly_db::store::Store;

use crate::audit::AuditLogger;
use crate::auth::Authorizer;
use crate::auth::delivery::LoginCodeSender;

/// Everything a service operation needs: the store, the authorizer, the
/// auth settings and the login code sender.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn Store>,
    authorizer: Authorizer,
    auth: AuthConfig,
    sender: Arc<dyn LoginCodeSender>,
    audit: AuditLogger,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        authorizer: Authorizer,
        auth: AuthConfig,
        sender: Arc<dyn LoginCodeSender>,
    ) -> Self {
        let audit = AuditLogger::new(store.clone());
        Self {
            store,
            authorizer,
            auth,
            sender,
            audit,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    #[must_use]
    pub const fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    #[must_use]
    pub fn sender(&self) -> &dyn LoginCodeSender {
        self.sender.as_ref()
    }

    #[must_use]
    pub const fn audit(&self) -> &AuditLogger {
        &self.audit
    }
}
