#![allow(clippy::expect_used)]

use std::sync::Arc;

use neighborly_core::config::AuthConfig;
use neighborly_db::db::enums::Street;
use neighborly_db::model::allowed_email::NewAllowedEmail;
use neighborly_db::model::residence::{NewResidence, Residence};
use neighborly_db::model::user::{NewUser, User};
use neighborly_db::store::MemoryStore;
use neighborly_db::store::prelude::*;

use crate::auth::Authorizer;
use crate::auth::casbin::init_casbin;
use crate::auth::delivery::RecordingCodeSender;
use crate::context::ServiceContext;

pub const BOOTSTRAP_ADMIN: &str = "root@example.com";

/// Unsaved user value for pure checks.
pub fn user(email: &str) -> User {
    let now = chrono::Utc::now();
    User {
        id: uuid::Uuid::now_v7(),
        email: email.to_string(),
        phone_number: None,
        is_admin: false,
        residence_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub sender: Arc<RecordingCodeSender>,
    pub ctx: ServiceContext,
}

impl TestHarness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let sender = Arc::new(RecordingCodeSender::new());
        let enforcer = init_casbin().await.expect("enforcer");
        let auth = AuthConfig {
            bootstrap_admins: vec![BOOTSTRAP_ADMIN.to_string()],
            ..AuthConfig::default()
        };
        let ctx = ServiceContext::new(
            store.clone(),
            Authorizer::new(Arc::new(enforcer)),
            auth,
            sender.clone(),
        );
        Self { store, sender, ctx }
    }

    /// Like [`TestHarness::new`] with the bootstrap admin seeded, as at
    /// server start-up.
    pub async fn seeded() -> Self {
        let h = Self::new().await;
        crate::whitelist::seed_bootstrap_admins(&h.ctx)
            .await
            .expect("seed bootstrap admins");
        h
    }

    /// Whitelists `email` and stores a user for it.
    pub async fn resident(&self, email: &str) -> User {
        self.store
            .insert_allowed_email(NewAllowedEmail::new(email.to_string(), None))
            .await
            .expect("whitelist");
        self.store
            .create_user(NewUser::new(email.to_string(), false))
            .await
            .expect("user")
    }

    pub async fn admin(&self, email: &str) -> User {
        self.store
            .create_user(NewUser::new(email.to_string(), true))
            .await
            .expect("admin")
    }

    pub async fn residence(&self, address: &str, last_name: &str) -> Residence {
        self.store
            .create_residence(NewResidence::new(
                Street::SymorDr,
                address.to_string(),
                last_name.to_string(),
                None,
            ))
            .await
            .expect("residence")
    }

    /// Reloads a user after a mutation.
    pub async fn reload(&self, user: &User) -> User {
        self.store
            .user_by_id(user.id)
            .await
            .expect("load")
            .expect("user exists")
    }
}
