use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// Whitelist entry. Only listed emails may sign in or claim a residence.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::allowed_emails)]
#[diesel(check_for_backend(Pg))]
pub struct AllowedEmail {
    pub id: uuid::Uuid,
    pub email: String,
    /// When set, the holder may only claim this residence.
    pub residence_id: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::allowed_emails)]
pub struct NewAllowedEmail {
    pub id: uuid::Uuid,
    pub email: String,
    pub residence_id: Option<uuid::Uuid>,
}

impl NewAllowedEmail {
    #[must_use]
    pub fn new(email: String, residence_id: Option<uuid::Uuid>) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            email,
            residence_id,
        }
    }
}
