use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// A signed-in neighbor. Email is stored lowercased and is unique.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: uuid::Uuid,
    pub email: String,
    pub phone_number: Option<String>,
    pub is_admin: bool,
    pub residence_id: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    pub id: uuid::Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl NewUser {
    #[must_use]
    pub fn new(email: String, is_admin: bool) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            email,
            is_admin,
        }
    }
}
