use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// Outstanding one-time sign-in code. Only the hash is stored.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::login_codes)]
#[diesel(check_for_backend(Pg))]
pub struct LoginCode {
    pub email: String,
    pub code_hash: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Wrong guesses made against this code.
    pub attempts: i32,
}

/// Session keyed by the SHA-256 of the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::sessions)]
#[diesel(check_for_backend(Pg))]
pub struct Session {
    pub token_hash: String,
    pub user_id: uuid::Uuid,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
