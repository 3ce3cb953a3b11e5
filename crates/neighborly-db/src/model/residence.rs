use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::{enums::Street, schema};

/// A home in the directory.
///
/// `is_claimed` mirrors whether a user row points at this residence and is
/// only written in the same transaction as that link.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::residences)]
#[diesel(check_for_backend(Pg))]
pub struct Residence {
    pub id: uuid::Uuid,
    pub street_name: Street,
    pub address: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_claimed: bool,
    pub additional_details: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::residences)]
pub struct NewResidence {
    pub id: uuid::Uuid,
    pub street_name: Street,
    pub address: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

impl NewResidence {
    #[must_use]
    pub fn new(
        street_name: Street,
        address: String,
        last_name: String,
        phone_number: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            street_name,
            address,
            last_name,
            phone_number,
        }
    }
}

/// Administrator edit of a residence. `None` leaves a column unchanged;
/// `phone_number: Some(None)` clears the phone.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::residences)]
pub struct ResidenceChangeset {
    pub street_name: Option<Street>,
    pub address: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<Option<String>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ResidenceChangeset {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.street_name.is_none()
            && self.address.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
    }
}

/// Directory listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    pub street: Option<Street>,
    /// Case-insensitive substring of address or surname.
    pub search: Option<String>,
}

/// Merges `incoming` into the object `existing`, with incoming keys winning.
/// Non-object values on either side are treated as empty.
#[must_use]
pub fn merge_details(existing: &serde_json::Value, incoming: serde_json::Value) -> serde_json::Value {
    let mut merged = existing.as_object().cloned().unwrap_or_default();
    if let serde_json::Value::Object(incoming) = incoming {
        merged.extend(incoming);
    }
    serde_json::Value::Object(merged)
}
