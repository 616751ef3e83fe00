use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use crate::AppResult;

/// One stored contact. `id` is assigned by the store and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Contact {
    pub(crate) fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Contact {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
        })
    }

    /// The list line shown for this contact.
    pub fn display_line(&self) -> String {
        format!(
            "ID: {}, Name: {}, Phone: {}, Email: {}, Address: {}",
            self.id,
            self.name,
            self.phone,
            self.email.as_deref().unwrap_or(""),
            self.address.as_deref().unwrap_or("")
        )
    }
}

/// The mutable fields of a contact as submitted by `add` and `update`.
///
/// The store does not check `name` and `phone` for emptiness; callers do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ContactInput {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: Option<&str>,
        address: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.map(str::to_string),
            address: address.map(str::to_string),
        }
    }

    /// Trim every field and drop blank optional fields.
    pub fn normalized(name: &str, phone: &str, email: &str, address: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            email: non_blank(email),
            address: non_blank(address),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
