use std::path::Path;

use sqlx::{Error as SqlxError, SqlitePool};

use crate::{
    db,
    error::{CONTACTS_DUPLICATE_PHONE, CONTACTS_NOT_FOUND},
    model::{Contact, ContactInput},
    schema, AppError, AppResult,
};

const SELECT_COLUMNS: &str = "SELECT id, name, phone, email, address FROM contacts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Contact),
    DuplicatePhone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Contact),
    DuplicatePhone,
    NotFound,
}

impl AddOutcome {
    /// Turn a rejected insert into the error surfaced to the user.
    pub fn into_result(self) -> AppResult<Contact> {
        match self {
            AddOutcome::Added(contact) => Ok(contact),
            AddOutcome::DuplicatePhone => Err(duplicate_phone_error()),
        }
    }
}

impl UpdateOutcome {
    pub fn into_result(self, id: i64) -> AppResult<Contact> {
        match self {
            UpdateOutcome::Updated(contact) => Ok(contact),
            UpdateOutcome::DuplicatePhone => {
                Err(duplicate_phone_error().with_context("contact_id", id.to_string()))
            }
            UpdateOutcome::NotFound => Err(AppError::new(
                CONTACTS_NOT_FOUND,
                "That contact no longer exists.",
            )
            .with_context("contact_id", id.to_string())),
        }
    }
}

fn duplicate_phone_error() -> AppError {
    AppError::new(CONTACTS_DUPLICATE_PHONE, "Phone number already exists.")
}

fn is_unique_violation(err: &SqlxError) -> bool {
    matches!(err, SqlxError::Database(db) if db.is_unique_violation())
}

/// Escape LIKE wildcards so the term matches as a literal substring.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Owns the connection to the `contacts` table. Every operation commits on
/// its own; there is no multi-statement transaction.
#[derive(Debug, Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

impl ContactStore {
    pub async fn open(db_path: &Path) -> AppResult<Self> {
        let pool = db::open_sqlite_pool(db_path).await?;
        Self::from_pool(pool).await
    }

    pub async fn open_in_memory() -> AppResult<Self> {
        let pool = db::open_memory_pool().await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> AppResult<Self> {
        schema::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Close the underlying connection. Consumes the store so no operation
    /// can run afterwards.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!(target: "phonebook", event = "db_closed");
    }

    pub async fn add(&self, input: &ContactInput) -> AppResult<AddOutcome> {
        let result = sqlx::query(
            "INSERT INTO contacts (name, phone, email, address) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(input.email.as_deref())
        .bind(input.address.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                Ok(AddOutcome::Added(Contact {
                    id,
                    name: input.name.clone(),
                    phone: input.phone.clone(),
                    email: input.email.clone(),
                    address: input.address.clone(),
                }))
            }
            Err(err) if is_unique_violation(&err) => Ok(AddOutcome::DuplicatePhone),
            Err(err) => Err(AppError::from(err).with_context("operation", "contacts_add")),
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Option<Contact>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| AppError::from(err).with_context("operation", "contacts_get"))?;
        row.as_ref().map(Contact::from_row).transpose()
    }

    /// Every contact in ascending id order.
    pub async fn list_all(&self) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| AppError::from(err).with_context("operation", "contacts_list"))?;
        rows.iter().map(Contact::from_row).collect()
    }

    /// Contacts whose name or phone contains `term`. Matching follows SQLite
    /// `LIKE`, so ASCII letters compare case-insensitively.
    pub async fn search(&self, term: &str) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE name LIKE ?1 ESCAPE '\\' OR phone LIKE ?1 ESCAPE '\\' ORDER BY id"
        ))
        .bind(like_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| AppError::from(err).with_context("operation", "contacts_search"))?;
        rows.iter().map(Contact::from_row).collect()
    }

    /// Replace all mutable fields of `id`. Keeping the contact's own phone is
    /// not a conflict; taking another contact's phone is.
    pub async fn update(&self, id: i64, input: &ContactInput) -> AppResult<UpdateOutcome> {
        let result = sqlx::query(
            "UPDATE contacts SET name = ?1, phone = ?2, email = ?3, address = ?4 WHERE id = ?5",
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(input.email.as_deref())
        .bind(input.address.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(UpdateOutcome::NotFound),
            Ok(_) => Ok(UpdateOutcome::Updated(Contact {
                id,
                name: input.name.clone(),
                phone: input.phone.clone(),
                email: input.email.clone(),
                address: input.address.clone(),
            })),
            Err(err) if is_unique_violation(&err) => Ok(UpdateOutcome::DuplicatePhone),
            Err(err) => Err(AppError::from(err)
                .with_context("operation", "contacts_update")
                .with_context("contact_id", id.to_string())),
        }
    }

    /// Remove `id` if present. Returns whether a row was removed; an absent
    /// id is not an error.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let done = sqlx::query("DELETE FROM contacts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "contacts_delete")
                    .with_context("contact_id", id.to_string())
            })?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("555"), "%555%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn outcomes_map_to_coded_errors() {
        let err = AddOutcome::DuplicatePhone.into_result().unwrap_err();
        assert_eq!(err.code(), CONTACTS_DUPLICATE_PHONE);

        let err = UpdateOutcome::NotFound.into_result(9).unwrap_err();
        assert_eq!(err.code(), CONTACTS_NOT_FOUND);
        assert_eq!(err.context().get("contact_id"), Some(&"9".to_string()));
    }
}
