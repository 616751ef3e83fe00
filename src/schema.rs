use sqlx::{Executor, SqlitePool};

use crate::AppResult;

pub const CONTACTS_DDL: &str = "CREATE TABLE IF NOT EXISTS contacts (\
     id INTEGER PRIMARY KEY AUTOINCREMENT,\
     name TEXT NOT NULL,\
     phone TEXT NOT NULL UNIQUE,\
     email TEXT,\
     address TEXT\
   )";

/// Create the contacts table if it is missing. Runs on every open; there are
/// no migrations beyond this.
pub async fn ensure_schema(pool: &SqlitePool) -> AppResult<()> {
    pool.execute(CONTACTS_DDL).await?;
    tracing::debug!(target: "phonebook", event = "schema_ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_pool;

    #[tokio::test]
    async fn ensure_schema_is_idempotent() -> AppResult<()> {
        let pool = open_memory_pool().await?;
        ensure_schema(&pool).await?;
        ensure_schema(&pool).await?;

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('contacts') ORDER BY cid")
                .fetch_all(&pool)
                .await?;
        assert_eq!(columns, ["id", "name", "phone", "email", "address"]);
        Ok(())
    }

    #[tokio::test]
    async fn uses_autoincrement_sequence() -> AppResult<()> {
        let pool = open_memory_pool().await?;
        ensure_schema(&pool).await?;
        let has_sequence: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE name = 'sqlite_sequence'")
                .fetch_optional(&pool)
                .await?;
        assert_eq!(has_sequence, Some(1));
        Ok(())
    }
}
