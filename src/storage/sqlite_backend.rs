use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::{debug, info, instrument};

use crate::{
    error::{AppError, Result},
    storage::{Ack, AppendOnlyStore, validate_identifier},
};

/// SQLite implementation of the AppendOnlyStore trait
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a pool for `url`, creating the database file if needed.
    /// In-memory databases get a single connection so every query sees the
    /// same database.
    #[instrument(err)]
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Opening activity database at: {}", url);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the activity table if it doesn't exist. The store assigns
    /// `created_at`.
    #[instrument(err, skip(self))]
    pub async fn ensure_table(&self, table: &str) -> Result<()> {
        validate_identifier(table)?;
        let ddl = format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                user_id TEXT,
                user_email TEXT,
                details TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )"#
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }
}

/// Bind one JSON value with the closest SQLite type
fn push_json_bind(qb: &mut QueryBuilder<'_, Sqlite>, value: serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Null => {
            qb.push_bind(Option::<String>::None);
        }
        Value::Bool(b) => {
            qb.push_bind(b);
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                qb.push_bind(i);
            }
            None => {
                qb.push_bind(n.as_f64());
            }
        },
        Value::String(s) => {
            qb.push_bind(s);
        }
        other @ (Value::Array(_) | Value::Object(_)) => {
            qb.push_bind(other.to_string());
        }
    }
}

#[async_trait]
impl AppendOnlyStore for SqliteStore {
    #[instrument(err, skip(self, record), fields(store = "sqlite"))]
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<Ack> {
        validate_identifier(table)?;
        let serde_json::Value::Object(fields) = record else {
            return Err(AppError::InvalidRecord("expected a JSON object".to_string()));
        };
        if fields.is_empty() {
            return Err(AppError::InvalidRecord("record has no fields".to_string()));
        }
        for column in fields.keys() {
            validate_identifier(column)?;
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(r#"INSERT INTO "{table}" ("#));
        let mut columns = qb.separated(", ");
        for column in fields.keys() {
            columns.push(format!(r#""{column}""#));
        }
        qb.push(") VALUES (");
        for (i, value) in fields.into_iter().map(|(_, v)| v).enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_json_bind(&mut qb, value);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        debug!(rows = result.rows_affected(), "Insert accepted");
        Ok(Ack {
            rows_affected: result.rows_affected(),
        })
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
