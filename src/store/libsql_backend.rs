//! libSQL backend: async `TopicStore` implementation.
//!
//! Supports local file, in-memory and remote libSQL databases. A single
//! connection is opened at startup and reused for every request.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::TopicStore;
use crate::topics::model::{DATE_FORMAT, Topic, normalize_description, normalize_title};

/// libSQL database backend.
///
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open whichever backend the config names and run migrations.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config {
            DatabaseConfig::Local(path) => Self::new_local(path).await,
            DatabaseConfig::Memory => Self::new_memory().await,
            DatabaseConfig::Remote { url, auth_token } => {
                Self::new_remote(url, auth_token.expose_secret()).await
            }
        }
    }

    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    /// Connect to a remote libSQL server.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to connect to {url}: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(url = url, "Remote database connected");
        Ok(backend)
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn query_topics(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        context: &str,
    ) -> Result<Vec<Topic>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?;

        let mut topics = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => match row_to_topic(&row) {
                    Ok(topic) => topics.push(topic),
                    Err(e) => warn!("Skipping topic row: {e}"),
                },
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("{context}: {e}"))),
            }
        }
        Ok(topics)
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Read a column that must hold text.
///
/// Legacy tables can carry INTEGER ids or other non-text values; those
/// become a `Query` error instead of reaching libsql's typed getters.
fn text_column(row: &libsql::Row, idx: i32, column: &str) -> Result<String, DatabaseError> {
    match optional_text_column(row, idx, column)? {
        Some(s) => Ok(s),
        None => Err(DatabaseError::Query(format!("{column} is NULL"))),
    }
}

/// Read a nullable text column.
fn optional_text_column(
    row: &libsql::Row,
    idx: i32,
    column: &str,
) -> Result<Option<String>, DatabaseError> {
    match row
        .get_value(idx)
        .map_err(|e| DatabaseError::Query(format!("{column}: {e}")))?
    {
        libsql::Value::Text(s) => Ok(Some(s)),
        libsql::Value::Null => Ok(None),
        libsql::Value::Integer(n) => Err(DatabaseError::Query(format!(
            "{column} holds integer {n}, expected text"
        ))),
        other => Err(DatabaseError::Query(format!(
            "{column} holds {other:?}, expected text"
        ))),
    }
}

/// Map a libsql Row to a Topic.
///
/// Column order matches TOPIC_COLUMNS:
/// 0:id, 1:title, 2:description, 3:date_added, 4:next_review_date, 5:created_at, 6:updated_at
fn row_to_topic(row: &libsql::Row) -> Result<Topic, DatabaseError> {
    let id_str = text_column(row, 0, "topic id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Query(format!("topic id {id_str:?}: {e}")))?;
    let title = text_column(row, 1, &format!("topic {id} title"))?;
    let description = optional_text_column(row, 2, &format!("topic {id} description"))?;
    let date_added_str = text_column(row, 3, &format!("topic {id} date_added"))?;
    let date_added = parse_date(&date_added_str).ok_or_else(|| {
        DatabaseError::Query(format!("topic {id} date_added {date_added_str:?} is not a date"))
    })?;
    let next_review_date = optional_text_column(row, 4, &format!("topic {id} next_review_date"))?
        .and_then(|s| parse_date(&s));
    let created_str = optional_text_column(row, 5, &format!("topic {id} created_at"))?;
    let updated_str = optional_text_column(row, 6, &format!("topic {id} updated_at"))?;

    Ok(Topic {
        id,
        title,
        description,
        date_added,
        next_review_date,
        created_at: parse_datetime(created_str.as_deref().unwrap_or_default()),
        updated_at: parse_datetime(updated_str.as_deref().unwrap_or_default()),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const TOPIC_COLUMNS: &str =
    "id, title, description, date_added, next_review_date, created_at, updated_at";

#[async_trait]
impl TopicStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        date_added: NaiveDate,
        next_review_date: NaiveDate,
    ) -> Result<Topic, DatabaseError> {
        let title = normalize_title(title).map_err(|e| DatabaseError::Validation(e.to_string()))?;
        let description = normalize_description(description);
        let now = Utc::now();
        let topic = Topic {
            id: Uuid::new_v4(),
            title,
            description,
            date_added,
            next_review_date: Some(next_review_date),
            created_at: now,
            updated_at: now,
        };

        self.conn()
            .execute(
                "INSERT INTO topics (id, title, description, date_added, next_review_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    topic.id.to_string(),
                    topic.title.clone(),
                    opt_text_owned(topic.description.clone()),
                    format_date(date_added),
                    format_date(next_review_date),
                    now.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create topic: {e}")))?;

        debug!(topic_id = %topic.id, next_review = %next_review_date, "Topic inserted into DB");
        Ok(topic)
    }

    async fn get(&self, id: Uuid) -> Result<Topic, DatabaseError> {
        self.query_topics(
            &format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?1"),
            params![id.to_string()],
            "get topic",
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "topic".into(),
            id: id.to_string(),
        })
    }

    async fn list_due(&self, as_of: NaiveDate) -> Result<Vec<Topic>, DatabaseError> {
        self.query_topics(
            &format!(
                "SELECT {TOPIC_COLUMNS} FROM topics
                 WHERE next_review_date IS NOT NULL AND next_review_date <= ?1
                 ORDER BY next_review_date ASC, date_added ASC"
            ),
            params![format_date(as_of)],
            "list_due",
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<Topic>, DatabaseError> {
        self.query_topics(
            &format!("SELECT {TOPIC_COLUMNS} FROM topics ORDER BY date_added DESC, created_at DESC"),
            (),
            "list_all",
        )
        .await
    }

    async fn update_next_review(&self, id: Uuid, date: NaiveDate) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let count = self
            .conn()
            .execute(
                "UPDATE topics SET next_review_date = ?1, updated_at = ?2 WHERE id = ?3",
                params![format_date(date), now, id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_next_review: {e}")))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "topic".into(),
                id: id.to_string(),
            });
        }
        debug!(topic_id = %id, next_review = %date, "Topic next review updated in DB");
        Ok(())
    }

    async fn backfill_missing_next_review(
        &self,
        today: NaiveDate,
        default_offset_days: i64,
    ) -> Result<usize, DatabaseError> {
        let target = today + Duration::days(default_offset_days);
        let now = Utc::now().to_rfc3339();
        let count = self
            .conn()
            .execute(
                "UPDATE topics SET next_review_date = ?1, updated_at = ?2 WHERE next_review_date IS NULL",
                params![format_date(target), now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("backfill_missing_next_review: {e}")))?;

        if count > 0 {
            info!(count, next_review = %target, "Backfilled missing next_review_date");
        }
        Ok(count as usize)
    }
}
