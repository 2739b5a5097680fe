//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.
//! On first run against a legacy DB (`topics` exists, no `_migrations`
//! table), it inspects the existing columns and seeds the versions that
//! are already in place instead of re-running their DDL.
//!
//! Databases written by the Flask version of the app keep their rows in a
//! `topic` table with INTEGER ids. Those rows are copied into `topics`
//! under fresh UUIDs with no `next_review_date`, so that the backfill step
//! schedules them.

use chrono::NaiveDate;
use libsql::Connection;
use tracing::warn;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::topics::model::DATE_FORMAT;

/// Table used by the Flask-SQLAlchemy `Topic` model.
const FLASK_TOPIC_TABLE: &str = "topic";

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL CHECK (length(trim(title)) > 0),
                description TEXT,
                date_added TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_topics_date_added ON topics(date_added);
        "#,
    },
    Migration {
        version: 2,
        name: "next_review_date",
        sql: r#"
            ALTER TABLE topics ADD COLUMN next_review_date TEXT;
            CREATE INDEX IF NOT EXISTS idx_topics_next_review ON topics(next_review_date);
        "#,
    },
];

/// Latest schema version known to this build.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Run all pending migrations against the given connection.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let mut current_version = get_current_version(conn).await?;
    let adopt_flask_rows = current_version == 0
        && table_exists(conn, FLASK_TOPIC_TABLE).await?
        && !table_exists(conn, "topics").await?;

    // Legacy DB: the table predates version tracking.
    if current_version == 0 && table_exists(conn, "topics").await? {
        // Older rows lack the bookkeeping timestamps.
        for column in ["created_at", "updated_at"] {
            if !column_exists(conn, "topics", column).await? {
                conn.execute(
                    &format!("ALTER TABLE topics ADD COLUMN {column} TEXT NOT NULL DEFAULT ''"),
                    (),
                )
                .await
                .map_err(|e| {
                    DatabaseError::Migration(format!("Failed to add {column} to legacy topics: {e}"))
                })?;
            }
        }
        seed_version(conn, 1, "initial_schema").await?;
        current_version = 1;

        if column_exists(conn, "topics", "next_review_date").await? {
            seed_version(conn, 2, "next_review_date").await?;
            current_version = 2;
        }
        tracing::info!(version = current_version, "Legacy database detected, seeded migrations");
    }

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    if adopt_flask_rows {
        let copied = copy_flask_topics(conn).await?;
        tracing::info!(copied, "Adopted topics from Flask `topic` table");
    }

    tracing::info!(
        "Database migrations complete (at V{})",
        get_current_version(conn).await?
    );
    Ok(())
}

/// Get the highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => row.get::<i64>(0).map_err(|e| {
            DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
        }),
        None => Ok(0),
    }
}

async fn table_exists(conn: &Connection, table: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            libsql::params![table],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to check for table {table}: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) > 0),
        Ok(None) => Ok(false),
        Err(e) => Err(DatabaseError::Query(format!("Failed to check for table {table}: {e}"))),
    }
}

async fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            libsql::params![table, column],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to inspect {table}.{column}: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) > 0),
        Ok(None) => Ok(false),
        Err(e) => Err(DatabaseError::Query(format!("Failed to inspect {table}.{column}: {e}"))),
    }
}

/// A row read from the Flask `topic` table.
struct FlaskTopic {
    legacy_id: String,
    title: String,
    description: Option<String>,
    date_added: String,
}

/// Copy every usable row of the Flask `topic` table into `topics`.
///
/// Rows with a blank title or an unreadable `date_added` are skipped with a
/// warning. The source table is left in place.
async fn copy_flask_topics(conn: &Connection) -> Result<usize, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT id, title, description, date_added FROM topic ORDER BY id",
            (),
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read Flask topics: {e}")))?;

    let mut legacy = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read Flask topics: {e}")))?
    {
        let value = |idx: i32| {
            row.get_value(idx)
                .map_err(|e| DatabaseError::Migration(format!("Failed to read Flask topic: {e}")))
        };
        let legacy_id = match value(0)? {
            libsql::Value::Integer(n) => n.to_string(),
            libsql::Value::Text(s) => s,
            other => format!("{other:?}"),
        };
        let text = |v: libsql::Value| match v {
            libsql::Value::Text(s) => Some(s),
            _ => None,
        };
        legacy.push(FlaskTopic {
            legacy_id,
            title: text(value(1)?).unwrap_or_default(),
            description: text(value(2)?),
            date_added: text(value(3)?).unwrap_or_default(),
        });
    }

    let mut copied = 0;
    for topic in legacy {
        let title = topic.title.trim();
        if title.is_empty() {
            warn!(legacy_id = %topic.legacy_id, "Skipping Flask topic with blank title");
            continue;
        }
        let Ok(date_added) = NaiveDate::parse_from_str(topic.date_added.trim(), DATE_FORMAT) else {
            warn!(
                legacy_id = %topic.legacy_id,
                date_added = %topic.date_added,
                "Skipping Flask topic with unreadable date_added"
            );
            continue;
        };
        let description = topic
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        conn.execute(
            "INSERT INTO topics (id, title, description, date_added) VALUES (?1, ?2, ?3, ?4)",
            libsql::params![
                Uuid::new_v4().to_string(),
                title.to_string(),
                match description {
                    Some(d) => libsql::Value::Text(d),
                    None => libsql::Value::Null,
                },
                date_added.format(DATE_FORMAT).to_string(),
            ],
        )
        .await
        .map_err(|e| {
            DatabaseError::Migration(format!(
                "Failed to copy Flask topic {}: {e}",
                topic.legacy_id
            ))
        })?;
        copied += 1;
    }
    Ok(copied)
}

/// Insert a version record into `_migrations`.
async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}
