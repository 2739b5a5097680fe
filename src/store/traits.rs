//! `TopicStore` trait: single async interface for topic persistence.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::topics::model::Topic;

/// Backend-agnostic topic storage.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Insert a new topic. Fails with `Validation` if the trimmed title is empty.
    async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        date_added: NaiveDate,
        next_review_date: NaiveDate,
    ) -> Result<Topic, DatabaseError>;

    /// Get a topic by ID. Fails with `NotFound` if absent.
    async fn get(&self, id: Uuid) -> Result<Topic, DatabaseError>;

    /// Topics whose `next_review_date` is set and on or before `as_of`,
    /// oldest due date first.
    async fn list_due(&self, as_of: NaiveDate) -> Result<Vec<Topic>, DatabaseError>;

    /// Every topic, most recently added first.
    async fn list_all(&self) -> Result<Vec<Topic>, DatabaseError>;

    /// Overwrite a topic's `next_review_date`. Fails with `NotFound` if absent.
    async fn update_next_review(&self, id: Uuid, date: NaiveDate) -> Result<(), DatabaseError>;

    /// Set `next_review_date = today + default_offset_days` on every topic
    /// that lacks one. Returns the number of rows touched.
    async fn backfill_missing_next_review(
        &self,
        today: NaiveDate,
        default_offset_days: i64,
    ) -> Result<usize, DatabaseError>;
}
