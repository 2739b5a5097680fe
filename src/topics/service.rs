//! Topic operations: compose the store with the scheduler.
//!
//! Every function takes the store handle and "today" explicitly, so a
//! request handler is just: read clock, call one of these, render.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use super::model::{ReviewAction, Topic, normalize_title, parse_date};
use super::scheduler;
use crate::error::TopicError;
use crate::store::TopicStore;

/// Offset used when backfilling legacy rows without a review date.
pub const BACKFILL_OFFSET_DAYS: i64 = 1;

/// Shown when the due list cannot be loaded.
pub const DUE_LIST_ADVISORY: &str =
    "Could not load topics for review. Visit /init-db or /migrate-db to set up the database.";

/// Result of the due-list query.
///
/// Storage faults never escape this query; they become `Unavailable`.
#[derive(Debug, Clone)]
pub enum DueList {
    Topics { topics: Vec<Topic> },
    Unavailable { advisory: String },
}

impl DueList {
    /// Topics to display (empty when unavailable).
    pub fn topics(&self) -> &[Topic] {
        match self {
            DueList::Topics { topics } => topics,
            DueList::Unavailable { .. } => &[],
        }
    }

    /// Message to show the user, if any.
    pub fn advisory(&self) -> Option<&str> {
        match self {
            DueList::Topics { .. } => None,
            DueList::Unavailable { advisory } => Some(advisory),
        }
    }
}

/// Record a topic studied today.
pub async fn add_topic(
    store: &dyn TopicStore,
    title: &str,
    description: Option<&str>,
    today: NaiveDate,
) -> Result<Topic, TopicError> {
    let next = scheduler::on_create(today, today);
    let topic = store.create(title, description, today, next).await?;
    info!(topic_id = %topic.id, title = %topic.title, next_review = %next, "Topic added");
    Ok(topic)
}

/// Record a topic that was studied on an earlier day but never entered.
pub async fn add_missing_topic(
    store: &dyn TopicStore,
    title: &str,
    description: Option<&str>,
    date_added: &str,
    today: NaiveDate,
) -> Result<Topic, TopicError> {
    let date_added = parse_date(date_added)?;
    if date_added > today {
        return Err(TopicError::Validation(format!(
            "Date added {date_added} is in the future"
        )));
    }
    let title = normalize_title(title)?;

    let next = scheduler::on_create(date_added, today);
    let topic = store.create(&title, description, date_added, next).await?;
    info!(
        topic_id = %topic.id,
        date_added = %date_added,
        next_review = %next,
        "Missing topic added"
    );
    Ok(topic)
}

/// Apply a review outcome and persist the new date.
pub async fn review(
    store: &dyn TopicStore,
    id: Uuid,
    action: ReviewAction,
    today: NaiveDate,
) -> Result<Topic, TopicError> {
    let mut topic = store.get(id).await?;
    let next = scheduler::next_review(action, topic.next_review_date, today);
    store.update_next_review(id, next).await?;
    info!(
        topic_id = %id,
        action = %action,
        previous = ?topic.next_review_date,
        next_review = %next,
        "Topic reviewed"
    );
    topic.next_review_date = Some(next);
    Ok(topic)
}

/// Topics due on `today`, failing soft on storage faults.
pub async fn due_list(store: &dyn TopicStore, today: NaiveDate) -> DueList {
    match store.list_due(today).await {
        Ok(topics) => DueList::Topics { topics },
        Err(e) => {
            warn!(error = %e, "Due list unavailable");
            DueList::Unavailable {
                advisory: DUE_LIST_ADVISORY.to_string(),
            }
        }
    }
}

/// Create the schema if it does not exist yet.
pub async fn init_database(store: &dyn TopicStore) -> Result<(), TopicError> {
    store.run_migrations().await?;
    Ok(())
}

/// Bring the schema up to date and give legacy rows a review date.
pub async fn migrate_database(store: &dyn TopicStore, today: NaiveDate) -> Result<usize, TopicError> {
    store.run_migrations().await?;
    let count = store
        .backfill_missing_next_review(today, BACKFILL_OFFSET_DAYS)
        .await?;
    Ok(count)
}
