//! Topic data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TopicError;

/// Wire/storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A subject the user wants to review periodically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique ID.
    pub id: Uuid,
    /// Short title, never empty.
    pub title: String,
    /// Optional notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Day the topic was first studied.
    pub date_added: NaiveDate,
    /// Day the topic next becomes due. `None` only for legacy rows.
    pub next_review_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    /// Whether the topic is due on `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date.is_some_and(|next| next <= today)
    }
}

/// Trim a title and reject it if nothing is left.
pub fn normalize_title(title: &str) -> Result<String, TopicError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TopicError::Validation("Title is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Blank descriptions are stored as absent.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Parse a `YYYY-MM-DD` date from form input.
pub fn parse_date(input: &str) -> Result<NaiveDate, TopicError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|e| TopicError::InvalidDate {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Outcome of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Remembered it; grow the interval.
    Good,
    /// Forgot it; back to one day.
    Again,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Good => "good",
            ReviewAction::Again => "again",
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewAction {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "good" => Ok(ReviewAction::Good),
            "again" => Ok(ReviewAction::Again),
            other => Err(TopicError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn topic(next: Option<NaiveDate>) -> Topic {
        Topic {
            id: Uuid::new_v4(),
            title: "Ownership".into(),
            description: None,
            date_added: date("2026-01-01"),
            next_review_date: next,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn title_is_trimmed() {
        assert_eq!(normalize_title("  Lifetimes \n").unwrap(), "Lifetimes");
    }

    #[test]
    fn blank_title_rejected() {
        assert!(matches!(normalize_title("   "), Err(TopicError::Validation(_))));
        assert!(matches!(normalize_title(""), Err(TopicError::Validation(_))));
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(normalize_description(Some("  ")), None);
        assert_eq!(normalize_description(None), None);
        assert_eq!(normalize_description(Some(" notes ")), Some("notes".into()));
    }

    #[test]
    fn parse_date_accepts_iso() {
        assert_eq!(parse_date("2026-03-09").unwrap(), date("2026-03-09"));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("09/03/2026").unwrap_err();
        assert!(matches!(err, TopicError::InvalidDate { ref input, .. } if input == "09/03/2026"));
    }

    #[test]
    fn due_requires_next_review_date() {
        let today = date("2026-02-01");
        assert!(!topic(None).is_due(today));
        assert!(topic(Some(today)).is_due(today));
        assert!(topic(Some(date("2026-01-20"))).is_due(today));
        assert!(!topic(Some(date("2026-02-02"))).is_due(today));
    }

    #[test]
    fn review_action_parses() {
        assert_eq!("good".parse::<ReviewAction>().unwrap(), ReviewAction::Good);
        assert_eq!("AGAIN".parse::<ReviewAction>().unwrap(), ReviewAction::Again);
        assert!("later".parse::<ReviewAction>().is_err());
    }

    #[test]
    fn review_action_serializes_snake_case() {
        let json = serde_json::to_string(&ReviewAction::Again).unwrap();
        assert_eq!(json, "\"again\"");
    }
}
