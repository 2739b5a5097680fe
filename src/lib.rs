//! Study Tracker: spaced-repetition review scheduling for study topics.

pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod topics;
