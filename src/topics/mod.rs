//! Topic model, review scheduler and HTTP surface.

pub mod model;
pub mod routes;
pub mod scheduler;
pub mod service;
pub mod views;

pub use model::{ReviewAction, Topic};
pub use routes::{AppState, topic_routes};
pub use service::DueList;
