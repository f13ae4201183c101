//! HTTP API handlers

pub mod activities;
pub mod dashboard;
pub mod groups;
pub mod health;
pub mod sentence_practice;
pub mod sessions;
pub mod settings;
pub mod words;

pub use activities::activity_routes;
pub use dashboard::dashboard_routes;
pub use groups::group_routes;
pub use health::health_routes;
pub use sentence_practice::sentence_practice_routes;
pub use sessions::session_routes;
pub use settings::settings_routes;
pub use words::word_routes;

use lp_common::pagination::PageRequest;
use serde::Deserialize;

/// `?page=&per_page=` for session listings
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn to_request(&self) -> lp_common::Result<PageRequest> {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

/// `?page=&per_page=&sort_by=&order=` for word and group listings
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// `{"message": ...}` acknowledgement body
#[derive(Debug, serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
}
