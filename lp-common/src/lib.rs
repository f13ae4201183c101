//! # Language Portal Common Library
//!
//! Core of the Korean vocabulary portal shared by the HTTP server and the
//! `lp-db` administration tool:
//! - Database schema and entity access (words, groups, activities, sessions)
//! - Corpus seeding and store resets
//! - Study session and review recording
//! - Dashboard aggregation
//! - Paginated read queries
//! - Configuration loading

pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod pagination;
pub mod queries;
pub mod recorder;
pub mod seed;
pub mod time;

pub use db::Database;
pub use error::{Error, ErrorKind, Result};
