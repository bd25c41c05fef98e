//! # Tasklane Shared Library
//!
//! Domain core of the Tasklane task-management backend, used by the API
//! server and its tests.
//!
//! ## Module Organization
//!
//! - `error`: the service error taxonomy and its code/status mapping
//! - `auth`: password hashing, token service, bearer extraction
//! - `db`: storage traits, PostgreSQL and in-memory stores, pool, migrations
//! - `models`: users and tasks, with their public views
//! - `validation`: request payload checks and normalization
//! - `services`: Identity and Task services

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod validation;

/// Current version of the Tasklane shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
