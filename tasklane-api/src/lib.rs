//! # Tasklane API Server Library
//!
//! HTTP surface of the Tasklane task-management backend.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error envelope and HTTP response mapping
//! - `extract`: Validated body and path extractors
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
