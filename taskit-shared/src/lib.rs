//! # Taskit Shared Library
//!
//! This crate contains the data layer and authentication primitives used by
//! the Taskit API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, session tokens, tasks)
//! - `auth`: Password hashing, JWT handling and bearer-token authentication
//! - `db`: Connection pool and migrations
//! - `mail`: Transactional email delivery

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the Taskit shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
