//! # Taskit API Server Library
//!
//! Core of the Taskit REST API: accounts with bearer-token sessions,
//! avatars, and per-user task lists.
//!
//! ## Modules
//!
//! - `app`: Application state, router and authentication layer
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
