//! # Taskmate Shared Library
//!
//! This crate contains the types and persistence logic shared by the
//! Taskmate API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks) and their queries
//! - `auth`: Token signing and password hashing primitives
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskmate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
