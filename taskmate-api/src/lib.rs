//! # Taskmate API Server Library
//!
//! Core functionality for the Taskmate API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `avatar`: Avatar image normalization
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication layer
//! - `notify`: Account notification emails
//! - `routes`: API route handlers

pub mod app;
pub mod avatar;
pub mod config;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod routes;
