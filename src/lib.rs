//! Praxis - Backend Library
//!
//! Legal practice management backend. The authorization and user-lifecycle
//! core (catalog, gate, matrix presenter, deactivation cascade) is usable
//! as an in-process library; the `api` module exposes it over HTTP.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
