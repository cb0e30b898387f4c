// server/src/lib.rs

//! HTTP front end of the bookstore service: actix-web routes over the
//! `bookstore_core` operations, a PostgreSQL store, configuration and
//! startup tasks.

pub mod config;
pub mod db;
pub mod errors;
pub mod state;
pub mod web;

pub use crate::config::{AppConfig, LogFormat};
pub use crate::errors::AppError;
pub use crate::state::AppState;
