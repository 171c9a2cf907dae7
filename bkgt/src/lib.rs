//! BKGT club hub library
//!
//! Equipment catalog search and internal messaging with per-user
//! notifications, backed by SQLite.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
