//! # Class Reminder Bot
//!
//! A Telegram bot that warns university groups before their classes
//! start, driven by the timetable API's daily call schedule.
//!
//! ## Features
//! - Daily timezone aware notification jobs compiled from the call schedule
//! - 15 minute and 1 minute warnings ahead of the first upcoming class
//! - Per chat group, language and notification settings in SQLite
//! - Health check endpoints for monitoring

/// Timetable API client and response types
pub mod api;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Language files and message templates
pub mod i18n;
/// Notification scheduling and dispatch
pub mod notifier;
/// Background services like health checks
pub mod services;
