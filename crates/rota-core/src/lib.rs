//! # Rota Core Library
//!
//! Household task rotas: reusable day templates, week templates that pick a
//! day template per weekday (optionally on even or odd weeks only), and
//! date-scoped overrides, merged into one resolved schedule per week.
//!
//! ## Core Modules
//!
//! - [`repository`]: Template and override stores over SQLite
//! - [`resolution`]: The resolution engine
//! - [`validation`]: Write-time checks for override batches
//! - [`shifts`]: Grouping of a day's tasks into per-member shifts
//! - [`fairness`]: Distribution of task minutes over a trailing window
//! - [`events`]: Change events and the broadcast bus
//! - [`service`]: Read/write boundary used by clients
//! - [`sync`]: Client-side week cache kept fresh by events
//! - [`calendar`]: Week and weekday conventions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rota_core::{db, events::EventBus, repository::SqliteRepository, service::ScheduleService};
//! use chrono::NaiveDate;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rota_core::error::CoreError> {
//!     let pool = db::establish_connection("rota.db").await?;
//!     let service = ScheduleService::new(SqliteRepository::new(pool), EventBus::new(100));
//!
//!     let family_id = Uuid::nil();
//!     let monday = NaiveDate::from_ymd_opt(2025, 8, 18).unwrap();
//!     let week = service.schedule(family_id, monday).await?;
//!     for day in &week.days {
//!         println!("{}: {} tasks", day.date, day.tasks.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod db;
pub mod error;
pub mod events;
pub mod fairness;
pub mod models;
pub mod repository;
pub mod resolution;
pub mod service;
pub mod shifts;
pub mod sync;
pub mod validation;
