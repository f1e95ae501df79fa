#![forbid(unsafe_code)]

//! Core domain model and business logic for wodlog.
//!
//! This crate provides:
//! - Domain types (score categories, structured scores, results, workouts)
//! - Workout-type classification and the score text codec
//! - Editable score fields and editing sessions
//! - Result reconciliation (create vs. update for one athlete-day)
//! - Custom workout building
//! - Persistence (JSONL result store, JSON catalog, CSV export)

pub mod types;
pub mod error;
pub mod classify;
pub mod codec;
pub mod fields;
pub mod editor;
pub mod custom;
pub mod store;
pub mod catalog;
pub mod reconcile;
pub mod export;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use classify::classify;
pub use fields::ScoreFields;
pub use editor::ScoreEditor;
pub use custom::{CustomWorkout, CustomWorkoutBuilder};
pub use store::{JsonlResultStore, ResultStore, StoreError};
pub use catalog::{JsonCatalog, WorkoutCatalog};
pub use reconcile::{EditState, ReconcileEngine, ResultDraft, StateTag};
pub use config::Config;
