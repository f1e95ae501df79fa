//! Programmed-workout catalog.
//!
//! The catalog is owned by coaching functionality elsewhere; this crate only
//! reads it. `JsonCatalog` loads a JSON array of workouts from disk.

use crate::classify::classify;
use crate::{CatalogWorkout, Result, ScoreCategory, WorkoutResult};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Read access to programmed workouts
pub trait WorkoutCatalog {
    /// All workouts, ordered by date
    fn list_workouts(&self) -> Result<Vec<CatalogWorkout>>;
}

/// Catalog stored as a JSON array in a single file
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkoutCatalog for JsonCatalog {
    /// Missing file means nothing has been programmed yet
    fn list_workouts(&self) -> Result<Vec<CatalogWorkout>> {
        if !self.path.exists() {
            tracing::debug!("No catalog file found at {:?}", self.path);
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let mut workouts: Vec<CatalogWorkout> = serde_json::from_str(&contents)?;
        workouts.sort_by(|a, b| a.date.cmp(&b.date));

        tracing::debug!("Loaded {} workouts from {:?}", workouts.len(), self.path);
        Ok(workouts)
    }
}

/// Workouts already in memory
impl WorkoutCatalog for Vec<CatalogWorkout> {
    fn list_workouts(&self) -> Result<Vec<CatalogWorkout>> {
        Ok(self.clone())
    }
}

/// The workout programmed for `date`, if any
pub fn workout_for_date(workouts: &[CatalogWorkout], date: NaiveDate) -> Option<&CatalogWorkout> {
    let mut on_day = workouts.iter().filter(|w| w.date == date);
    let first = on_day.next();
    if on_day.next().is_some() {
        tracing::warn!("More than one workout programmed for {}, showing the first", date);
    }
    first
}

pub fn find_workout<'a>(workouts: &'a [CatalogWorkout], id: &str) -> Option<&'a CatalogWorkout> {
    workouts.iter().find(|w| w.id == id)
}

/// Score category a stored result is encoded under
///
/// Custom results classify their own type label. A result whose catalog
/// workout no longer exists is treated as freeform.
pub fn category_for_result(result: &WorkoutResult, workouts: &[CatalogWorkout]) -> ScoreCategory {
    match result.workout_id() {
        Some(id) => find_workout(workouts, id)
            .map(|w| classify(&w.workout_type))
            .unwrap_or(ScoreCategory::Freeform),
        None => classify(result.payload.custom_type.as_deref().unwrap_or_default()),
    }
}
