//! CSV export of stored results.

use crate::catalog::{category_for_result, find_workout};
use crate::{codec, CatalogWorkout, Result, WorkoutResult};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    workout: String,
    workout_type: String,
    score: String,
    score_display: String,
    mode: String,
    notes: String,
}

impl CsvRow {
    fn new(result: &WorkoutResult, workouts: &[CatalogWorkout], weight_unit: &str) -> Self {
        let payload = &result.payload;
        let (workout, workout_type) = match result.workout_id() {
            Some(id) => match find_workout(workouts, id) {
                Some(w) => (w.title().to_string(), w.workout_type.clone()),
                None => (id.to_string(), String::new()),
            },
            None => (
                payload.custom_name.clone().unwrap_or_default(),
                payload.custom_type.clone().unwrap_or_default(),
            ),
        };

        // Scores that no longer fit their category are exported as typed
        let category = category_for_result(result, workouts);
        let score_display = codec::parse(&payload.score, category)
            .map(|s| s.describe(weight_unit))
            .unwrap_or_else(|| payload.score.clone());

        CsvRow {
            id: result.id.to_string(),
            date: payload.date.to_string(),
            workout,
            workout_type,
            score: payload.score.clone(),
            score_display,
            mode: payload.mode.to_string(),
            notes: payload.notes.clone(),
        }
    }
}

/// Write results to a new CSV file, replacing any existing one
///
/// Returns the number of rows written.
pub fn write_results_csv(
    results: &[WorkoutResult],
    workouts: &[CatalogWorkout],
    path: &Path,
    weight_unit: &str,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(CsvRow::new(result, workouts, weight_unit))?;
    }
    writer.flush()?;

    tracing::info!("Exported {} results to {:?}", results.len(), path);
    Ok(results.len())
}
