//! Ad-hoc workouts that are not drawn from the catalog.
//!
//! A custom workout scores exactly like a catalog workout: its type label
//! goes through the classifier and its score through the codec. It is never
//! stored as a catalog entry; its name, type and movements ride on the result.

use crate::classify::{classify, WORKOUT_TYPES};
use crate::error::ValidationError;
use crate::{ScoreCategory, WorkoutResult};

/// Name used when the athlete leaves the name blank
pub const DEFAULT_CUSTOM_NAME: &str = "Custom Workout";

/// A validated custom workout, ready to attach to a result
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomWorkout {
    pub name: String,
    pub workout_type: String,
    pub movements: Vec<String>,
}

impl CustomWorkout {
    pub fn category(&self) -> ScoreCategory {
        classify(&self.workout_type)
    }
}

/// Editable custom workout definition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomWorkoutBuilder {
    name: String,
    workout_type: String,
    movements: Vec<String>,
}

impl Default for CustomWorkoutBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            workout_type: WORKOUT_TYPES[0].0.to_string(),
            movements: vec![String::new()],
        }
    }
}

impl CustomWorkoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-open the custom workout a stored result was logged against
    pub fn from_result(result: &WorkoutResult) -> Self {
        let payload = &result.payload;
        let mut movements = payload.custom_movements.clone();
        if movements.is_empty() {
            movements.push(String::new());
        }
        Self {
            name: payload.custom_name.clone().unwrap_or_default(),
            workout_type: payload.custom_type.clone().unwrap_or_default(),
            movements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workout_type(&self) -> &str {
        &self.workout_type
    }

    pub fn movements(&self) -> &[String] {
        &self.movements
    }

    pub fn category(&self) -> ScoreCategory {
        classify(&self.workout_type)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_type(&mut self, workout_type: impl Into<String>) {
        self.workout_type = workout_type.into();
    }

    pub fn add_movement(&mut self, movement: impl Into<String>) {
        self.movements.push(movement.into());
    }

    /// Rename the movement at `index`; returns false when out of range
    pub fn set_movement(&mut self, index: usize, movement: impl Into<String>) -> bool {
        match self.movements.get_mut(index) {
            Some(slot) => {
                *slot = movement.into();
                true
            }
            None => false,
        }
    }

    /// Remove the movement at `index`, keeping at least one row
    pub fn remove_movement(&mut self, index: usize) -> Option<String> {
        if index >= self.movements.len() {
            return None;
        }
        let removed = self.movements.remove(index);
        if self.movements.is_empty() {
            self.movements.push(String::new());
        }
        Some(removed)
    }

    /// Replace the movement list in one go
    pub fn set_movements(&mut self, movements: Vec<String>) {
        self.movements = movements;
        if self.movements.is_empty() {
            self.movements.push(String::new());
        }
    }

    /// Check the definition before submission
    ///
    /// Movements with blank names are dropped. `benchmarks` is the list of
    /// known benchmark-workout names; matching one is rejected so the athlete
    /// renames it or waits for the official benchmark to be programmed.
    pub fn validate(&self, benchmarks: &[String]) -> Result<CustomWorkout, ValidationError> {
        let movements: Vec<String> = self
            .movements
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        if movements.is_empty() {
            return Err(ValidationError::NoMovements);
        }

        let name = match self.name.trim() {
            "" => DEFAULT_CUSTOM_NAME.to_string(),
            name => name.to_string(),
        };

        if let Some(benchmark) = find_benchmark(&name, benchmarks) {
            tracing::info!("Custom workout name {:?} matches benchmark {:?}", name, benchmark);
            return Err(ValidationError::BenchmarkName {
                name,
                benchmark: benchmark.to_string(),
            });
        }

        Ok(CustomWorkout {
            name,
            workout_type: self.workout_type.trim().to_string(),
            movements,
        })
    }
}

/// Benchmark whose name matches `name` after normalization
pub fn find_benchmark<'a>(name: &str, benchmarks: &'a [String]) -> Option<&'a str> {
    let wanted = normalize_name(name);
    benchmarks
        .iter()
        .find(|b| normalize_name(b) == wanted)
        .map(String::as_str)
}

/// Lowercase with runs of whitespace collapsed
fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
