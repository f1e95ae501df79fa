//! Core domain types for wodlog.
//!
//! This module defines:
//! - Score categories and the structured score sum type
//! - Catalog workouts (read-only, programmed by a coach)
//! - Stored workout results and the payload used to create/update them

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Score Types
// ============================================================================

/// The fixed set of score shapes a workout type maps to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Time,
    Amrap,
    Weight,
    Rounds,
    Freeform,
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoreCategory::Time => "time",
            ScoreCategory::Amrap => "amrap",
            ScoreCategory::Weight => "weight",
            ScoreCategory::Rounds => "rounds",
            ScoreCategory::Freeform => "freeform",
        };
        f.write_str(name)
    }
}

/// Typed, category-specific score
///
/// Numeric fields are `None` while an athlete has left them blank. A blank
/// field is omitted from the stored text rather than written as zero.
#[derive(Clone, Debug, PartialEq)]
pub enum StructuredScore {
    Time {
        minutes: Option<u32>,
        seconds: Option<u32>,
    },
    Amrap {
        rounds: Option<u32>,
        reps: Option<u32>,
    },
    Weight {
        amount: Option<f64>,
    },
    Rounds {
        rounds: Option<u32>,
    },
    Freeform {
        text: String,
    },
}

impl StructuredScore {
    /// A score with every field blank
    pub fn empty(category: ScoreCategory) -> Self {
        match category {
            ScoreCategory::Time => StructuredScore::Time {
                minutes: None,
                seconds: None,
            },
            ScoreCategory::Amrap => StructuredScore::Amrap {
                rounds: None,
                reps: None,
            },
            ScoreCategory::Weight => StructuredScore::Weight { amount: None },
            ScoreCategory::Rounds => StructuredScore::Rounds { rounds: None },
            ScoreCategory::Freeform => StructuredScore::Freeform {
                text: String::new(),
            },
        }
    }

    /// Category whose grammar encodes this score
    pub fn category(&self) -> ScoreCategory {
        match self {
            StructuredScore::Time { .. } => ScoreCategory::Time,
            StructuredScore::Amrap { .. } => ScoreCategory::Amrap,
            StructuredScore::Weight { .. } => ScoreCategory::Weight,
            StructuredScore::Rounds { .. } => ScoreCategory::Rounds,
            StructuredScore::Freeform { .. } => ScoreCategory::Freeform,
        }
    }

    /// True when no sub-field is blank
    pub fn is_complete(&self) -> bool {
        match self {
            StructuredScore::Time { minutes, seconds } => minutes.is_some() && seconds.is_some(),
            StructuredScore::Amrap { rounds, reps } => rounds.is_some() && reps.is_some(),
            StructuredScore::Weight { amount } => amount.is_some(),
            StructuredScore::Rounds { rounds } => rounds.is_some(),
            StructuredScore::Freeform { .. } => true,
        }
    }

    /// Human-readable rendering; `weight_unit` is only shown, never stored
    pub fn describe(&self, weight_unit: &str) -> String {
        match self {
            StructuredScore::Time {
                minutes: None,
                seconds: None,
            } => String::new(),
            StructuredScore::Time { minutes, seconds } => format!(
                "{}:{:02}",
                minutes.unwrap_or(0),
                seconds.unwrap_or(0)
            ),
            StructuredScore::Amrap {
                rounds: None,
                reps: None,
            } => String::new(),
            StructuredScore::Amrap { rounds, reps } => match reps {
                Some(reps) => format!("{} rounds + {} reps", rounds.unwrap_or(0), reps),
                None => format!("{} rounds", rounds.unwrap_or(0)),
            },
            StructuredScore::Weight { amount } => match amount {
                Some(amount) => format!("{} {}", amount, weight_unit),
                None => String::new(),
            },
            StructuredScore::Rounds { rounds } => match rounds {
                Some(rounds) => format!("{} rounds", rounds),
                None => String::new(),
            },
            StructuredScore::Freeform { text } => text.clone(),
        }
    }
}

/// Whether the workout was done as prescribed or scaled
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    #[default]
    Rx,
    Scaled,
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreMode::Rx => f.write_str("Rx"),
            ScoreMode::Scaled => f.write_str("Scaled"),
        }
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// A coach-programmed workout for a fixed date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogWorkout {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub workout_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub movements: Vec<String>,
}

impl CatalogWorkout {
    /// Name to show, falling back to the type label
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.workout_type)
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Everything the athlete controls about a stored result
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResultPayload {
    pub athlete_id: String,
    pub date: NaiveDate,
    /// Catalog workout this result was logged against; `None` for custom workouts
    #[serde(default)]
    pub workout_id: Option<String>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub custom_type: Option<String>,
    #[serde(default)]
    pub custom_movements: Vec<String>,
    pub score: String,
    #[serde(default)]
    pub mode: ScoreMode,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photo: Option<String>,
    /// Load annotation per movement, aligned with the movement list
    #[serde(default)]
    pub movement_loads: Vec<String>,
}

impl ResultPayload {
    pub fn is_custom(&self) -> bool {
        self.workout_id.is_none()
    }
}

/// A stored result row; at most one per athlete and date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutResult {
    pub id: Uuid,
    #[serde(flatten)]
    pub payload: ResultPayload,
    pub logged_at: DateTime<Utc>,
}

impl WorkoutResult {
    pub fn date(&self) -> NaiveDate {
        self.payload.date
    }

    pub fn workout_id(&self) -> Option<&str> {
        self.payload.workout_id.as_deref()
    }

    pub fn is_custom(&self) -> bool {
        self.payload.is_custom()
    }
}
