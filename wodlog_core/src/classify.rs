//! Workout-type label to score category mapping.
//!
//! The table below lists every workout-type label a catalog or custom
//! workout can carry. Anything not in it scores as freeform text.

use crate::ScoreCategory;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Workout-type labels in the order they are offered to athletes
pub const WORKOUT_TYPES: &[(&str, ScoreCategory)] = &[
    ("For Time", ScoreCategory::Time),
    ("AMRAP", ScoreCategory::Amrap),
    ("Strength", ScoreCategory::Weight),
    ("EMOM", ScoreCategory::Rounds),
    ("Interval", ScoreCategory::Rounds),
    ("Rounds", ScoreCategory::Rounds),
    ("Chipper", ScoreCategory::Freeform),
    ("Skill", ScoreCategory::Freeform),
    ("Metcon", ScoreCategory::Freeform),
    ("Other", ScoreCategory::Freeform),
];

/// Lookup keyed by normalized label, built once
static CATEGORY_TABLE: Lazy<HashMap<String, ScoreCategory>> = Lazy::new(|| {
    WORKOUT_TYPES
        .iter()
        .map(|(label, category)| (normalize_label(label), *category))
        .collect()
});

/// Map a workout-type label to its score category
///
/// Total: unrecognized labels (including the empty string) map to
/// `ScoreCategory::Freeform`. Matching ignores case and surrounding
/// whitespace.
pub fn classify(workout_type: &str) -> ScoreCategory {
    match CATEGORY_TABLE.get(&normalize_label(workout_type)) {
        Some(category) => *category,
        None => {
            tracing::debug!("Unrecognized workout type {:?}, scoring as freeform", workout_type);
            ScoreCategory::Freeform
        }
    }
}

/// True when the label appears in `WORKOUT_TYPES`
pub fn is_known_type(workout_type: &str) -> bool {
    CATEGORY_TABLE.contains_key(&normalize_label(workout_type))
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
