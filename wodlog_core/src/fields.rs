//! Editable sub-fields for each score shape.
//!
//! An editing surface works on raw strings (what the athlete typed), one per
//! sub-field. `to_fields` projects a structured score into that form and
//! `from_fields` reassembles the fields and hands them to the codec.

use crate::codec::{self, parse_amount, parse_count, parse_seconds};
use crate::error::ValidationError;
use crate::{ScoreCategory, StructuredScore};

/// Raw, possibly partial text per sub-field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoreFields {
    Time { minutes: String, seconds: String },
    Amrap { rounds: String, reps: String },
    Weight { amount: String },
    Rounds { rounds: String },
    Freeform { text: String },
}

impl ScoreFields {
    /// Empty fields for a category
    pub fn blank(category: ScoreCategory) -> Self {
        to_fields(&StructuredScore::empty(category))
    }

    /// Shape these fields encode
    pub fn category(&self) -> ScoreCategory {
        match self {
            ScoreFields::Time { .. } => ScoreCategory::Time,
            ScoreFields::Amrap { .. } => ScoreCategory::Amrap,
            ScoreFields::Weight { .. } => ScoreCategory::Weight,
            ScoreFields::Rounds { .. } => ScoreCategory::Rounds,
            ScoreFields::Freeform { .. } => ScoreCategory::Freeform,
        }
    }

    /// Sub-field names in display order
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            ScoreFields::Time { .. } => &["minutes", "seconds"],
            ScoreFields::Amrap { .. } => &["rounds", "reps"],
            ScoreFields::Weight { .. } => &["amount"],
            ScoreFields::Rounds { .. } => &["rounds"],
            ScoreFields::Freeform { .. } => &["text"],
        }
    }

    /// Current value of a named sub-field
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match (self, name) {
            (ScoreFields::Time { minutes, .. }, "minutes") => minutes,
            (ScoreFields::Time { seconds, .. }, "seconds") => seconds,
            (ScoreFields::Amrap { rounds, .. }, "rounds") => rounds,
            (ScoreFields::Amrap { reps, .. }, "reps") => reps,
            (ScoreFields::Weight { amount }, "amount") => amount,
            (ScoreFields::Rounds { rounds }, "rounds") => rounds,
            (ScoreFields::Freeform { text }, "text") => text,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Replace a named sub-field
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ValidationError> {
        let category = self.category();
        let slot = match (self, name) {
            (ScoreFields::Time { minutes, .. }, "minutes") => minutes,
            (ScoreFields::Time { seconds, .. }, "seconds") => seconds,
            (ScoreFields::Amrap { rounds, .. }, "rounds") => rounds,
            (ScoreFields::Amrap { reps, .. }, "reps") => reps,
            (ScoreFields::Weight { amount }, "amount") => amount,
            (ScoreFields::Rounds { rounds }, "rounds") => rounds,
            (ScoreFields::Freeform { text }, "text") => text,
            _ => {
                return Err(ValidationError::UnknownField {
                    field: name.to_string(),
                    category,
                })
            }
        };
        *slot = value.into();
        Ok(())
    }
}

/// Project a score into editable text fields
pub fn to_fields(score: &StructuredScore) -> ScoreFields {
    fn show<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    match score {
        StructuredScore::Time { minutes, seconds } => ScoreFields::Time {
            minutes: show(minutes),
            // Seconds display padded the same way they are stored
            seconds: seconds.map(|s| format!("{:02}", s)).unwrap_or_default(),
        },
        StructuredScore::Amrap { rounds, reps } => ScoreFields::Amrap {
            rounds: show(rounds),
            reps: show(reps),
        },
        StructuredScore::Weight { amount } => ScoreFields::Weight {
            amount: show(amount),
        },
        StructuredScore::Rounds { rounds } => ScoreFields::Rounds {
            rounds: show(rounds),
        },
        StructuredScore::Freeform { text } => ScoreFields::Freeform { text: text.clone() },
    }
}

/// Assemble a structured score from edited fields
///
/// Blank fields are left out of the score. Text a sub-field cannot represent
/// is an error rather than a blank, so a complete stored score is never
/// narrowed by a typo.
pub fn assemble(fields: &ScoreFields) -> Result<StructuredScore, ValidationError> {
    let category = fields.category();
    let value = |name, raw: &str, parsed| checked(category, name, raw, parsed);

    Ok(match fields {
        ScoreFields::Time { minutes, seconds } => StructuredScore::Time {
            minutes: value("minutes", minutes, parse_count(minutes))?,
            seconds: value("seconds", seconds, parse_seconds(seconds))?,
        },
        ScoreFields::Amrap { rounds, reps } => StructuredScore::Amrap {
            rounds: value("rounds", rounds, parse_count(rounds))?,
            reps: value("reps", reps, parse_count(reps))?,
        },
        ScoreFields::Weight { amount } => StructuredScore::Weight {
            amount: checked(category, "amount", amount, parse_amount(amount))?,
        },
        ScoreFields::Rounds { rounds } => StructuredScore::Rounds {
            rounds: value("rounds", rounds, parse_count(rounds))?,
        },
        ScoreFields::Freeform { text } => StructuredScore::Freeform { text: text.clone() },
    })
}

fn checked<T>(
    category: ScoreCategory,
    name: &str,
    raw: &str,
    parsed: Option<T>,
) -> Result<Option<T>, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match parsed {
        Some(v) => Ok(Some(v)),
        None => Err(ValidationError::InvalidField {
            field: name.to_string(),
            value: raw.to_string(),
            category,
        }),
    }
}

/// Encode edited fields to stored text
pub fn from_fields(fields: &ScoreFields) -> Result<String, ValidationError> {
    Ok(codec::format(&assemble(fields)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_fields_round_trip() {
        let score = StructuredScore::Time {
            minutes: Some(12),
            seconds: Some(4),
        };
        let fields = to_fields(&score);
        assert_eq!(fields.get("minutes"), Some("12"));
        assert_eq!(fields.get("seconds"), Some("04"));
        assert_eq!(assemble(&fields), Ok(score));
        assert_eq!(from_fields(&fields).unwrap(), "12:04");
    }

    #[test]
    fn test_blank_seconds_not_written_as_zero() {
        let fields = ScoreFields::Time {
            minutes: "5".into(),
            seconds: "".into(),
        };
        assert_eq!(from_fields(&fields).unwrap(), "5:");
    }

    #[test]
    fn test_amrap_scenario() {
        let fields = ScoreFields::Amrap {
            rounds: "8".into(),
            reps: "15".into(),
        };
        assert_eq!(from_fields(&fields).unwrap(), "8+15");
    }

    #[test]
    fn test_set_and_get() {
        let mut fields = ScoreFields::blank(ScoreCategory::Weight);
        fields.set("amount", "135.5").unwrap();
        assert_eq!(fields.get("amount"), Some("135.5"));
        assert_eq!(from_fields(&fields).unwrap(), "135.5");
    }

    #[test]
    fn test_set_unknown_field_is_rejected() {
        let mut fields = ScoreFields::blank(ScoreCategory::Time);
        let err = fields.set("reps", "3").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownField {
                field: "reps".into(),
                category: ScoreCategory::Time,
            }
        );
        assert_eq!(fields, ScoreFields::blank(ScoreCategory::Time));
    }

    #[test]
    fn test_out_of_range_seconds_rejected() {
        let fields = ScoreFields::Time {
            minutes: "3".into(),
            seconds: "75".into(),
        };
        assert_eq!(
            assemble(&fields),
            Err(ValidationError::InvalidField {
                field: "seconds".into(),
                value: "75".into(),
                category: ScoreCategory::Time,
            })
        );
    }

    #[test]
    fn test_non_numeric_minutes_rejected() {
        let fields = ScoreFields::Time {
            minutes: "twelve".into(),
            seconds: "34".into(),
        };
        let err = from_fields(&fields).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "minutes"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut fields = ScoreFields::blank(ScoreCategory::Weight);
        fields.set("amount", "-5").unwrap();
        assert_eq!(
            from_fields(&fields),
            Err(ValidationError::InvalidField {
                field: "amount".into(),
                value: "-5".into(),
                category: ScoreCategory::Weight,
            })
        );
    }

    #[test]
    fn test_whitespace_only_field_is_blank() {
        let fields = ScoreFields::Amrap {
            rounds: "6".into(),
            reps: "  ".into(),
        };
        assert_eq!(from_fields(&fields).unwrap(), "6");
    }

    #[test]
    fn test_every_category_has_fields() {
        for category in [
            ScoreCategory::Time,
            ScoreCategory::Amrap,
            ScoreCategory::Weight,
            ScoreCategory::Rounds,
            ScoreCategory::Freeform,
        ] {
            let fields = ScoreFields::blank(category);
            assert_eq!(fields.category(), category);
            for name in fields.names() {
                assert_eq!(fields.get(name), Some(""));
            }
            assert_eq!(from_fields(&fields).unwrap(), "");
        }
    }
}
