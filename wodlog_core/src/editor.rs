//! One score-editing session.
//!
//! Whether stored text is shown as structured fields or as freeform text is
//! decided once, when the session opens, and kept until the stored text or
//! the category changes. Editing a field never re-runs that decision, so the
//! input does not flip between representations while the athlete types.

use crate::codec;
use crate::error::ValidationError;
use crate::fields::{self, ScoreFields};
use crate::{ScoreCategory, StructuredScore};

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreEditor {
    category: ScoreCategory,
    stored: String,
    fields: ScoreFields,
    fallback: bool,
    dirty: bool,
}

impl ScoreEditor {
    /// Open a session on previously stored text
    pub fn new(stored: impl Into<String>, category: ScoreCategory) -> Self {
        let stored = stored.into();
        let (fields, fallback) = match codec::parse(&stored, category) {
            Some(score) => (fields::to_fields(&score), false),
            None => {
                tracing::debug!(
                    "Stored score {:?} is not a {} score, editing as freeform",
                    stored,
                    category
                );
                (
                    ScoreFields::Freeform {
                        text: stored.clone(),
                    },
                    true,
                )
            }
        };

        Self {
            category,
            stored,
            fields,
            fallback,
            dirty: false,
        }
    }

    /// Open a session with nothing stored yet
    pub fn blank(category: ScoreCategory) -> Self {
        Self::new(String::new(), category)
    }

    /// Re-open on new stored text or category
    ///
    /// No-op when both are unchanged, so the cached decision and any
    /// in-progress edits survive repeated calls.
    pub fn rebase(&mut self, stored: &str, category: ScoreCategory) {
        if self.stored == stored && self.category == category {
            return;
        }
        *self = Self::new(stored, category);
    }

    /// Switch category, carrying the current text over
    ///
    /// Fails, leaving the session as it was, when an edited field cannot be
    /// encoded.
    pub fn recategorize(&mut self, category: ScoreCategory) -> Result<(), ValidationError> {
        if self.category == category {
            return Ok(());
        }
        let current = self.encoded()?;
        let dirty = self.dirty;
        *self = Self::new(current, category);
        self.dirty = dirty;
        Ok(())
    }

    pub fn category(&self) -> ScoreCategory {
        self.category
    }

    /// Text the session was opened on
    pub fn stored(&self) -> &str {
        &self.stored
    }

    /// True when the stored text did not match the category grammar
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn fields(&self) -> &ScoreFields {
        &self.fields
    }

    /// Edit one named sub-field
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), ValidationError> {
        self.fields.set(name, value)?;
        self.dirty = true;
        Ok(())
    }

    /// Replace the whole score with text typed in the stored form
    ///
    /// Text that does not match the grammar is kept as-is in the freeform
    /// field.
    pub fn set_text(&mut self, text: &str) {
        self.fields = match codec::parse(text, self.category) {
            Some(score) if !self.fallback => fields::to_fields(&score),
            _ => ScoreFields::Freeform {
                text: text.to_string(),
            },
        };
        self.dirty = true;
    }

    /// Current score assembled from the fields
    pub fn score(&self) -> Result<StructuredScore, ValidationError> {
        fields::assemble(&self.fields)
    }

    /// Text to persist
    ///
    /// Until something is edited this is the stored text, byte for byte.
    /// An edited field holding text its sub-field cannot represent is an
    /// error, never silently dropped.
    pub fn encoded(&self) -> Result<String, ValidationError> {
        if self.dirty {
            fields::from_fields(&self.fields)
        } else {
            Ok(self.stored.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_text_opens_structured() {
        let editor = ScoreEditor::new("12:34", ScoreCategory::Time);
        assert!(!editor.is_fallback());
        assert_eq!(editor.fields().get("minutes"), Some("12"));
        assert_eq!(editor.fields().get("seconds"), Some("34"));
        assert_eq!(
            editor.score(),
            Ok(StructuredScore::Time {
                minutes: Some(12),
                seconds: Some(34)
            })
        );
    }

    #[test]
    fn test_mismatched_text_falls_back_without_rewriting() {
        let editor = ScoreEditor::new("8+15", ScoreCategory::Weight);
        assert!(editor.is_fallback());
        assert_eq!(editor.fields().get("text"), Some("8+15"));
        assert_eq!(editor.encoded().unwrap(), "8+15");
    }

    #[test]
    fn test_fallback_decision_is_stable() {
        let mut editor = ScoreEditor::new("8+15", ScoreCategory::Weight);
        editor.rebase("8+15", ScoreCategory::Weight);
        assert!(editor.is_fallback());

        let again = ScoreEditor::new("8+15", ScoreCategory::Weight);
        assert_eq!(again.is_fallback(), editor.is_fallback());
    }

    #[test]
    fn test_fallback_not_redecided_while_typing() {
        let mut editor = ScoreEditor::new("about 200", ScoreCategory::Weight);
        assert!(editor.is_fallback());

        // Text now valid for the category still stays in the freeform field
        editor.set_field("text", "200").unwrap();
        assert!(editor.is_fallback());
        assert_eq!(editor.fields().category(), ScoreCategory::Freeform);
        assert_eq!(editor.encoded().unwrap(), "200");
    }

    #[test]
    fn test_rebase_reevaluates_on_change() {
        let mut editor = ScoreEditor::new("8+15", ScoreCategory::Weight);
        editor.rebase("8+15", ScoreCategory::Amrap);
        assert!(!editor.is_fallback());
        assert_eq!(editor.fields().get("rounds"), Some("8"));

        editor.rebase("225", ScoreCategory::Weight);
        assert!(!editor.is_fallback());
        assert_eq!(editor.fields().get("amount"), Some("225"));
    }

    #[test]
    fn test_rebase_same_input_keeps_edits() {
        let mut editor = ScoreEditor::new("12:34", ScoreCategory::Time);
        editor.set_field("seconds", "").unwrap();
        editor.rebase("12:34", ScoreCategory::Time);
        assert_eq!(editor.encoded().unwrap(), "12:");
    }

    #[test]
    fn test_partial_edit_omits_blank_field() {
        let mut editor = ScoreEditor::blank(ScoreCategory::Time);
        editor.set_field("minutes", "5").unwrap();
        assert_eq!(editor.encoded().unwrap(), "5:");
    }

    #[test]
    fn test_untouched_stored_text_is_preserved_verbatim() {
        let editor = ScoreEditor::new(" 8+15 ", ScoreCategory::Amrap);
        assert!(!editor.is_fallback());
        assert_eq!(editor.encoded().unwrap(), " 8+15 ");
    }

    #[test]
    fn test_set_text() {
        let mut editor = ScoreEditor::blank(ScoreCategory::Amrap);
        editor.set_text("9+3");
        assert_eq!(editor.fields().get("reps"), Some("3"));
        assert_eq!(editor.encoded().unwrap(), "9+3");

        editor.set_text("did not finish");
        assert_eq!(editor.fields().get("text"), Some("did not finish"));
        assert_eq!(editor.encoded().unwrap(), "did not finish");
    }

    #[test]
    fn test_recategorize_carries_text() {
        let mut editor = ScoreEditor::new("14", ScoreCategory::Rounds);
        editor.recategorize(ScoreCategory::Weight).unwrap();
        assert_eq!(editor.category(), ScoreCategory::Weight);
        assert_eq!(editor.fields().get("amount"), Some("14"));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_unknown_field_leaves_editor_clean() {
        let mut editor = ScoreEditor::blank(ScoreCategory::Rounds);
        assert!(editor.set_field("minutes", "3").is_err());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_out_of_range_seconds_blocks_encoding() {
        let mut editor = ScoreEditor::new("12:34", ScoreCategory::Time);
        editor.set_field("seconds", "75").unwrap();
        assert_eq!(editor.fields().get("seconds"), Some("75"));
        assert!(matches!(
            editor.encoded(),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "seconds"
        ));
    }

    #[test]
    fn test_non_numeric_minutes_blocks_encoding() {
        let mut editor = ScoreEditor::new("12:34", ScoreCategory::Time);
        editor.set_field("minutes", "twelve").unwrap();
        assert!(editor.encoded().is_err());

        // Fixing the field makes it encodable again
        editor.set_field("minutes", "11").unwrap();
        assert_eq!(editor.encoded().unwrap(), "11:34");
    }

    #[test]
    fn test_negative_amount_blocks_encoding() {
        let mut editor = ScoreEditor::new("225", ScoreCategory::Weight);
        editor.set_field("amount", "-5").unwrap();
        assert!(editor.encoded().is_err());
    }

    #[test]
    fn test_recategorize_with_invalid_field_keeps_session() {
        let mut editor = ScoreEditor::new("12:34", ScoreCategory::Time);
        editor.set_field("seconds", "75").unwrap();
        let before = editor.clone();

        assert!(editor.recategorize(ScoreCategory::Amrap).is_err());
        assert_eq!(editor, before);
    }
}
