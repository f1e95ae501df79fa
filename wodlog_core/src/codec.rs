//! Score text codec.
//!
//! Each category has a small grammar for the single text field that gets
//! persisted:
//! - time: `M:SS`, `M:`, `:S`, or empty
//! - amrap: `R+r`, `R`, `+r`, or empty
//! - weight: plain non-negative decimal, no unit
//! - rounds: plain non-negative integer
//! - freeform: the literal text
//!
//! `parse(&format(s), c) == Some(s)` holds for every complete score `s` of
//! category `c`. `parse` never panics; text outside the grammar yields `None`
//! and the caller falls back to freeform display.

use crate::{ScoreCategory, StructuredScore};

/// Decode stored text under `category`
///
/// Empty text decodes to the blank score of the category.
pub fn parse(text: &str, category: ScoreCategory) -> Option<StructuredScore> {
    let trimmed = text.trim();
    let parsed = match category {
        ScoreCategory::Time => parse_time(trimmed),
        ScoreCategory::Amrap => parse_amrap(trimmed),
        ScoreCategory::Weight => parse_optional(trimmed, parse_amount)
            .map(|amount| StructuredScore::Weight { amount }),
        ScoreCategory::Rounds => parse_optional(trimmed, parse_count)
            .map(|rounds| StructuredScore::Rounds { rounds }),
        ScoreCategory::Freeform => Some(StructuredScore::Freeform {
            text: text.to_string(),
        }),
    };

    if parsed.is_none() {
        tracing::debug!("Score {:?} does not match the {} grammar", text, category);
    }
    parsed
}

/// Encode a (possibly partial) score
///
/// Blank fields are omitted, never written as zero.
pub fn format(score: &StructuredScore) -> String {
    match score {
        StructuredScore::Time { minutes, seconds } => match (minutes, seconds) {
            (Some(m), Some(s)) => format!("{}:{:02}", m, s),
            (Some(m), None) => format!("{}:", m),
            (None, Some(s)) => format!(":{}", s),
            (None, None) => String::new(),
        },
        StructuredScore::Amrap { rounds, reps } => match (rounds, reps) {
            (Some(r), Some(p)) => format!("{}+{}", r, p),
            (Some(r), None) => r.to_string(),
            (None, Some(p)) => format!("+{}", p),
            (None, None) => String::new(),
        },
        StructuredScore::Weight { amount } => amount.map(format_amount).unwrap_or_default(),
        StructuredScore::Rounds { rounds } => rounds.map(|r| r.to_string()).unwrap_or_default(),
        StructuredScore::Freeform { text } => text.clone(),
    }
}

/// Parse a non-negative integer made only of ASCII digits
pub(crate) fn parse_count(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Parse a non-negative decimal such as `135`, `92.5` or `.5`
pub(crate) fn parse_amount(token: &str) -> Option<f64> {
    let token = token.trim();
    let mut dots = 0;
    let mut digits = 0;
    for b in token.bytes() {
        match b {
            b'.' => dots += 1,
            b'0'..=b'9' => digits += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn parse_seconds(token: &str) -> Option<u32> {
    parse_count(token).filter(|s| *s <= 59)
}

/// Shortest text that parses back to the same value
fn format_amount(amount: f64) -> String {
    amount.to_string()
}

/// Blank text is a present-but-empty field; anything else must parse
fn parse_optional<T>(token: &str, f: impl Fn(&str) -> Option<T>) -> Option<Option<T>> {
    if token.trim().is_empty() {
        Some(None)
    } else {
        f(token).map(Some)
    }
}

fn parse_time(text: &str) -> Option<StructuredScore> {
    let (minutes, seconds) = match text.split_once(':') {
        Some((m, s)) => {
            if s.contains(':') {
                return None;
            }
            (
                parse_optional(m, parse_count)?,
                parse_optional(s, parse_seconds)?,
            )
        }
        // A bare number is whole minutes
        None => (parse_optional(text, parse_count)?, None),
    };
    Some(StructuredScore::Time { minutes, seconds })
}

fn parse_amrap(text: &str) -> Option<StructuredScore> {
    let (rounds, reps) = match text.split_once('+') {
        Some((r, p)) => {
            if p.contains('+') {
                return None;
            }
            (
                parse_optional(r, parse_count)?,
                parse_optional(p, parse_count)?,
            )
        }
        None => (parse_optional(text, parse_count)?, None),
    };
    Some(StructuredScore::Amrap { rounds, reps })
}
