//! Field coercion for session writes.
//!
//! Every write to a bounded or enumerated session field passes through here.
//! Invalid input never errors: it degrades to the nearest legal value, which
//! keeps the session resilient to sloppy UI glue at the cost of hiding
//! programmer mistakes.

use std::str::FromStr;

use serde_json::Value;

use crate::constants::{
    BUZZ_RANGE, COUNTER_RANGE, DEFAULT_PLOT_TAG, DIFFICULTY_RANGE, HEALTH_RANGE, KNOB_RANGE,
    KNOWN_PLOT_TAGS, MOMENTUM_RANGE, MONEY_RANGE, MONTHLY_LISTENERS_RANGE, PLAYER_SKILL_RANGE,
    PLOT_RANGE, SPEED_CRANK_RANGE,
};
use crate::numbers::{clamp_to_i32, i64_to_f64, round_f64_to_i64};
use crate::state::{SeatPosition, ViewMode};

/// Coercion rule attached to a named session field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    Integer { min: i64, max: i64 },
    Fraction { min: f64, max: f64 },
    Seat,
    View,
    PlotTag,
}

impl FieldRule {
    /// Look up the rule for a camelCase field name. Unknown names have no rule.
    #[must_use]
    pub fn for_field(field: &str) -> Option<Self> {
        let rule = match field {
            "money" => int_rule(MONEY_RANGE),
            "health" => int_rule(HEALTH_RANGE),
            "playerSkill" => int_rule(PLAYER_SKILL_RANGE),
            "difficulty" => int_rule(DIFFICULTY_RANGE),
            "momentum" => int_rule(MOMENTUM_RANGE),
            "plotA" | "plotB" | "plotC" => int_rule(PLOT_RANGE),
            "speedCrankPercentage" => int_rule(SPEED_CRANK_RANGE),
            "knobValue" => int_rule(KNOB_RANGE),
            "monthlyListeners" => Self::Integer {
                min: MONTHLY_LISTENERS_RANGE.0,
                max: MONTHLY_LISTENERS_RANGE.1,
            },
            "buzz" => Self::Fraction {
                min: BUZZ_RANGE.0,
                max: BUZZ_RANGE.1,
            },
            "showsInCurrentRegion"
            | "sequencesInCurrentRegion"
            | "gameTimeHours"
            | "tutorialStep" => Self::Integer {
                min: COUNTER_RANGE.0,
                max: COUNTER_RANGE.1,
            },
            "currentPosition" => Self::Seat,
            "currentView" => Self::View,
            "plotAEnum" | "plotBEnum" | "plotCEnum" => Self::PlotTag,
            _ => return None,
        };
        Some(rule)
    }

    /// Coerce a raw value into the legal domain of this rule.
    #[must_use]
    pub fn apply(self, raw: &Value) -> Value {
        match self {
            Self::Integer { min, max } => Value::from(coerce_integer(raw, min, max)),
            Self::Fraction { min, max } => Value::from(coerce_fraction(raw, min, max)),
            Self::Seat => Value::from(coerce_enum::<SeatPosition>(raw).as_str()),
            Self::View => Value::from(coerce_enum::<ViewMode>(raw).as_str()),
            Self::PlotTag => Value::from(plot_tag(raw.as_str().unwrap_or_default())),
        }
    }
}

#[allow(clippy::cast_lossless)]
const fn int_rule((min, max): (i32, i32)) -> FieldRule {
    FieldRule::Integer {
        min: min as i64,
        max: max as i64,
    }
}

/// Validate one field by name. Total, idempotent, and never fails; names
/// without a rule pass through unchanged.
#[must_use]
pub fn validate_field(field: &str, raw: &Value) -> Value {
    FieldRule::for_field(field).map_or_else(|| raw.clone(), |rule| rule.apply(raw))
}

/// Numeric limits for a field, if it is numeric.
#[must_use]
pub fn bounds_for(field: &str) -> Option<(f64, f64)> {
    match FieldRule::for_field(field)? {
        FieldRule::Integer { min, max } => Some((i64_to_f64(min), i64_to_f64(max))),
        FieldRule::Fraction { min, max } => Some((min, max)),
        FieldRule::Seat | FieldRule::View | FieldRule::PlotTag => None,
    }
}

fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Coerce any JSON value to an integer in `[min, max]`. Values with no
/// numeric reading fall to `min`.
#[must_use]
pub fn coerce_integer(raw: &Value, min: i64, max: i64) -> i64 {
    let value = match raw {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|_| i64::MAX))
            .or_else(|| number.as_f64().map(round_f64_to_i64)),
        Value::String(text) => parse_numeric(text).map(round_f64_to_i64),
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    value.map_or(min, |v| v.clamp(min, max))
}

/// Coerce any JSON value to a fraction in `[min, max]`.
#[must_use]
pub fn coerce_fraction(raw: &Value, min: f64, max: f64) -> f64 {
    let value = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_numeric(text),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    value.map_or(min, |v| clamp_fraction(v, (min, max)))
}

/// Clamp a fraction, mapping NaN to the lower bound and `-0.0` to `0.0`.
#[must_use]
pub fn clamp_fraction(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max) + 0.0
}

#[must_use]
pub fn clamp_int(raw: i64, range: (i32, i32)) -> i32 {
    clamp_to_i32(raw, range)
}

#[must_use]
pub fn clamp_listeners(raw: i64) -> i64 {
    raw.clamp(MONTHLY_LISTENERS_RANGE.0, MONTHLY_LISTENERS_RANGE.1)
}

#[must_use]
pub fn clamp_buzz(raw: f64) -> f64 {
    clamp_fraction(raw, BUZZ_RANGE)
}

/// Map a narrative-branch label to a known tag, or the default tag.
#[must_use]
pub fn plot_tag(raw: &str) -> String {
    let candidate = raw.trim().to_ascii_lowercase();
    if KNOWN_PLOT_TAGS.contains(&candidate.as_str()) {
        candidate
    } else {
        DEFAULT_PLOT_TAG.to_string()
    }
}

fn coerce_enum<T>(raw: &Value) -> T
where
    T: FromStr + Default,
{
    raw.as_str()
        .and_then(|text| text.trim().to_ascii_lowercase().parse().ok())
        .unwrap_or_default()
}
