//! The session record and typed partial updates to it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::config::SessionConfig;
use crate::constants::{
    DEFAULT_PLOT_TAG, DIFFICULTY_RANGE, HEALTH_RANGE, KNOB_RANGE, MOMENTUM_RANGE, MONEY_RANGE,
    PLAYER_SKILL_RANGE, PLOT_RANGE, SPEED_CRANK_RANGE,
};
use crate::numbers::clamp_to_u32;
use crate::regions::RegionId;
use crate::sequencer::sequence_count;
use crate::tutorial::TutorialPhase;
use crate::validation::{clamp_buzz, clamp_int, clamp_listeners, plot_tag, validate_field};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeatPosition {
    #[default]
    Frontseat,
    Backseat,
}

impl SeatPosition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frontseat => "frontseat",
            Self::Backseat => "backseat",
        }
    }
}

impl fmt::Display for SeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatPosition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontseat" => Ok(Self::Frontseat),
            "backseat" => Ok(Self::Backseat),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Main,
    Overlay,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Overlay => "overlay",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "overlay" => Ok(Self::Overlay),
            _ => Err(()),
        }
    }
}

fn default_plot_tag() -> String {
    DEFAULT_PLOT_TAG.to_string()
}

/// The authoritative record of one play-through.
///
/// Field names serialize as camelCase; the persisted save record and the
/// dynamic update surface both use those names.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub game_started: bool,
    pub car_started: bool,
    pub keys_in_ignition: bool,
    pub has_open_menu: bool,
    pub game_time_hours: u32,
    /// Monotonic tick count driven by the external session timer.
    pub step_counter: u64,
    #[serde(default)]
    pub session_start_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_save_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tutorial_phase: TutorialPhase,
    #[serde(default)]
    pub tutorial_step: u32,
    pub money: i32,
    pub health: i32,
    pub player_skill: i32,
    pub difficulty: i32,
    pub momentum: i32,
    pub monthly_listeners: i64,
    pub buzz: f64,
    pub plot_a: i32,
    pub plot_b: i32,
    pub plot_c: i32,
    #[serde(rename = "plotAEnum", default = "default_plot_tag")]
    pub plot_a_tag: String,
    #[serde(rename = "plotBEnum", default = "default_plot_tag")]
    pub plot_b_tag: String,
    #[serde(rename = "plotCEnum", default = "default_plot_tag")]
    pub plot_c_tag: String,
    pub current_region: RegionId,
    /// Stops completed during the current region visit.
    pub shows_in_current_region: u32,
    /// Every region entered, in order. Append-only.
    pub region_history: Vec<RegionId>,
    /// Cached stop count for the current visit.
    pub sequences_in_current_region: u32,
    pub speed_crank_percentage: i32,
    pub knob_value: i32,
    #[serde(default)]
    pub current_position: SeatPosition,
    #[serde(default)]
    pub current_view: ViewMode,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl SessionState {
    /// Build a fresh record from configured initial values.
    ///
    /// The starting region counts as the first visit: it seeds the history and
    /// the cached stop count.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        let region = config.starting_region.clone();
        let sequences = sequence_count(region.as_str(), 1);
        Self {
            game_started: false,
            car_started: false,
            keys_in_ignition: false,
            has_open_menu: false,
            game_time_hours: clamp_to_u32(config.game_time_hours),
            step_counter: 0,
            session_start_timestamp: None,
            last_save_timestamp: None,
            tutorial_phase: TutorialPhase::None,
            tutorial_step: 0,
            money: clamp_int(config.money, MONEY_RANGE),
            health: clamp_int(config.health, HEALTH_RANGE),
            player_skill: clamp_int(config.player_skill, PLAYER_SKILL_RANGE),
            difficulty: clamp_int(config.difficulty, DIFFICULTY_RANGE),
            momentum: clamp_int(config.momentum, MOMENTUM_RANGE),
            monthly_listeners: clamp_listeners(config.monthly_listeners),
            buzz: clamp_buzz(config.buzz),
            plot_a: 0,
            plot_b: 0,
            plot_c: 0,
            plot_a_tag: default_plot_tag(),
            plot_b_tag: default_plot_tag(),
            plot_c_tag: default_plot_tag(),
            region_history: vec![region.clone()],
            current_region: region,
            shows_in_current_region: 0,
            sequences_in_current_region: sequences,
            speed_crank_percentage: clamp_int(config.speed_crank_percentage, SPEED_CRANK_RANGE),
            knob_value: clamp_int(config.knob_value, KNOB_RANGE),
            current_position: SeatPosition::default(),
            current_view: ViewMode::default(),
        }
    }

    /// Structural equality ignoring the bookkeeping timestamps.
    #[must_use]
    pub fn same_progress(&self, other: &Self) -> bool {
        let mut probe = other.clone();
        probe.session_start_timestamp = self.session_start_timestamp;
        probe.last_save_timestamp = self.last_save_timestamp;
        probe == *self
    }

    /// Number of times `region` appears in the history.
    #[must_use]
    pub fn visit_count(&self, region: &RegionId) -> u32 {
        let visits = self
            .region_history
            .iter()
            .filter(|entry| *entry == region)
            .count();
        u32::try_from(visits).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub const fn is_final_sequence_for_region(&self) -> bool {
        self.shows_in_current_region >= self.sequences_in_current_region.saturating_sub(1)
    }

    #[must_use]
    pub const fn should_choose_next_region(&self) -> bool {
        self.shows_in_current_region >= self.sequences_in_current_region
    }

    pub(crate) fn apply_patch(&mut self, patch: &StatePatch) {
        if let Some(flag) = patch.game_started {
            self.game_started = flag;
        }
        if let Some(flag) = patch.car_started {
            self.car_started = flag;
        }
        if let Some(flag) = patch.keys_in_ignition {
            self.keys_in_ignition = flag;
        }
        if let Some(flag) = patch.has_open_menu {
            self.has_open_menu = flag;
        }
        if let Some(hours) = patch.game_time_hours {
            self.game_time_hours = clamp_to_u32(hours);
        }
        if let Some(money) = patch.money {
            self.money = clamp_int(money, MONEY_RANGE);
        }
        if let Some(health) = patch.health {
            self.health = clamp_int(health, HEALTH_RANGE);
        }
        if let Some(skill) = patch.player_skill {
            self.player_skill = clamp_int(skill, PLAYER_SKILL_RANGE);
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = clamp_int(difficulty, DIFFICULTY_RANGE);
        }
        if let Some(momentum) = patch.momentum {
            self.momentum = clamp_int(momentum, MOMENTUM_RANGE);
        }
        if let Some(listeners) = patch.monthly_listeners {
            self.monthly_listeners = clamp_listeners(listeners);
        }
        if let Some(buzz) = patch.buzz {
            self.buzz = clamp_buzz(buzz);
        }
        if let Some(plot) = patch.plot_a {
            self.plot_a = clamp_int(plot, PLOT_RANGE);
        }
        if let Some(plot) = patch.plot_b {
            self.plot_b = clamp_int(plot, PLOT_RANGE);
        }
        if let Some(plot) = patch.plot_c {
            self.plot_c = clamp_int(plot, PLOT_RANGE);
        }
        if let Some(tag) = patch.plot_a_tag.as_deref() {
            self.plot_a_tag = plot_tag(tag);
        }
        if let Some(tag) = patch.plot_b_tag.as_deref() {
            self.plot_b_tag = plot_tag(tag);
        }
        if let Some(tag) = patch.plot_c_tag.as_deref() {
            self.plot_c_tag = plot_tag(tag);
        }
        if let Some(shows) = patch.shows_in_current_region {
            self.shows_in_current_region = clamp_to_u32(shows);
        }
        if let Some(crank) = patch.speed_crank_percentage {
            self.speed_crank_percentage = clamp_int(crank, SPEED_CRANK_RANGE);
        }
        if let Some(knob) = patch.knob_value {
            self.knob_value = clamp_int(knob, KNOB_RANGE);
        }
        if let Some(position) = patch.current_position {
            self.current_position = position;
        }
        if let Some(view) = patch.current_view {
            self.current_view = view;
        }
    }

    /// Merge loosely typed fields into the record, one field at a time.
    ///
    /// Each value is validated first. Fields in `protected`, unknown names and
    /// values that still do not fit the field's type are skipped, leaving the
    /// current value in place. Returns the number of fields applied.
    pub(crate) fn merge_fields(&mut self, fields: &Map<String, Value>, protected: &[&str]) -> usize {
        let Ok(Value::Object(mut current)) = serde_json::to_value(&*self) else {
            return 0;
        };
        let mut applied = 0;
        for (name, raw) in fields {
            if protected.contains(&name.as_str()) {
                log::debug!("ignoring write to protected field {name}");
                continue;
            }
            if !current.contains_key(name) {
                log::debug!("ignoring unknown session field {name}");
                continue;
            }
            let validated = validate_field(name, raw);
            let previous = current.insert(name.clone(), validated);
            match serde_json::from_value::<Self>(Value::Object(current.clone())) {
                Ok(merged) => {
                    *self = merged;
                    applied += 1;
                }
                Err(err) => {
                    log::debug!("skipping session field {name}: {err}");
                    if let Some(previous) = previous {
                        current.insert(name.clone(), previous);
                    }
                }
            }
        }
        applied
    }
}

/// A partial update. `None` fields are left untouched; numeric fields are
/// wide so that out-of-range requests reach the validator intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatePatch {
    pub game_started: Option<bool>,
    pub car_started: Option<bool>,
    pub keys_in_ignition: Option<bool>,
    pub has_open_menu: Option<bool>,
    pub game_time_hours: Option<i64>,
    pub money: Option<i64>,
    pub health: Option<i64>,
    pub player_skill: Option<i64>,
    pub difficulty: Option<i64>,
    pub momentum: Option<i64>,
    pub monthly_listeners: Option<i64>,
    pub buzz: Option<f64>,
    pub plot_a: Option<i64>,
    pub plot_b: Option<i64>,
    pub plot_c: Option<i64>,
    #[serde(rename = "plotAEnum")]
    pub plot_a_tag: Option<String>,
    #[serde(rename = "plotBEnum")]
    pub plot_b_tag: Option<String>,
    #[serde(rename = "plotCEnum")]
    pub plot_c_tag: Option<String>,
    pub shows_in_current_region: Option<i64>,
    pub speed_crank_percentage: Option<i64>,
    pub knob_value: Option<i64>,
    pub current_position: Option<SeatPosition>,
    pub current_view: Option<ViewMode>,
}

impl StatePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
