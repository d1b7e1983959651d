use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

use crate::config::SessionConfig;
use crate::constants::{LISTENER_BUZZ_MULTIPLIER, PROTECTED_FIELDS};
use crate::numbers::floor_f64_to_i64;
use crate::regions::RegionId;
use crate::sequencer::sequence_count;
use crate::state::{SessionState, StatePatch};
use crate::tutorial::{Transition, TutorialPhase};

/// Callback invoked with the new state after every structural change.
pub type ChangeListener = Box<dyn FnMut(&SessionState)>;

/// Owner of the live [`SessionState`]. All reads and writes go through here.
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default_config())
    }
}

impl Session {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let state = SessionState::from_config(&config);
        Self {
            config,
            state,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Reset to the configured initial values and notify listeners.
    pub fn initialize(&mut self) {
        self.state = SessionState::from_config(&self.config);
        log::debug!("session initialized in {}", self.state.current_region);
        self.notify();
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    #[must_use]
    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// Register a change listener. Listeners run in registration order.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&SessionState) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Apply a typed partial update. Returns whether anything changed.
    pub fn update(&mut self, patch: &StatePatch) -> bool {
        self.mutate(|state| state.apply_patch(patch))
    }

    /// Apply loosely typed fields, each passed through the validator.
    ///
    /// Unknown names, protected bookkeeping fields and values that do not fit
    /// the field type are ignored.
    pub fn update_fields(&mut self, fields: &Map<String, Value>) -> bool {
        self.mutate(|state| {
            state.merge_fields(fields, PROTECTED_FIELDS);
        })
    }

    pub fn start_game(&mut self) -> bool {
        self.mutate(|state| {
            state.game_started = true;
            state.session_start_timestamp = Some(Utc::now());
        })
    }

    pub fn stop_game(&mut self) -> bool {
        self.mutate(|state| {
            state.game_started = false;
            state.session_start_timestamp = Some(Utc::now());
        })
    }

    /// Enter `region`, starting a new visit. Returns the stop count for it.
    pub fn change_region(&mut self, region: impl Into<RegionId>) -> u32 {
        let region = region.into();
        let visit = self.state.visit_count(&region).saturating_add(1);
        let sequences = sequence_count(region.as_str(), visit);
        log::info!("entering {region} (visit {visit}, {sequences} stops)");
        self.mutate(|state| {
            state.region_history.push(region.clone());
            state.current_region = region;
            state.shows_in_current_region = 0;
            state.sequences_in_current_region = sequences;
        });
        sequences
    }

    pub fn increment_shows_in_current_region(&mut self) -> bool {
        let shows = i64::from(self.state.shows_in_current_region) + 1;
        self.update(&StatePatch {
            shows_in_current_region: Some(shows),
            ..StatePatch::default()
        })
    }

    #[must_use]
    pub const fn is_final_sequence_for_region(&self) -> bool {
        self.state.is_final_sequence_for_region()
    }

    #[must_use]
    pub const fn should_choose_next_region(&self) -> bool {
        self.state.should_choose_next_region()
    }

    pub fn update_buzz(&mut self, delta: f64) -> bool {
        self.update(&StatePatch {
            buzz: Some(self.state.buzz + delta),
            ..StatePatch::default()
        })
    }

    /// Credit listeners earned by the current buzz. Returns the amount added
    /// before clamping.
    pub fn update_listeners_on_countdown(&mut self) -> i64 {
        let gain = floor_f64_to_i64(self.state.buzz * LISTENER_BUZZ_MULTIPLIER);
        self.update(&StatePatch {
            monthly_listeners: Some(self.state.monthly_listeners.saturating_add(gain)),
            ..StatePatch::default()
        });
        gain
    }

    /// Enter the walkthrough. Only valid before it has ever started.
    pub fn start_tutorial(&mut self) -> bool {
        if self.state.tutorial_phase != TutorialPhase::None {
            return false;
        }
        log::debug!("tutorial: none -> keys_placement");
        self.mutate(|state| {
            state.tutorial_phase = TutorialPhase::KeysPlacement;
            state.tutorial_step = 0;
        })
    }

    pub fn advance_tutorial(&mut self) -> Transition {
        let transition = self
            .state
            .tutorial_phase
            .next(self.state.tutorial_step, self.state.keys_in_ignition);
        if transition.changed_phase() {
            log::debug!("tutorial: {} -> {}", transition.from, transition.to);
        }
        self.mutate(|state| {
            state.tutorial_phase = transition.to;
            state.tutorial_step = transition.step;
        });
        transition
    }

    /// Advance the step counter by one timer tick.
    pub fn tick(&mut self) -> u64 {
        self.mutate(|state| state.step_counter = state.step_counter.saturating_add(1));
        self.state.step_counter
    }

    /// Replace the live state wholesale, e.g. with a loaded save.
    pub fn restore(&mut self, state: SessionState) {
        self.state = state;
        self.notify();
    }

    /// Stamp a completed save. The stamp never moves backwards; returns the
    /// stamp kept.
    pub(crate) fn mark_saved(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = self
            .state
            .last_save_timestamp
            .map_or(at, |previous| previous.max(at));
        self.state.last_save_timestamp = Some(stamp);
        stamp
    }

    #[must_use]
    pub const fn current_region(&self) -> &RegionId {
        &self.state.current_region
    }

    #[must_use]
    pub const fn shows_in_current_region(&self) -> u32 {
        self.state.shows_in_current_region
    }

    #[must_use]
    pub const fn sequences_for_current_region(&self) -> u32 {
        self.state.sequences_in_current_region
    }

    #[must_use]
    pub const fn monthly_listeners(&self) -> i64 {
        self.state.monthly_listeners
    }

    #[must_use]
    pub const fn buzz(&self) -> f64 {
        self.state.buzz
    }

    #[must_use]
    pub const fn tutorial_phase(&self) -> TutorialPhase {
        self.state.tutorial_phase
    }

    #[must_use]
    pub const fn is_in_tutorial(&self) -> bool {
        self.state.tutorial_phase.is_in_tutorial()
    }

    #[must_use]
    pub fn visit_count(&self, region: &RegionId) -> u32 {
        self.state.visit_count(region)
    }

    fn mutate<F>(&mut self, apply: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        let before = self.state.clone();
        apply(&mut self.state);
        let now = Utc::now();
        let stamp = self
            .state
            .last_save_timestamp
            .map_or(now, |previous| previous.max(now));
        self.state.last_save_timestamp = Some(stamp);
        let changed = !before.same_progress(&self.state);
        if changed {
            self.notify();
        }
        changed
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.state);
        }
    }
}
