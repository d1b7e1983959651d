//! Threshold-triggered events along a region visit.
//!
//! Progress runs from 0 to 100 across one visit. Every planned event fires at
//! most once per visit, as soon as progress reaches its threshold.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::constants::{PROGRESS_MAX, PROGRESS_MIN};
use crate::validation::clamp_fraction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Story,
    Choice,
    Exit,
}

impl EventKind {
    /// Higher fires first and draws on top.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Story => 2,
            Self::Choice => 1,
            Self::Exit => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedEvent {
    pub id: String,
    pub kind: EventKind,
    pub threshold: f64,
    #[serde(default)]
    pub triggered: bool,
}

impl PlannedEvent {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: EventKind, threshold: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            threshold: clamp_progress(threshold),
            triggered: false,
        }
    }

    #[must_use]
    pub fn is_due(&self, progress: f64) -> bool {
        !self.triggered && clamp_progress(progress) >= self.threshold
    }
}

/// Clamp progress into `[0, 100]`; NaN counts as the start of the visit.
#[must_use]
pub fn clamp_progress(progress: f64) -> f64 {
    clamp_fraction(progress, (PROGRESS_MIN, PROGRESS_MAX))
}

/// Evenly spaced exit markers for a visit with `sequences` stops.
#[must_use]
pub fn exit_thresholds(sequences: u32) -> Vec<f64> {
    let slots = f64::from(sequences) + 1.0;
    (1..=sequences)
        .map(|k| f64::from(k) * PROGRESS_MAX / slots)
        .collect()
}

fn fire_order(a: &PlannedEvent, b: &PlannedEvent) -> Ordering {
    a.threshold
        .total_cmp(&b.threshold)
        .then_with(|| b.kind.priority().cmp(&a.kind.priority()))
}

fn marker_order(a: &PlannedEvent, b: &PlannedEvent) -> Ordering {
    b.kind
        .priority()
        .cmp(&a.kind.priority())
        .then_with(|| a.threshold.total_cmp(&b.threshold))
}

/// Ordered plan of events for one region visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPlan {
    events: Vec<PlannedEvent>,
}

impl EventPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan with one exit per stop, at [`exit_thresholds`].
    #[must_use]
    pub fn with_exits(sequences: u32) -> Self {
        let mut plan = Self::new();
        for (index, threshold) in exit_thresholds(sequences).into_iter().enumerate() {
            plan.plan(PlannedEvent::new(
                format!("exit-{}", index + 1),
                EventKind::Exit,
                threshold,
            ));
        }
        plan
    }

    pub fn plan(&mut self, event: PlannedEvent) {
        self.events.push(PlannedEvent {
            threshold: clamp_progress(event.threshold),
            ..event
        });
    }

    #[must_use]
    pub fn events(&self) -> &[PlannedEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn is_due(&self, id: &str, progress: f64) -> bool {
        self.events
            .iter()
            .any(|event| event.id == id && event.is_due(progress))
    }

    /// Events that have not fired yet, in plan order.
    pub fn pending(&self) -> impl Iterator<Item = &PlannedEvent> {
        self.events.iter().filter(|event| !event.triggered)
    }

    /// Mark and return every due event in threshold order. Events sharing a
    /// threshold go story first, then choices, then exits, then plan order.
    pub fn fire_due(&mut self, progress: f64) -> Vec<PlannedEvent> {
        let mut fired: Vec<PlannedEvent> = Vec::new();
        for event in &mut self.events {
            if event.is_due(progress) {
                event.triggered = true;
                fired.push(event.clone());
            }
        }
        fired.sort_by(fire_order);
        if !fired.is_empty() {
            log::debug!("fired {} event(s) at {progress:.1}%", fired.len());
        }
        fired
    }

    /// Events in paint order: lowest priority first, so story beats end on top.
    #[must_use]
    pub fn draw_order(&self) -> Vec<&PlannedEvent> {
        let mut ordered: Vec<&PlannedEvent> = self.events.iter().collect();
        ordered.sort_by(|a, b| marker_order(b, a));
        ordered
    }

    /// Re-arm every event for a new visit.
    pub fn reset_for_visit(&mut self) {
        for event in &mut self.events {
            event.triggered = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> EventPlan {
        let mut plan = EventPlan::with_exits(3);
        plan.plan(PlannedEvent::new("choice-diner", EventKind::Choice, 40.0));
        plan.plan(PlannedEvent::new("story-flat-tire", EventKind::Story, 50.0));
        plan.plan(PlannedEvent::new("story-radio", EventKind::Story, 10.0));
        plan
    }

    fn ids(events: &[PlannedEvent]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    #[test]
    fn exit_markers_are_evenly_spaced() {
        assert_eq!(exit_thresholds(3), vec![25.0, 50.0, 75.0]);
        let two = exit_thresholds(2);
        assert_eq!(two.len(), 2);
        assert!((two[0] - 100.0 / 3.0).abs() < 1e-9);
        assert!(exit_thresholds(0).is_empty());
    }

    #[test]
    fn fires_everything_due_in_threshold_order() {
        let mut plan = sample_plan();
        let fired = plan.fire_due(60.0);
        assert_eq!(
            ids(&fired),
            ["story-radio", "exit-1", "choice-diner", "story-flat-tire", "exit-2"]
        );
        assert!(plan.fire_due(60.0).is_empty());
        assert_eq!(ids(&plan.fire_due(100.0)), ["exit-3"]);
        assert_eq!(plan.pending().count(), 0);
    }

    #[test]
    fn priority_breaks_threshold_ties() {
        let mut plan = EventPlan::new();
        plan.plan(PlannedEvent::new("exit", EventKind::Exit, 30.0));
        plan.plan(PlannedEvent::new("choice", EventKind::Choice, 30.0));
        plan.plan(PlannedEvent::new("story-late", EventKind::Story, 50.0));
        plan.plan(PlannedEvent::new("story", EventKind::Story, 30.0));
        plan.plan(PlannedEvent::new("exit-early", EventKind::Exit, 20.0));
        assert_eq!(
            ids(&plan.fire_due(50.0)),
            ["exit-early", "story", "choice", "exit", "story-late"]
        );
    }

    #[test]
    fn progress_is_clamped() {
        let mut plan = sample_plan();
        assert!(plan.fire_due(f64::NAN).is_empty());
        assert!(plan.fire_due(-5.0).is_empty());
        assert_eq!(plan.fire_due(1e6).len(), plan.len());
        let edge = PlannedEvent::new("late", EventKind::Story, 250.0);
        assert!((edge.threshold - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn due_queries_and_reset() {
        let mut plan = sample_plan();
        assert!(plan.is_due("story-radio", 10.0));
        assert!(!plan.is_due("story-radio", 9.9));
        assert!(!plan.is_due("missing", 100.0));
        plan.fire_due(30.0);
        assert!(!plan.is_due("story-radio", 30.0));
        assert_eq!(plan.pending().count(), 4);
        plan.reset_for_visit();
        assert_eq!(plan.pending().count(), plan.len());
    }

    #[test]
    fn story_beats_draw_on_top() {
        let plan = sample_plan();
        let order: Vec<&str> = plan
            .draw_order()
            .into_iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(order.first(), Some(&"exit-3"));
        assert_eq!(order.last(), Some(&"story-radio"));
        let choice = order.iter().position(|id| *id == "choice-diner");
        let first_story = order.iter().position(|id| id.starts_with("story"));
        assert!(choice < first_story);
    }
}
