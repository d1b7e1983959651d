use anyhow::{Context, Result, ensure};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};

use crate::logic::driver::{RunSummary, SessionDriver, SessionPlan};
use tourbus_game::constants::{INITIAL_DRIVING_STEPS, LISTENER_BUZZ_MULTIPLIER};
use tourbus_game::numbers::floor_f64_to_i64;
use tourbus_game::{
    RegionGraph, RegionId, Session, StatePatch, TutorialPhase, bounds_for, sequence_count,
    validate_field,
};

const SWEEP_SAMPLES: usize = 64;
const REPLAY_VISITS: usize = 4;

const BOUNDED_FIELDS: &[&str] = &[
    "money",
    "health",
    "playerSkill",
    "difficulty",
    "momentum",
    "monthlyListeners",
    "buzz",
    "plotA",
    "plotB",
    "plotC",
    "speedCrankPercentage",
    "knobValue",
];

pub struct CatalogEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> SessionPlan,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: "smoke",
        name: "Smoke Session",
        description: "Short play-through: tutorial, two visits, field bounds",
        build: smoke_plan,
    },
    CatalogEntry {
        key: "tutorial-walkthrough",
        name: "Tutorial Walkthrough",
        description: "Tutorial phases advance in order and credit listeners once",
        build: tutorial_plan,
    },
    CatalogEntry {
        key: "region-itinerary",
        name: "Region Itinerary",
        description: "Stop counts, visit counts and region adjacency over a long tour",
        build: itinerary_plan,
    },
    CatalogEntry {
        key: "validation-sweep",
        name: "Validation Sweep",
        description: "Seeded hostile inputs always coerce into field bounds",
        build: validation_plan,
    },
    CatalogEntry {
        key: "save-roundtrip",
        name: "Save Round Trip",
        description: "Save, load, tamper and clear a save slot",
        build: save_plan,
    },
    CatalogEntry {
        key: "deterministic-replay",
        name: "Deterministic Replay",
        description: "Same seed replays to the same session state",
        build: replay_plan,
    },
];

fn smoke_plan() -> SessionPlan {
    SessionPlan::new()
        .with_visits(2)
        .with_expectation(fields_within_bounds)
        .with_expectation(tutorial_completed)
        .with_expectation(bookkeeping_consistent)
}

fn tutorial_plan() -> SessionPlan {
    SessionPlan::new()
        .with_visits(0)
        .with_expectation(tutorial_completed)
        .with_expectation(tutorial_phase_order)
        .with_expectation(keys_gate_the_tutorial)
}

fn itinerary_plan() -> SessionPlan {
    SessionPlan::new()
        .with_visits(8)
        .with_expectation(itinerary_follows_sequencer)
        .with_expectation(itinerary_follows_graph)
}

fn validation_plan() -> SessionPlan {
    SessionPlan::new()
        .with_visits(1)
        .with_expectation(fields_within_bounds)
        .with_expectation(hostile_inputs_coerce)
        .with_expectation(hostile_patches_clamp)
}

fn save_plan() -> SessionPlan {
    SessionPlan::new()
        .with_visits(3)
        .with_persistence(None)
        .with_expectation(save_slot_behaves)
}

fn replay_plan() -> SessionPlan {
    SessionPlan::new()
        .with_visits(REPLAY_VISITS)
        .with_expectation(replay_matches)
}

fn fields_within_bounds(summary: &RunSummary) -> Result<()> {
    let state = serde_json::to_value(&summary.final_state).context("serialize final state")?;
    for field in BOUNDED_FIELDS {
        let (min, max) = bounds_for(field).with_context(|| format!("{field} has no bounds"))?;
        let value = state[*field]
            .as_f64()
            .with_context(|| format!("{field} is not numeric"))?;
        ensure!(
            (min..=max).contains(&value),
            "{field} = {value} outside [{min}, {max}]"
        );
    }
    Ok(())
}

fn tutorial_completed(summary: &RunSummary) -> Result<()> {
    ensure!(
        summary.completed_tutorial(),
        "tutorial stuck in {} after {} advances",
        summary.final_state.tutorial_phase,
        summary.tutorial_advances
    );
    Ok(())
}

fn bookkeeping_consistent(summary: &RunSummary) -> Result<()> {
    ensure!(
        summary.ticks == summary.final_state.step_counter,
        "tick count {} disagrees with step counter {}",
        summary.ticks,
        summary.final_state.step_counter
    );
    ensure!(summary.notifications > 0, "no change notifications observed");
    ensure!(summary.final_state.game_started, "game never started");
    ensure!(
        summary.final_state.session_start_timestamp.is_some(),
        "session start was not stamped"
    );
    Ok(())
}

fn tutorial_phase_order(summary: &RunSummary) -> Result<()> {
    ensure!(
        summary.phases.as_slice() == TutorialPhase::ORDER.as_slice(),
        "phases observed out of order: {:?}",
        summary.phases
    );
    let minimum = usize::try_from(INITIAL_DRIVING_STEPS).unwrap_or(usize::MAX) + 3;
    ensure!(
        summary.tutorial_advances >= minimum,
        "walkthrough finished in {} advances, expected at least {minimum}",
        summary.tutorial_advances
    );
    let credit = summary
        .countdown_credit
        .context("countdown never credited listeners")?;
    let expected = floor_f64_to_i64(summary.buzz_at_countdown * LISTENER_BUZZ_MULTIPLIER);
    ensure!(
        credit == expected,
        "countdown credited {credit}, expected {expected}"
    );
    Ok(())
}

fn keys_gate_the_tutorial(summary: &RunSummary) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(summary.seed);
    let mut session = Session::default();
    ensure!(session.start_tutorial(), "fresh session refused to start tutorial");
    ensure!(!session.start_tutorial(), "tutorial started twice");
    for _ in 0..rng.gen_range(1..40) {
        let transition = session.advance_tutorial();
        ensure!(
            transition.to == TutorialPhase::KeysPlacement,
            "left keys placement without keys"
        );
    }
    session.update(&StatePatch {
        keys_in_ignition: Some(true),
        ..StatePatch::default()
    });
    let transition = session.advance_tutorial();
    ensure!(
        transition.entered(TutorialPhase::InitialDriving) && transition.step == 0,
        "keys did not start initial driving: {transition:?}"
    );
    Ok(())
}

fn itinerary_follows_sequencer(summary: &RunSummary) -> Result<()> {
    let history = &summary.final_state.region_history;
    ensure!(
        history.len() == summary.visits.len() + 1,
        "history has {} entries for {} visits",
        history.len(),
        summary.visits.len()
    );
    for (index, visit) in summary.visits.iter().enumerate() {
        let prior = history[..=index]
            .iter()
            .filter(|region| **region == visit.region)
            .count();
        let expected_visit = u32::try_from(prior + 1).unwrap_or(u32::MAX);
        ensure!(
            visit.visit == expected_visit,
            "{} recorded as visit {}, history says {expected_visit}",
            visit.region,
            visit.visit
        );
        let expected_stops = sequence_count(visit.region.as_str(), visit.visit);
        ensure!(
            visit.stops == expected_stops,
            "{} visit {} planned {} stops, sequencer says {expected_stops}",
            visit.region,
            visit.visit,
            visit.stops
        );
        ensure!(
            (2..=3).contains(&visit.stops),
            "stop count {} out of range",
            visit.stops
        );
        ensure!(
            visit.shows == visit.stops && visit.ready_for_next,
            "{} finished with {}/{} shows",
            visit.region,
            visit.shows,
            visit.stops
        );
    }
    Ok(())
}

fn itinerary_follows_graph(summary: &RunSummary) -> Result<()> {
    let graph = RegionGraph::default_graph();
    let history = &summary.final_state.region_history;
    ensure!(
        history.first() == Some(&summary.initial_state.current_region),
        "history does not start in the starting region"
    );
    for pair in history.windows(2) {
        ensure!(
            graph.can_travel(&pair[0], &pair[1]),
            "travelled {} -> {} without a road",
            pair[0],
            pair[1]
        );
    }
    let current = history.last().context("empty history")?;
    ensure!(
        *current == summary.final_state.current_region,
        "current region {} is not the last history entry {current}",
        summary.final_state.current_region
    );
    Ok(())
}

fn hostile_value(rng: &mut ChaCha20Rng) -> Value {
    match rng.gen_range(0..8) {
        0 => json!(rng.gen_range(-1_000_000_000_000_i64..1_000_000_000_000)),
        1 => json!(rng.gen_range(-1.0e6..1.0e6)),
        2 => json!(rng.gen_range(-500..500).to_string()),
        3 => json!(rng.gen_bool(0.5)),
        4 => Value::Null,
        5 => json!({"nested": rng.r#gen::<u32>()}),
        6 => json!(["not", "a", "number"]),
        _ => {
            let words = ["NaN", "inf", "-inf", "twelve", "", "1e400"];
            json!(words.choose(rng).copied().unwrap_or_default())
        }
    }
}

fn hostile_inputs_coerce(summary: &RunSummary) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(summary.seed);
    for field in BOUNDED_FIELDS {
        let (min, max) = bounds_for(field).with_context(|| format!("{field} has no bounds"))?;
        for _ in 0..SWEEP_SAMPLES {
            let raw = hostile_value(&mut rng);
            let once = validate_field(field, &raw);
            let value = once
                .as_f64()
                .with_context(|| format!("{field} <- {raw} was not coerced to a number"))?;
            ensure!(
                (min..=max).contains(&value),
                "{field} <- {raw} gave {value} outside [{min}, {max}]"
            );
            let twice = validate_field(field, &once);
            ensure!(once == twice, "{field} not idempotent: {once} then {twice}");
        }
    }
    for (field, fallback) in [("currentPosition", "frontseat"), ("currentView", "main")] {
        let coerced = validate_field(field, &hostile_value(&mut rng));
        ensure!(
            coerced.is_string(),
            "{field} coerced to a non-string {coerced}"
        );
        ensure!(
            validate_field(field, &json!("sideways")) == json!(fallback),
            "{field} did not fall back to {fallback}"
        );
    }
    Ok(())
}

fn hostile_patches_clamp(summary: &RunSummary) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(summary.seed ^ 0x5EED);
    let mut session = Session::default();
    for _ in 0..SWEEP_SAMPLES {
        session.update(&StatePatch {
            money: Some(rng.gen_range(-50_000..50_000)),
            health: Some(rng.gen_range(-500..500)),
            monthly_listeners: Some(rng.r#gen::<i64>()),
            buzz: Some(rng.gen_range(-1.0e3..1.0e3)),
            knob_value: Some(rng.gen_range(-300..300)),
            ..StatePatch::default()
        });
        let state = session.state();
        ensure!((0..=9_999).contains(&state.money), "money {}", state.money);
        ensure!((0..=100).contains(&state.health), "health {}", state.health);
        ensure!(
            (0..=999_999_999).contains(&state.monthly_listeners),
            "listeners {}",
            state.monthly_listeners
        );
        ensure!((0.0..=100.0).contains(&state.buzz), "buzz {}", state.buzz);
        ensure!((0..=100).contains(&state.knob_value), "knob {}", state.knob_value);
    }
    Ok(())
}

fn save_slot_behaves(summary: &RunSummary) -> Result<()> {
    let check = summary
        .save_check
        .context("persistence leg did not run")?;
    ensure!(check.saved, "save failed");
    ensure!(check.stamp_advanced, "save did not stamp the session");
    ensure!(check.restored_matches, "loaded state differs from saved state");
    ensure!(
        check.rejected_missing_money,
        "record without money was accepted"
    );
    ensure!(
        check.live_state_untouched,
        "rejected load modified the live session"
    );
    ensure!(check.cleared, "slot survived clear");
    Ok(())
}

fn replay_matches(summary: &RunSummary) -> Result<()> {
    let replay = SessionDriver::new(false).run_plan(
        &SessionPlan::new().with_visits(REPLAY_VISITS),
        summary.seed,
    );
    ensure!(
        replay.final_state.same_progress(&summary.final_state),
        "seed {} replayed to a different state",
        summary.seed
    );
    let stops = |run: &RunSummary| -> Vec<(RegionId, u32)> {
        run.visits
            .iter()
            .map(|visit| (visit.region.clone(), visit.stops))
            .collect()
    };
    ensure!(
        stops(&replay) == stops(summary),
        "seed {} replayed a different itinerary",
        summary.seed
    );
    ensure!(
        replay.notifications == summary.notifications,
        "notification count drifted: {} vs {}",
        replay.notifications,
        summary.notifications
    );
    Ok(())
}
