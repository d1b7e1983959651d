use anyhow::Result;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::Value;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tourbus_game::{
    EventKind, EventPlan, FileStore, MemoryStore, PersistenceGateway, PlannedEvent, RegionGraph,
    RegionId, SaveStore, Session, SessionConfig, SessionState, StatePatch, TutorialPhase,
};

/// Upper bound on tutorial advances before a run is declared stuck.
const MAX_TUTORIAL_ADVANCES: usize = 200;
const DEFAULT_VISITS: usize = 4;

pub type Expectation = fn(&RunSummary) -> Result<()>;

/// What a scripted run does and how it is judged.
#[derive(Clone)]
pub struct SessionPlan {
    pub visits: usize,
    pub persist: bool,
    pub save_dir: Option<PathBuf>,
    pub expectations: Vec<Expectation>,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPlan {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            visits: DEFAULT_VISITS,
            persist: false,
            save_dir: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_visits(mut self, visits: usize) -> Self {
        self.visits = visits;
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, save_dir: Option<PathBuf>) -> Self {
        self.persist = true;
        self.save_dir = save_dir;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// One completed region visit.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub region: RegionId,
    pub visit: u32,
    pub stops: u32,
    pub shows: u32,
    pub story_beats: usize,
    pub choices: usize,
    pub ready_for_next: bool,
}

/// Outcome of the persistence leg of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveCheck {
    pub saved: bool,
    pub restored_matches: bool,
    pub stamp_advanced: bool,
    pub rejected_missing_money: bool,
    pub live_state_untouched: bool,
    pub cleared: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub initial_state: SessionState,
    pub final_state: SessionState,
    pub phases: Vec<TutorialPhase>,
    pub tutorial_advances: usize,
    pub countdown_credit: Option<i64>,
    pub buzz_at_countdown: f64,
    pub visits: Vec<VisitRecord>,
    pub notifications: usize,
    pub ticks: u64,
    pub save_check: Option<SaveCheck>,
}

impl RunSummary {
    #[must_use]
    pub fn completed_tutorial(&self) -> bool {
        self.final_state.tutorial_phase == TutorialPhase::Normal
    }
}

/// Plays a session with seeded random decisions.
#[derive(Debug, Clone)]
pub struct SessionDriver {
    graph: RegionGraph,
    config: SessionConfig,
    verbose: bool,
}

impl SessionDriver {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            graph: RegionGraph::default_graph(),
            config: SessionConfig::default_config(),
            verbose,
        }
    }

    pub fn run_plan(&self, plan: &SessionPlan, seed: u64) -> RunSummary {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut session = Session::new(self.config.clone());
        let initial_state = session.snapshot();

        let notifications = Rc::new(RefCell::new(0_usize));
        let phases = Rc::new(RefCell::new(Vec::<TutorialPhase>::new()));
        {
            let notifications = Rc::clone(&notifications);
            let phases = Rc::clone(&phases);
            session.subscribe(move |state: &SessionState| {
                *notifications.borrow_mut() += 1;
                let mut phases = phases.borrow_mut();
                if phases.last() != Some(&state.tutorial_phase) {
                    phases.push(state.tutorial_phase);
                }
            });
        }

        session.start_game();
        session.start_tutorial();
        let (tutorial_advances, countdown_credit, buzz_at_countdown) =
            self.play_tutorial(&mut session, &mut rng);

        let mut visits = Vec::with_capacity(plan.visits);
        for _ in 0..plan.visits {
            let Some(next) = self
                .graph
                .neighbors(session.current_region())
                .choose(&mut rng)
                .cloned()
            else {
                break;
            };
            visits.push(self.play_visit(&mut session, &mut rng, next));
        }

        let save_check = plan.persist.then(|| match &plan.save_dir {
            Some(dir) => {
                let key = format!("tourbus-tester-{seed}");
                let gateway = PersistenceGateway::with_key(FileStore::new(dir), key);
                exercise_persistence(&gateway, &mut session, seed)
            }
            None => exercise_persistence(
                &PersistenceGateway::new(MemoryStore::new()),
                &mut session,
                seed,
            ),
        });

        let final_state = session.snapshot();
        let ticks = final_state.step_counter;
        drop(session);
        let notifications = *notifications.borrow();
        let phases = phases.borrow().clone();

        RunSummary {
            seed,
            initial_state,
            final_state,
            phases,
            tutorial_advances,
            countdown_credit,
            buzz_at_countdown,
            visits,
            notifications,
            ticks,
            save_check,
        }
    }

    fn play_tutorial(&self, session: &mut Session, rng: &mut ChaCha20Rng) -> (usize, Option<i64>, f64) {
        let mut advances = 0;
        let mut credit = None;
        let mut buzz_at_countdown = 0.0;
        while session.is_in_tutorial() && advances < MAX_TUTORIAL_ADVANCES {
            if session.tutorial_phase() == TutorialPhase::KeysPlacement && rng.gen_bool(0.25) {
                session.update(&StatePatch {
                    keys_in_ignition: Some(true),
                    ..StatePatch::default()
                });
            }
            if rng.gen_bool(0.5) {
                session.update_buzz(rng.gen_range(0.0..1.5));
            }
            session.tick();
            let transition = session.advance_tutorial();
            advances += 1;
            if transition.entered(TutorialPhase::Countdown) {
                buzz_at_countdown = session.buzz();
                credit = Some(session.update_listeners_on_countdown());
            }
            if self.verbose && transition.changed_phase() {
                println!("    tutorial {} -> {}", transition.from, transition.to);
            }
        }
        (advances, credit, buzz_at_countdown)
    }

    fn play_visit(&self, session: &mut Session, rng: &mut ChaCha20Rng, region: RegionId) -> VisitRecord {
        let stops = session.change_region(region.clone());
        let visit = session.visit_count(&region);
        let mut plan = EventPlan::with_exits(stops);
        for index in 0..rng.gen_range(0..=2) {
            plan.plan(PlannedEvent::new(
                format!("story-{index}"),
                EventKind::Story,
                rng.gen_range(0.0..100.0),
            ));
        }
        if rng.gen_bool(0.6) {
            plan.plan(PlannedEvent::new(
                "choice-detour",
                EventKind::Choice,
                rng.gen_range(10.0..90.0),
            ));
        }

        let mut story_beats = 0;
        let mut choices = 0;
        let mut progress = 0.0;
        loop {
            for event in plan.fire_due(progress) {
                match event.kind {
                    EventKind::Story => {
                        story_beats += 1;
                        session.update_buzz(rng.gen_range(-0.5..2.0));
                    }
                    EventKind::Choice => {
                        choices += 1;
                        let money = i64::from(session.state().money) + rng.gen_range(-80..=60);
                        session.update(&StatePatch {
                            money: Some(money),
                            momentum: Some(rng.gen_range(-10..=110)),
                            ..StatePatch::default()
                        });
                    }
                    EventKind::Exit => {
                        session.increment_shows_in_current_region();
                    }
                }
            }
            session.tick();
            if progress >= 100.0 {
                break;
            }
            progress = f64::min(progress + rng.gen_range(1.0..15.0), 100.0);
        }

        if self.verbose {
            println!(
                "    {region} visit {visit}: {} / {stops} stops, {story_beats} story, {choices} choice",
                session.shows_in_current_region()
            );
        }

        VisitRecord {
            region,
            visit,
            stops,
            shows: session.shows_in_current_region(),
            story_beats,
            choices,
            ready_for_next: session.should_choose_next_region(),
        }
    }
}

fn exercise_persistence<S: SaveStore>(
    gateway: &PersistenceGateway<S>,
    session: &mut Session,
    step: u64,
) -> SaveCheck {
    let mut check = SaveCheck::default();
    let before_stamp = session.state().last_save_timestamp;
    check.saved = gateway.save(session, step);
    check.stamp_advanced = session.state().last_save_timestamp >= before_stamp
        && session.state().last_save_timestamp.is_some();
    check.restored_matches = gateway
        .load(session)
        .is_some_and(|loaded| loaded.same_progress(session.state()));

    let live = session.snapshot();
    if let Ok(Some(raw)) = gateway.store().read(gateway.key())
        && let Ok(Value::Object(mut record)) = serde_json::from_str::<Value>(&raw)
    {
        record.remove("money");
        let tampered = Value::Object(record).to_string();
        if gateway.store().write(gateway.key(), &tampered).is_ok() {
            check.rejected_missing_money = !gateway.load_into(session);
        }
    }
    check.live_state_untouched = session.state() == &live;
    check.cleared = gateway.clear_save_data() && !gateway.has_save_data();
    check
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_run() {
        let driver = SessionDriver::new(false);
        let plan = SessionPlan::new();
        let first = driver.run_plan(&plan, 7);
        let second = driver.run_plan(&plan, 7);
        assert!(first.final_state.same_progress(&second.final_state));
        assert_eq!(first.phases, second.phases);
        assert_eq!(first.notifications, second.notifications);
    }

    #[test]
    fn runs_finish_the_tutorial_and_every_visit() {
        let driver = SessionDriver::new(false);
        let summary = driver.run_plan(&SessionPlan::new().with_visits(3), 1337);
        assert!(summary.completed_tutorial());
        assert_eq!(summary.visits.len(), 3);
        assert!(summary.visits.iter().all(|visit| visit.ready_for_next));
        assert!(summary.countdown_credit.is_some());
        assert_eq!(summary.ticks, summary.final_state.step_counter);
    }

    #[test]
    fn persistence_leg_passes_in_memory() {
        let driver = SessionDriver::new(false);
        let summary = driver.run_plan(&SessionPlan::new().with_persistence(None), 99);
        let check = summary.save_check.expect("persistence ran");
        assert!(check.saved);
        assert!(check.restored_matches);
        assert!(check.rejected_missing_money);
        assert!(check.live_state_untouched);
        assert!(check.cleared);
    }
}
