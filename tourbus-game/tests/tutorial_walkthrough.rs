use std::cell::RefCell;
use std::rc::Rc;

use tourbus_game::constants::INITIAL_DRIVING_STEPS;
use tourbus_game::{Session, StatePatch, TutorialPhase};

fn turn_keys(session: &mut Session) {
    session.update(&StatePatch {
        keys_in_ignition: Some(true),
        ..StatePatch::default()
    });
}

#[test]
fn full_walkthrough_reaches_normal() {
    let mut session = Session::default();
    assert_eq!(session.tutorial_phase(), TutorialPhase::None);
    assert!(session.start_tutorial());

    for _ in 0..25 {
        let t = session.advance_tutorial();
        assert_eq!(t.to, TutorialPhase::KeysPlacement);
    }

    turn_keys(&mut session);
    let t = session.advance_tutorial();
    assert!(t.entered(TutorialPhase::InitialDriving));
    assert_eq!(session.state().tutorial_step, 0);

    for _ in 1..INITIAL_DRIVING_STEPS {
        assert_eq!(session.advance_tutorial().to, TutorialPhase::InitialDriving);
    }
    assert_eq!(session.advance_tutorial().to, TutorialPhase::Countdown);
    assert_eq!(session.advance_tutorial().to, TutorialPhase::Interrupt);
    assert_eq!(session.advance_tutorial().to, TutorialPhase::Normal);
    for _ in 0..5 {
        assert_eq!(session.advance_tutorial().to, TutorialPhase::Normal);
    }
    assert!(!session.is_in_tutorial());
}

#[test]
fn countdown_entry_is_visible_to_callers() {
    let mut session = Session::default();
    session.update(&StatePatch {
        buzz: Some(4.2),
        monthly_listeners: Some(0),
        ..StatePatch::default()
    });
    session.start_tutorial();
    turn_keys(&mut session);

    let mut credited = 0;
    for _ in 0..10 {
        let t = session.advance_tutorial();
        if t.entered(TutorialPhase::Countdown) {
            credited += session.update_listeners_on_countdown();
        }
    }
    assert_eq!(credited, 42);
    assert_eq!(session.monthly_listeners(), 42);
    assert_eq!(session.tutorial_phase(), TutorialPhase::Normal);
}

#[test]
fn listeners_observe_each_phase_once() {
    let mut session = Session::default();
    let seen = Rc::new(RefCell::new(Vec::<TutorialPhase>::new()));
    let sink = Rc::clone(&seen);
    session.subscribe(move |state| {
        let mut seen = sink.borrow_mut();
        if seen.last() != Some(&state.tutorial_phase) {
            seen.push(state.tutorial_phase);
        }
    });

    session.start_tutorial();
    turn_keys(&mut session);
    while session.is_in_tutorial() {
        session.advance_tutorial();
    }

    assert_eq!(seen.borrow().as_slice(), &TutorialPhase::ORDER[1..]);
}
