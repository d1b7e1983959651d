use tourbus_game::{EventKind, EventPlan, PlannedEvent, RegionGraph, RegionId, Session, sequence_count};

#[test]
fn change_region_from_initial_state() {
    let mut session = Session::default();
    session.increment_shows_in_current_region();
    session.change_region("south");
    assert_eq!(session.shows_in_current_region(), 0);
    assert_eq!(
        session.sequences_for_current_region(),
        sequence_count("south", 1)
    );
    assert!(!session.should_choose_next_region());
}

#[test]
fn next_region_prompt_after_every_stop() {
    let mut session = Session::default();
    session.change_region("south");
    let stops = session.sequences_for_current_region();
    for _ in 0..stops {
        assert!(!session.should_choose_next_region());
        session.increment_shows_in_current_region();
    }
    assert!(session.should_choose_next_region());
    assert!(session.is_final_sequence_for_region());
}

#[test]
fn walk_the_graph_with_exit_plans() {
    let graph = RegionGraph::default_graph();
    let mut session = Session::default();
    let route = ["south", "west", "mountain", "midwest", "northeast", "midwest"];

    for next in route {
        let next = RegionId::from(next);
        assert!(
            graph.can_travel(session.current_region(), &next),
            "{} does not border {next}",
            session.current_region()
        );
        let stops = session.change_region(next.clone());
        let mut plan = EventPlan::with_exits(stops);
        plan.plan(PlannedEvent::new("story-arrival", EventKind::Story, 5.0));

        let mut progress = 0.0;
        while progress <= 100.0 {
            for event in plan.fire_due(progress) {
                if event.kind == EventKind::Exit {
                    session.increment_shows_in_current_region();
                }
            }
            progress += 2.5;
        }
        assert!(session.should_choose_next_region(), "stuck in {next}");
        assert_eq!(plan.pending().count(), 0);
    }

    let midwest = RegionId::from("midwest");
    assert_eq!(session.visit_count(&midwest), 3);
    assert_eq!(
        session.sequences_for_current_region(),
        sequence_count("midwest", 3)
    );
    assert_eq!(session.state().region_history.len(), route.len() + 1);
}
