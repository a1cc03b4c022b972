use bdd_mc::checker::{Outcome, Property, Session, Verdict};
use bdd_mc::config::BddConfig;
use bdd_mc::error::{CheckError, EngineError};
use bdd_mc::formula::Formula;
use bdd_mc::trace::Trace;
use bdd_mc::transition::{Domain, TransitionSystem};
use test_log::test;

fn new_system() -> TransitionSystem {
    TransitionSystem::with_config(BddConfig::default().with_storage_bits(16))
}

/// `x` flips every step, starting from 0.
fn toggle() -> TransitionSystem {
    let mut ts = new_system();
    ts.declare_state("x", Domain::Range { lo: 0, hi: 1 }).unwrap();
    let bdd = ts.bdd();
    let trans = bdd.apply_or(
        bdd.apply_and(ts.eq("x", 0).unwrap(), ts.next_eq("x", 1).unwrap()),
        bdd.apply_and(ts.eq("x", 1).unwrap(), ts.next_eq("x", 0).unwrap()),
    );
    let init = ts.eq("x", 0).unwrap();
    ts.set_initial(init);
    ts.set_transition(trans);
    ts
}

/// `x` starts at 0 and is 1 from the second step on.
fn sticky() -> TransitionSystem {
    let mut ts = new_system();
    ts.declare_state("x", Domain::Range { lo: 0, hi: 1 }).unwrap();
    let init = ts.eq("x", 0).unwrap();
    let trans = ts.next_eq("x", 1).unwrap();
    ts.set_initial(init);
    ts.set_transition(trans);
    ts
}

/// `y` oscillates between 0 and 1 while `x` stays 0.
fn oscillator() -> TransitionSystem {
    let mut ts = new_system();
    ts.declare_state("x", Domain::Range { lo: 0, hi: 1 }).unwrap();
    ts.declare_state("y", Domain::Range { lo: 0, hi: 1 }).unwrap();
    let bdd = ts.bdd();
    let flip_y = bdd.apply_or(
        bdd.apply_and(ts.eq("y", 0).unwrap(), ts.next_eq("y", 1).unwrap()),
        bdd.apply_and(ts.eq("y", 1).unwrap(), ts.next_eq("y", 0).unwrap()),
    );
    let trans = bdd.apply_and(ts.unchanged("x").unwrap(), flip_y);
    let init = bdd.apply_and(ts.eq("x", 0).unwrap(), ts.eq("y", 0).unwrap());
    ts.set_initial(init);
    ts.set_transition(trans);
    ts
}

/// `n` counts 0, 1, 2, 3 and then bounces between 2 and 3.
fn bouncer() -> TransitionSystem {
    let mut ts = new_system();
    ts.declare_state("n", Domain::Range { lo: 0, hi: 3 }).unwrap();
    let bdd = ts.bdd();
    let moves = [(0, 1), (1, 2), (2, 3), (3, 2)];
    let trans = bdd.apply_or_many(
        moves
            .iter()
            .map(|&(a, b)| bdd.apply_and(ts.eq("n", a).unwrap(), ts.next_eq("n", b).unwrap())),
    );
    let init = ts.eq("n", 0).unwrap();
    ts.set_initial(init);
    ts.set_transition(trans);
    ts
}

/// Boolean `x` flips exactly when the input `go` is set.
fn driven() -> TransitionSystem {
    let mut ts = new_system();
    ts.declare_state("x", Domain::Boolean).unwrap();
    ts.declare_input("go", Domain::Boolean).unwrap();
    let bdd = ts.bdd();
    let flips = bdd.apply_xor(ts.eq("x", 1).unwrap(), ts.next_eq("x", 1).unwrap());
    let trans = bdd.apply_eq(ts.eq("go", 1).unwrap(), flips);
    let init = ts.eq("x", 0).unwrap();
    ts.set_initial(init);
    ts.set_transition(trans);
    ts
}

fn column(trace: &Trace, name: &str) -> Vec<String> {
    trace.states().iter().map(|s| s[name].clone()).collect()
}

fn violated(verdict: Verdict) -> Trace {
    match verdict {
        Verdict::Violated(trace) => trace,
        other => panic!("expected a violation, got {:?}", other),
    }
}

fn response(f: Formula, g: Formula) -> Formula {
    f.implies(g.eventually()).globally()
}

#[test]
fn scenario_a_toggle_breaks_invariant() {
    let ts = toggle();
    let session = Session::new(&ts);

    let trace = violated(session.check_invariant(&Formula::eq("x", 0)).unwrap());
    assert!(!trace.is_lasso());
    assert_eq!(column(&trace, "x"), ["0", "1"]);
    assert!(trace.inputs().iter().all(|i| i.is_empty()));
}

#[test]
fn scenario_b_toggle_satisfies_response() {
    let ts = toggle();
    let session = Session::new(&ts);

    let verdict = session
        .check_response(&response(Formula::eq("x", 0), Formula::eq("x", 1)))
        .unwrap();
    assert_eq!(verdict, Verdict::Satisfied);
}

#[test]
fn scenario_c_reactivity_with_finite_antecedent() {
    let ts = sticky();
    let session = Session::new(&ts);

    let formula = Formula::gf_implies_gf(Formula::eq("x", 0), Formula::eq("x", 1));
    assert_eq!(session.check_reactivity(&formula).unwrap(), Verdict::Satisfied);
}

#[test]
fn scenario_d_response_lasso_from_initial_state() {
    let ts = oscillator();
    let session = Session::new(&ts);

    let trace = violated(
        session
            .check_response(&response(Formula::eq("x", 0), Formula::eq("x", 1)))
            .unwrap(),
    );
    assert_eq!(trace.loop_back(), Some(0));
    assert!(trace.prefix().is_empty());
    assert_eq!(column(&trace, "x"), ["0", "0", "0"]);
    assert_eq!(column(&trace, "y"), ["0", "1", "0"]);
    assert_eq!(trace.last_state(), &trace.states()[0]);
}

#[test]
fn response_cycle_may_close_after_the_bad_state() {
    let ts = bouncer();
    let session = Session::new(&ts);

    let trace = violated(
        session
            .check_response(&response(Formula::eq("n", 1), Formula::eq("n", 0)))
            .unwrap(),
    );
    assert_eq!(column(&trace, "n"), ["0", "1", "2", "3", "2"]);
    assert_eq!(trace.loop_back(), Some(2));
    // The cycle avoids n = 0.
    assert!(trace.cycle().iter().all(|s| s["n"] != "0"));
}

#[test]
fn response_holds_when_bad_region_is_unreachable() {
    let ts = bouncer();
    let session = Session::new(&ts);

    // n = 0 is always followed by n = 1.
    let verdict = session
        .check_response(&response(Formula::eq("n", 0), Formula::eq("n", 1)))
        .unwrap();
    assert_eq!(verdict, Verdict::Satisfied);
}

#[test]
fn reactivity_violation_on_oscillator() {
    let ts = oscillator();
    let session = Session::new(&ts);

    let formula = Formula::gf_implies_gf(Formula::eq("y", 1), Formula::eq("x", 1));
    let trace = violated(session.check_reactivity(&formula).unwrap());

    assert_eq!(column(&trace, "y"), ["0", "1", "0", "1"]);
    assert_eq!(trace.loop_back(), Some(1));
    let cycle = trace.cycle();
    assert!(cycle.iter().any(|s| s["y"] == "1"));
    assert!(cycle.iter().all(|s| s["x"] == "0"));
}

#[test]
fn reactivity_reports_first_violated_conjunct() {
    let ts = oscillator();
    let session = Session::new(&ts);

    let holds = Formula::gf_implies_gf(Formula::eq("y", 0), Formula::eq("y", 1));
    let fails = Formula::gf_implies_gf(Formula::eq("y", 1), Formula::eq("x", 1));
    let trace = violated(session.check_reactivity(&holds.clone().and(fails.clone())).unwrap());
    let alone = violated(session.check_reactivity(&fails).unwrap());
    assert_eq!(trace, alone);

    assert_eq!(session.check_reactivity(&holds).unwrap(), Verdict::Satisfied);
}

#[test]
fn reactivity_knot_on_bouncing_counter() {
    let ts = bouncer();
    let session = Session::new(&ts);

    let formula = Formula::gf_implies_gf(Formula::eq("n", 3), Formula::eq("n", 0));
    let trace = violated(session.check_reactivity(&formula).unwrap());
    assert_eq!(column(&trace, "n"), ["0", "1", "2", "3", "2", "3"]);
    assert_eq!(trace.loop_back(), Some(3));
}

#[test]
fn invariant_witness_is_a_shortest_path() {
    let mut ts = new_system();
    ts.declare_state("n", Domain::Range { lo: 0, hi: 7 }).unwrap();
    let bdd = ts.bdd();
    let trans = bdd.apply_or_many((0..8).map(|i| {
        bdd.apply_and(ts.eq("n", i).unwrap(), ts.next_eq("n", (i + 1) % 8).unwrap())
    }));
    let init = ts.eq("n", 0).unwrap();
    ts.set_initial(init);
    ts.set_transition(trans);

    let session = Session::new(&ts);
    let trace = violated(session.check_invariant(&Formula::ne("n", 5)).unwrap());
    assert_eq!(column(&trace, "n"), ["0", "1", "2", "3", "4", "5"]);

    // Constants outside the domain select no state.
    assert_eq!(
        session.check_invariant(&Formula::eq("n", 9).not()).unwrap(),
        Verdict::Satisfied
    );
    assert_eq!(
        session.check_invariant(&Formula::eq("m", 0)),
        Err(CheckError::Engine(EngineError::UnknownVariable("m".to_string())))
    );
}

#[test]
fn witnesses_are_deterministic() {
    let formula = Formula::gf_implies_gf(Formula::eq("n", 3), Formula::eq("n", 0));
    let first = violated(Session::new(&bouncer()).check_reactivity(&formula).unwrap());
    let second = violated(Session::new(&bouncer()).check_reactivity(&formula).unwrap());
    assert_eq!(first, second);

    let formula = response(Formula::eq("x", 0), Formula::eq("x", 1));
    let first = violated(Session::new(&oscillator()).check_response(&formula).unwrap());
    let second = violated(Session::new(&oscillator()).check_response(&formula).unwrap());
    assert_eq!(first, second);
}

#[test]
fn inputs_appear_between_states() {
    let ts = driven();
    let session = Session::new(&ts);

    let trace = violated(session.check_invariant(&Formula::atom("x").not()).unwrap());
    assert_eq!(column(&trace, "x"), ["FALSE", "TRUE"]);
    assert_eq!(trace.inputs()[0]["go"], "TRUE");

    let trace = violated(
        session
            .check_response(&response(Formula::atom("x"), Formula::atom("x").not()))
            .unwrap(),
    );
    assert_eq!(column(&trace, "x"), ["FALSE", "TRUE", "TRUE"]);
    assert_eq!(trace.loop_back(), Some(1));
    let go = trace.inputs().iter().map(|i| i["go"].clone()).collect::<Vec<_>>();
    assert_eq!(go, ["TRUE", "FALSE"]);
}

#[test]
fn check_all_reports_every_property() {
    let ts = oscillator();
    let session = Session::new(&ts);

    let properties = [
        Property::invariant("x stays 0", Formula::eq("x", 0)),
        Property::invariant("y stays 0", Formula::eq("y", 0)),
        Property::ltl("y comes back", response(Formula::eq("y", 0), Formula::eq("y", 1))),
        Property::ltl("x responds", response(Formula::eq("x", 0), Formula::eq("x", 1))),
        Property::ltl("fair x", Formula::gf_implies_gf(Formula::eq("y", 1), Formula::eq("x", 1))),
        Property::ltl("next", Formula::eq("x", 0).next()),
    ];
    let reports = session.check_all(&properties).unwrap();
    assert_eq!(reports.len(), properties.len());

    let outcomes = reports.iter().map(|r| &r.outcome).collect::<Vec<_>>();
    assert_eq!(outcomes[0], &Outcome::Satisfied);
    assert!(matches!(outcomes[1], Outcome::Violated(t) if !t.is_lasso()));
    assert_eq!(outcomes[2], &Outcome::Satisfied);
    assert!(matches!(outcomes[3], Outcome::Violated(t) if t.is_lasso()));
    assert!(matches!(outcomes[4], Outcome::Violated(t) if t.is_lasso()));
    assert_eq!(outcomes[5], &Outcome::NotApplicable);

    assert!(reports[3].to_string().starts_with("x responds `G ((x = 0) -> F (x = 1))`: violated"));
}
