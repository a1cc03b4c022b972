//! Two processes competing for a critical section.
//!
//! Each process cycles through idle (0), waiting (1) and critical (2). A
//! waiting process enters when the other one is idle, or when the other one
//! is waiting and `turn` points at it. Leaving the critical section hands the
//! turn over.
//!
//! By default the scheduler alternates between the processes. With
//! `--unfair` it becomes an input and may pick the same process forever,
//! which starves the other one.
//!
//! Run with: `cargo run --example mutex -- --unfair`

use clap::Parser;
use log::info;

use bdd_mc::algebra::SymbolicEngine;
use bdd_mc::checker::{Outcome, Property, Session};
use bdd_mc::config::{BddConfig, CheckerConfig};
use bdd_mc::error::EngineError;
use bdd_mc::formula::Formula;
use bdd_mc::reference::Ref;
use bdd_mc::transition::{Domain, TransitionSystem};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// BDD size (in bits, so the actual size is `2^size` nodes).
    #[clap(long, value_name = "INT", default_value = "16")]
    storage_bits: usize,

    /// Knot search attempts before giving up on a reactivity witness.
    #[clap(long, value_name = "INT", default_value = "100")]
    max_knot_attempts: usize,

    /// Let the scheduler pick any process at every step.
    #[clap(long)]
    unfair: bool,
}

/// `pc{i}` moves one step while the other process stands still.
fn process_step(ts: &TransitionSystem, i: i64) -> Result<Ref, EngineError> {
    let bdd = ts.bdd();
    let me = format!("pc{}", i);
    let other = format!("pc{}", 1 - i);

    let can_enter = bdd.apply_and(
        -ts.eq(&other, 2)?,
        bdd.apply_or(ts.eq("turn", i)?, ts.eq(&other, 0)?),
    );
    let keep_turn = ts.unchanged("turn")?;

    let request = bdd.apply_and_many([ts.eq(&me, 0)?, ts.next_eq(&me, 1)?, keep_turn]);
    let enter = bdd.apply_and_many([ts.eq(&me, 1)?, can_enter, ts.next_eq(&me, 2)?, keep_turn]);
    let wait = bdd.apply_and_many([ts.eq(&me, 1)?, -can_enter, ts.next_eq(&me, 1)?, keep_turn]);
    let leave = bdd.apply_and_many([ts.eq(&me, 2)?, ts.next_eq(&me, 0)?, ts.next_eq("turn", 1 - i)?]);

    Ok(bdd.apply_and_many([
        ts.eq("sched", i)?,
        bdd.apply_or_many([request, enter, wait, leave]),
        ts.unchanged(&other)?,
    ]))
}

fn build_model(args: &Cli) -> Result<TransitionSystem, EngineError> {
    let mut ts = TransitionSystem::with_config(BddConfig::default().with_storage_bits(args.storage_bits));
    ts.declare_state("pc0", Domain::Range { lo: 0, hi: 2 })?;
    ts.declare_state("pc1", Domain::Range { lo: 0, hi: 2 })?;
    ts.declare_state("turn", Domain::Range { lo: 0, hi: 1 })?;
    if args.unfair {
        ts.declare_input("sched", Domain::Range { lo: 0, hi: 1 })?;
    } else {
        ts.declare_state("sched", Domain::Range { lo: 0, hi: 1 })?;
    }

    let bdd = ts.bdd();
    let mut transition = bdd.apply_or(process_step(&ts, 0)?, process_step(&ts, 1)?);
    let mut initial = bdd.apply_and_many([ts.eq("pc0", 0)?, ts.eq("pc1", 0)?, ts.eq("turn", 0)?]);
    if !args.unfair {
        let alternate = bdd.apply_xor(ts.eq("sched", 1)?, ts.next_eq("sched", 1)?);
        transition = bdd.apply_and(transition, alternate);
        initial = bdd.apply_and(initial, ts.eq("sched", 0)?);
    }

    ts.set_initial(initial);
    ts.set_transition(transition);
    Ok(ts)
}

fn properties() -> Vec<Property> {
    let waiting = |i: i64| Formula::eq(format!("pc{}", i), 1);
    let critical = |i: i64| Formula::eq(format!("pc{}", i), 2);
    vec![
        Property::invariant("mutual exclusion", critical(0).and(critical(1)).not()),
        Property::invariant("turn in range", Formula::ne("turn", 2)),
        Property::ltl(
            "process 0 is served",
            waiting(0).implies(critical(0).eventually()).globally(),
        ),
        Property::ltl(
            "process 1 is served",
            waiting(1).implies(critical(1).eventually()).globally(),
        ),
        Property::ltl(
            "no starvation",
            Formula::gf_implies_gf(waiting(0), critical(0)).and(Formula::gf_implies_gf(waiting(1), critical(1))),
        ),
    ]
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let ts = build_model(&args)?;
    println!("ts = {:?}", ts);

    let config = CheckerConfig::default().with_max_knot_attempts(args.max_knot_attempts);
    let session = Session::with_config(&ts, config);

    let reach = session.reachability();
    info!(
        "Reachable states: {:?} in {} layers",
        ts.count_states(reach.reached()),
        reach.layers().len()
    );

    let reports = session.check_all(&properties())?;
    for report in &reports {
        println!("{}", report);
        if let Outcome::Violated(trace) = &report.outcome {
            println!("{}", trace);
        }
    }

    let violated = reports
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Violated(_)))
        .count();
    println!("{} of {} properties violated", violated, reports.len());
    println!("bdd = {:?}", ts.bdd());

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
