//! Canonical scenario regression suite
//!
//! Replays every catalog entry against its documented outcome, then pins
//! the load-bearing details of individual traces:
//! - hop placement and step kinds for the completing scenarios
//! - the steps recorded before the one documented halt
//! - conformance location being inert for the protocol-pinned pair
//! - repeated runs being byte-identical

use isosim_engine::{
    catalog, find_scenario, HaltedRun, IsolationDomain, StepKind, Trace, TraceSimulator,
};
use pretty_assertions::assert_eq;

fn main_domain() -> IsolationDomain {
    IsolationDomain::named("main")
}

fn pool() -> IsolationDomain {
    IsolationDomain::Unconstrained
}

fn run(name: &str) -> Result<Trace, HaltedRun> {
    let entry = find_scenario(name).unwrap_or_else(|| panic!("no canonical scenario '{name}'"));
    TraceSimulator::new().run(&entry.scenario)
}

#[test]
fn every_entry_matches_its_documented_outcome() {
    let simulator = TraceSimulator::new();
    for entry in catalog() {
        let outcome = simulator.run(&entry.scenario);
        if let Err(mismatch) = entry.expected.verify(&outcome) {
            panic!("{}: {mismatch}", entry.scenario.name);
        }
    }
}

#[test]
fn no_isolation_records_no_hops() {
    let trace = run("no_isolation").unwrap();
    assert_eq!(trace.stats.hops, 0);
    assert!(trace
        .steps
        .iter()
        .all(|s| s.domain == pool() && s.hop.is_none()));
}

#[test]
fn type_isolated_hops_once_at_the_dispatched_entry() {
    let trace = run("type_isolated").unwrap();
    assert_eq!(trace.stats.hops, 1);
    let refresh = &trace.steps[0];
    assert_eq!(refresh.operation, "refresh");
    assert_eq!(refresh.kind, StepKind::Call { is_async: true });
    assert_eq!(refresh.domain, main_domain());
    assert_eq!(refresh.hop, Some(pool()));
    // Everything after the entry is already on main.
    assert!(trace.steps[1..].iter().all(|s| s.hop.is_none()));
    let kinds: Vec<StepKind> = trace.steps.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::Call { is_async: true },
            StepKind::Call { is_async: true },
            StepKind::Mutation,
            StepKind::Observer,
        ]
    );
}

#[test]
fn function_isolated_detaches_back_to_the_pool() {
    let trace = run("function_isolated").unwrap();
    assert_eq!(trace.stats.hops, 2);
    assert_eq!(trace.steps[0].hop, Some(pool()));
    // The unconstrained async callee leaves main again.
    assert_eq!(trace.steps[1].operation, "apply");
    assert_eq!(trace.steps[1].domain, pool());
    assert_eq!(trace.steps[1].hop, Some(main_domain()));
}

#[test]
fn property_isolated_halts_at_the_pool_side_write() {
    let halted = run("property_isolated").unwrap_err();
    assert_eq!(halted.scenario, "property_isolated");
    let names: Vec<&str> = halted.steps.iter().map(|s| s.operation.as_str()).collect();
    assert_eq!(names, vec!["refresh", "apply"]);
    assert_eq!(halted.violation.operation(), "timestamp");
    let text = halted.violation.to_string();
    assert!(text.contains("'main'"), "unexpected message: {text}");
    assert!(
        text.contains("'unconstrained'"),
        "unexpected message: {text}"
    );
}

#[test]
fn conformance_location_is_inert_for_the_protocol_pair() {
    let inline = run("protocol_inline").unwrap();
    let same_ext = run("protocol_same_extension").unwrap();
    assert_eq!(inline.steps, same_ext.steps);
    assert_eq!(
        serde_json::to_string(&inline.steps).unwrap(),
        serde_json::to_string(&same_ext.steps).unwrap()
    );
}

#[test]
fn protocol_annotation_binds_only_the_dispatched_entry() {
    let trace = run("protocol_inline").unwrap();
    assert_eq!(trace.steps[0].domain, main_domain());
    assert!(trace.steps[1..].iter().all(|s| s.domain == pool()));
}

#[test]
fn embedded_member_isolation_follows_its_own_declaration() {
    let trace = run("embedded_types").unwrap();
    let format = trace.steps.iter().find(|s| s.operation == "format").unwrap();
    assert_eq!(format.kind, StepKind::Call { is_async: false });
    assert_eq!(format.domain, main_domain());
    assert!(format.hop.is_none());
    let format_async = trace
        .steps
        .iter()
        .find(|s| s.operation == "format_async")
        .unwrap();
    assert_eq!(format_async.domain, pool());
    assert_eq!(format_async.hop, Some(main_domain()));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let simulator = TraceSimulator::new();
    for entry in catalog() {
        match (simulator.run(&entry.scenario), simulator.run(&entry.scenario)) {
            (Ok(first), Ok(second)) => {
                assert_eq!(first, second);
                assert_eq!(
                    serde_json::to_string(&first).unwrap(),
                    serde_json::to_string(&second).unwrap()
                );
            }
            (Err(first), Err(second)) => {
                assert_eq!(first.steps, second.steps);
                assert_eq!(first.violation.operation(), second.violation.operation());
            }
            (first, second) => panic!(
                "'{}' was not deterministic: ok={} then ok={}",
                entry.scenario.name,
                first.is_ok(),
                second.is_ok()
            ),
        }
    }
}

#[test]
fn starting_on_main_removes_the_entry_hop() {
    let entry = find_scenario("type_isolated").unwrap();
    let trace = TraceSimulator::new()
        .run_from(&entry.scenario, &main_domain())
        .unwrap();
    assert_eq!(trace.stats.hops, 0);
    assert!(trace.steps.iter().all(|s| s.hop.is_none()));
}
