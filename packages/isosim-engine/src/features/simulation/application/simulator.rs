/*
 * Trace Simulator
 *
 * Replays a scenario's entry script through the propagation engine and
 * packages the result: a `Trace` for a clean run, a `HaltedRun` when an
 * isolation violation stops the walk. A fresh engine is built per run, so
 * repeated runs of the same scenario are fully independent and produce
 * identical traces.
 */

use std::time::Instant;

use tracing::{info, warn};

use crate::features::propagation::PropagationEngine;
use crate::features::simulation::domain::{HaltedRun, RunStats, Scenario, Trace};
use crate::shared::models::IsolationDomain;

#[derive(Debug, Default)]
pub struct TraceSimulator;

impl TraceSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Run a scenario from its declared entry domain.
    pub fn run(&self, scenario: &Scenario) -> Result<Trace, HaltedRun> {
        self.run_from(scenario, &scenario.entry_domain)
    }

    /// Run a scenario with the entry script starting in `entry` instead of
    /// the scenario's declared entry domain.
    pub fn run_from(
        &self,
        scenario: &Scenario,
        entry: &IsolationDomain,
    ) -> Result<Trace, HaltedRun> {
        let started = Instant::now();
        info!("running scenario '{}' from '{}'", scenario.name, entry);
        let mut engine = PropagationEngine::new(&scenario.model);
        let outcome = engine.run_script(&scenario.script, entry);
        let hops = engine.hops();
        let steps = engine.into_steps();
        match outcome {
            Ok(()) => {
                let stats = RunStats {
                    operations: steps.len(),
                    hops,
                    elapsed_micros: started.elapsed().as_micros() as u64,
                };
                info!(
                    "scenario '{}' completed: {} operations, {} hops",
                    scenario.name, stats.operations, stats.hops
                );
                Ok(Trace {
                    scenario: scenario.name.clone(),
                    steps,
                    stats,
                })
            }
            Err(violation) => {
                warn!("scenario '{}' halted: {}", scenario.name, violation);
                Err(HaltedRun {
                    scenario: scenario.name.clone(),
                    steps,
                    violation,
                })
            }
        }
    }
}
