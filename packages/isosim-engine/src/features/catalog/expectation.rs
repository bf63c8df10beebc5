//! Expected outcomes
//!
//! Each catalog scenario carries its documented outcome so regression runs
//! can diff an actual run against the record. Comparison covers the
//! (operation, domain) pairs in order and, for halting scenarios, the
//! operation the violation names.

use crate::features::simulation::{HaltedRun, Trace};
use crate::shared::models::IsolationDomain;

/// Documented outcome of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The run completes with exactly these (operation, domain) pairs.
    Completes(Vec<(String, IsolationDomain)>),
    /// The run halts at `at` after recording exactly the `after` pairs.
    Halts {
        after: Vec<(String, IsolationDomain)>,
        at: String,
    },
}

impl Expectation {
    /// Diff an actual outcome against this expectation, describing the
    /// first mismatch.
    pub fn verify(&self, outcome: &Result<Trace, HaltedRun>) -> Result<(), String> {
        match (self, outcome) {
            (Expectation::Completes(expected), Ok(trace)) => {
                verify_pairs(expected, &trace.operations())
            }
            (Expectation::Halts { after, at }, Err(halted)) => {
                let pairs: Vec<(&str, &IsolationDomain)> = halted
                    .steps
                    .iter()
                    .map(|s| (s.operation.as_str(), &s.domain))
                    .collect();
                verify_pairs(after, &pairs)?;
                let actual = halted.violation.operation();
                if actual != at {
                    return Err(format!(
                        "expected violation at '{at}', run halted at '{actual}'"
                    ));
                }
                Ok(())
            }
            (Expectation::Completes(_), Err(halted)) => {
                Err(format!("expected a clean run, got: {halted}"))
            }
            (Expectation::Halts { at, .. }, Ok(_)) => {
                Err(format!("expected a halt at '{at}', run completed"))
            }
        }
    }

    pub fn completes(&self) -> bool {
        matches!(self, Expectation::Completes(_))
    }
}

fn verify_pairs(
    expected: &[(String, IsolationDomain)],
    actual: &[(&str, &IsolationDomain)],
) -> Result<(), String> {
    if expected.len() != actual.len() {
        return Err(format!(
            "expected {} operations, got {}",
            expected.len(),
            actual.len()
        ));
    }
    for (i, ((want_op, want_domain), (got_op, got_domain))) in
        expected.iter().zip(actual).enumerate()
    {
        if want_op.as_str() != *got_op || want_domain != *got_domain {
            return Err(format!(
                "step {i}: expected '{want_op}' in '{want_domain}', got '{got_op}' in '{got_domain}'"
            ));
        }
    }
    Ok(())
}
