/*
 * Propagation Engine
 *
 * Walks an op sequence over a validated model, resolving the isolation
 * domain of every call, mutation and observer, and recording one trace step
 * per operation. Execution is depth-first: a call's body runs to completion
 * (in the callee's resolved domain) before the next op of the caller.
 *
 * The engine holds per-run state only. A violation stops the walk
 * immediately; steps recorded before the halt remain valid and the
 * offending operation never acquires a domain.
 */

use tracing::{debug, trace};

use crate::features::declaration_model::{CallOp, FunctionId, Model, Op, PropertyId};
use crate::shared::models::IsolationDomain;

use super::super::domain::{resolve_call, resolve_mutation, StepKind, TraceStep};
use super::super::error::Result;

pub struct PropagationEngine<'m> {
    model: &'m Model,
    steps: Vec<TraceStep>,
    hops: usize,
}

impl<'m> PropagationEngine<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            steps: Vec::new(),
            hops: 0,
        }
    }

    /// Execute an op sequence with `caller` as the current domain.
    ///
    /// On error the steps recorded so far stay available through
    /// [`into_steps`](Self::into_steps).
    pub fn run_script(&mut self, ops: &[Op], caller: &IsolationDomain) -> Result<()> {
        for op in ops {
            self.execute_op(op, caller)?;
        }
        Ok(())
    }

    /// Cross-domain hops recorded so far.
    pub fn hops(&self) -> usize {
        self.hops
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<TraceStep> {
        self.steps
    }

    fn execute_op(&mut self, op: &Op, caller: &IsolationDomain) -> Result<()> {
        match op {
            Op::Call(call) => self.execute_call(*call, caller),
            Op::Mutate(m) => self.execute_mutation(m.property, caller),
        }
    }

    fn execute_call(&mut self, call: CallOp, caller: &IsolationDomain) -> Result<()> {
        let model = self.model;
        let resolution = resolve_call(model, call, caller)?;
        let func = &model.functions[call.target.index()];
        trace!(
            "call '{}' from '{}' lands in '{}'",
            func.name,
            caller,
            resolution.domain
        );
        if resolution.hop.is_some() {
            self.hops += 1;
        }
        self.steps.push(TraceStep {
            operation: func.name.clone(),
            kind: StepKind::Call {
                is_async: func.is_async,
            },
            domain: resolution.domain.clone(),
            hop: resolution.hop,
        });
        // The body runs in the callee's domain; the caller resumes in its
        // own domain afterwards, which `caller` still holds.
        for op in &func.body {
            self.execute_op(op, &resolution.domain)?;
        }
        Ok(())
    }

    fn execute_mutation(&mut self, property: PropertyId, site: &IsolationDomain) -> Result<()> {
        let model = self.model;
        let domain = resolve_mutation(model, property, site)?;
        let prop = &model.properties[property.index()];
        self.steps.push(TraceStep {
            operation: prop.name.clone(),
            kind: StepKind::Mutation,
            domain: domain.clone(),
            hop: None,
        });
        if let Some(observer) = prop.on_change {
            debug!("mutation of '{}' fires observer", prop.name);
            self.execute_observer(observer, &domain)?;
        }
        Ok(())
    }

    /// Observers are synchronous by construction and run inline with the
    /// assignment, so they follow the ordinary sync-call rules from the
    /// mutation's domain.
    fn execute_observer(&mut self, observer: FunctionId, site: &IsolationDomain) -> Result<()> {
        let model = self.model;
        let resolution = resolve_call(model, CallOp::direct(observer), site)?;
        let func = &model.functions[observer.index()];
        self.steps.push(TraceStep {
            operation: func.name.clone(),
            kind: StepKind::Observer,
            domain: resolution.domain.clone(),
            hop: None,
        });
        for op in &func.body {
            self.execute_op(op, &resolution.domain)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::declaration_model::ModelBuilder;
    use crate::features::propagation::error::PropagationError;

    // Store pinned to main, refresh async, apply async mutating an observed
    // property. Exercised from the worker pool.
    fn pinned_store() -> (Model, FunctionId) {
        let mut builder = ModelBuilder::new();
        let main = builder.domain("main").unwrap();
        let store = builder.declare_type("Store", Some(main)).unwrap();
        let observer = builder
            .declare_function(store, "timestamp_changed", None, false, vec![])
            .unwrap();
        let prop = builder
            .declare_property(store, "timestamp", None, Some(observer))
            .unwrap();
        let apply = builder
            .declare_function(store, "apply", None, true, vec![Op::mutate(prop)])
            .unwrap();
        let refresh = builder
            .declare_function(store, "refresh", None, true, vec![Op::call(apply)])
            .unwrap();
        let model = builder.finish().unwrap();
        (model, refresh)
    }

    #[test]
    fn executes_bodies_depth_first() {
        let (model, refresh) = pinned_store();
        let mut engine = PropagationEngine::new(&model);
        engine
            .run_script(&[Op::call(refresh)], &IsolationDomain::Unconstrained)
            .unwrap();
        let names: Vec<&str> = engine.steps().iter().map(|s| s.operation.as_str()).collect();
        assert_eq!(
            names,
            vec!["refresh", "apply", "timestamp", "timestamp_changed"]
        );
    }

    #[test]
    fn records_one_hop_for_the_pinned_entry() {
        let (model, refresh) = pinned_store();
        let mut engine = PropagationEngine::new(&model);
        engine
            .run_script(&[Op::call(refresh)], &IsolationDomain::Unconstrained)
            .unwrap();
        assert_eq!(engine.hops(), 1);
        let steps = engine.into_steps();
        assert_eq!(steps[0].hop, Some(IsolationDomain::Unconstrained));
        assert!(steps[1..].iter().all(|s| s.hop.is_none()));
        assert!(steps
            .iter()
            .all(|s| s.domain == IsolationDomain::named("main")));
    }

    #[test]
    fn halting_keeps_prior_steps() {
        let mut builder = ModelBuilder::new();
        let main = builder.domain("main").unwrap();
        let store = builder.declare_type("Store", None).unwrap();
        let prop = builder
            .declare_property(store, "timestamp", Some(main), None)
            .unwrap();
        let apply = builder
            .declare_function(store, "apply", None, true, vec![Op::mutate(prop)])
            .unwrap();
        let refresh = builder
            .declare_function(store, "refresh", None, true, vec![Op::call(apply)])
            .unwrap();
        let model = builder.finish().unwrap();

        let mut engine = PropagationEngine::new(&model);
        let err = engine
            .run_script(&[Op::call(refresh)], &IsolationDomain::Unconstrained)
            .unwrap_err();
        assert!(matches!(err, PropagationError::IsolationViolation { .. }));
        let names: Vec<&str> = engine.steps().iter().map(|s| s.operation.as_str()).collect();
        // The mutation itself never acquires a domain.
        assert_eq!(names, vec!["refresh", "apply"]);
    }

    #[test]
    fn observer_steps_are_tagged() {
        let (model, refresh) = pinned_store();
        let mut engine = PropagationEngine::new(&model);
        engine
            .run_script(&[Op::call(refresh)], &IsolationDomain::Unconstrained)
            .unwrap();
        let steps = engine.into_steps();
        assert_eq!(steps[2].kind, StepKind::Mutation);
        assert_eq!(steps[3].kind, StepKind::Observer);
    }
}
