//! Scenario definition
//!
//! A scenario pairs an immutable declaration model with the fixed op
//! sequence a run replays, plus the caller domain the entry script starts
//! from (the worker pool unless overridden).

use serde::{Deserialize, Serialize};

use crate::features::declaration_model::{Model, ModelError, Op};
use crate::shared::models::IsolationDomain;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier used for lookups and trace records.
    pub name: String,
    /// Human-readable description of the configuration.
    pub title: String,
    pub model: Model,
    /// The fixed entry script.
    pub script: Vec<Op>,
    /// Caller domain a plain run starts from.
    pub entry_domain: IsolationDomain,
}

impl Scenario {
    /// Build a scenario over a finished model. The script is validated the
    /// same way function bodies are.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        model: Model,
        script: Vec<Op>,
    ) -> Result<Self, ModelError> {
        model.check_ops(&script, "entry script")?;
        Ok(Self {
            name: name.into(),
            title: title.into(),
            model,
            script,
            entry_domain: IsolationDomain::Unconstrained,
        })
    }

    /// Override the domain the entry script starts from. The domain must be
    /// known to the model's registry.
    pub fn with_entry_domain(mut self, domain: IsolationDomain) -> Result<Self, ModelError> {
        if !self.model.domains().contains(&domain) {
            return Err(ModelError::UnknownDomain {
                name: domain.as_str().to_string(),
                registered: self.model.domains().names().map(str::to_string).collect(),
            });
        }
        self.entry_domain = domain;
        Ok(self)
    }

    /// Re-run full validation: the model plus the entry script. Required
    /// after deserializing a scenario from untrusted input, since handles in
    /// serialized form are plain indices.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.model.validate()?;
        self.model.check_ops(&self.script, "entry script")?;
        if !self.model.domains().contains(&self.entry_domain) {
            return Err(ModelError::UnknownDomain {
                name: self.entry_domain.as_str().to_string(),
                registered: self.model.domains().names().map(str::to_string).collect(),
            });
        }
        Ok(())
    }
}
