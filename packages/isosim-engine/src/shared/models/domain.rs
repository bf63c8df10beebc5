//! Isolation domain vocabulary
//!
//! An isolation domain is an abstract serial execution context. Every traced
//! operation executes in exactly one domain. `Unconstrained` stands for the
//! cooperative worker pool; a named domain behaves like a single serial
//! executor. Domains form a flat set with no hierarchy.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Reserved spelling of the unconstrained domain in serialized form.
pub const UNCONSTRAINED_NAME: &str = "unconstrained";

/// An isolation domain.
///
/// Serializes as a plain string so scenario files read naturally
/// (`isolation: main`). The spelling `unconstrained` is reserved and always
/// deserializes to [`IsolationDomain::Unconstrained`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IsolationDomain {
    /// No isolation: operations may run anywhere in the worker pool.
    Unconstrained,
    /// A named serial executor.
    Named(String),
}

impl IsolationDomain {
    /// Build a named domain.
    pub fn named(name: impl Into<String>) -> Self {
        IsolationDomain::Named(name.into())
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, IsolationDomain::Unconstrained)
    }

    /// Whether a callee pinned to this domain keeps running in its caller's
    /// domain. Only the unconstrained domain inherits; a named domain is
    /// always entered explicitly.
    pub fn inherits_caller(&self) -> bool {
        self.is_unconstrained()
    }

    /// Domain name as it appears in traces and scenario files.
    pub fn as_str(&self) -> &str {
        match self {
            IsolationDomain::Unconstrained => UNCONSTRAINED_NAME,
            IsolationDomain::Named(name) => name,
        }
    }
}

impl fmt::Display for IsolationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IsolationDomain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct DomainVisitor;

impl Visitor<'_> for DomainVisitor {
    type Value = IsolationDomain;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an isolation domain name")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if value.eq_ignore_ascii_case(UNCONSTRAINED_NAME) {
            Ok(IsolationDomain::Unconstrained)
        } else {
            Ok(IsolationDomain::Named(value.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for IsolationDomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(DomainVisitor)
    }
}

/// Errors raised when registering domains.
#[derive(Debug, Error)]
pub enum DomainError {
    /// `unconstrained` is implicit and cannot be registered as a named domain.
    #[error("'{0}' is reserved for the unconstrained domain")]
    ReservedName(String),
}

/// The finite set of named domains a declaration model may reference.
///
/// The unconstrained domain is always a member and never stored. Insertion
/// order is preserved so serialized registries stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRegistry {
    names: Vec<String>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named domain. Registering an existing name is a no-op and
    /// returns the same domain.
    pub fn register(&mut self, name: impl Into<String>) -> Result<IsolationDomain, DomainError> {
        let name = name.into();
        if name.eq_ignore_ascii_case(UNCONSTRAINED_NAME) {
            return Err(DomainError::ReservedName(name));
        }
        if !self.names.iter().any(|n| *n == name) {
            self.names.push(name.clone());
        }
        Ok(IsolationDomain::Named(name))
    }

    /// Resolve a spelling to a domain. `unconstrained` always resolves;
    /// anything else must have been registered.
    pub fn resolve(&self, name: &str) -> Option<IsolationDomain> {
        if name.eq_ignore_ascii_case(UNCONSTRAINED_NAME) {
            return Some(IsolationDomain::Unconstrained);
        }
        self.names
            .iter()
            .find(|n| *n == name)
            .map(IsolationDomain::named)
    }

    /// Whether a domain is known to this registry.
    pub fn contains(&self, domain: &IsolationDomain) -> bool {
        match domain {
            IsolationDomain::Unconstrained => true,
            IsolationDomain::Named(name) => self.names.iter().any(|n| n == name),
        }
    }

    /// Registered names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_domain_displays_its_name() {
        assert_eq!(IsolationDomain::named("main").to_string(), "main");
        assert_eq!(IsolationDomain::Unconstrained.to_string(), "unconstrained");
    }

    #[test]
    fn only_unconstrained_inherits_caller() {
        assert!(IsolationDomain::Unconstrained.inherits_caller());
        assert!(!IsolationDomain::named("main").inherits_caller());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&IsolationDomain::named("main")).unwrap();
        assert_eq!(json, "\"main\"");
        let json = serde_json::to_string(&IsolationDomain::Unconstrained).unwrap();
        assert_eq!(json, "\"unconstrained\"");
    }

    #[test]
    fn deserializes_reserved_spelling_case_insensitively() {
        let domain: IsolationDomain = serde_json::from_str("\"Unconstrained\"").unwrap();
        assert_eq!(domain, IsolationDomain::Unconstrained);
        let domain: IsolationDomain = serde_json::from_str("\"main\"").unwrap();
        assert_eq!(domain, IsolationDomain::named("main"));
    }

    #[test]
    fn registry_roundtrips_registered_names() {
        let mut registry = DomainRegistry::new();
        let main = registry.register("main").unwrap();
        assert_eq!(main, IsolationDomain::named("main"));
        assert_eq!(registry.resolve("main"), Some(main.clone()));
        assert!(registry.contains(&main));
        assert_eq!(registry.resolve("background"), None);
        assert!(!registry.contains(&IsolationDomain::named("background")));
    }

    #[test]
    fn registry_always_contains_unconstrained() {
        let registry = DomainRegistry::new();
        assert!(registry.contains(&IsolationDomain::Unconstrained));
        assert_eq!(
            registry.resolve("unconstrained"),
            Some(IsolationDomain::Unconstrained)
        );
    }

    #[test]
    fn registering_reserved_name_fails() {
        let mut registry = DomainRegistry::new();
        let err = registry.register("Unconstrained").unwrap_err();
        assert!(matches!(err, DomainError::ReservedName(_)));
    }

    #[test]
    fn registering_twice_is_idempotent() {
        let mut registry = DomainRegistry::new();
        registry.register("main").unwrap();
        registry.register("main").unwrap();
        assert_eq!(registry.len(), 1);
    }
}
