//! Canonical scenario catalog
//!
//! Eight configurations of one shared declaration graph, each paired with
//! its documented trace. The graph models a status store: an async
//! `refresh` entry point (required by the `Refreshable` protocol and always
//! invoked through it) calls an async `apply` that writes an observed
//! `timestamp` property; the observer `timestamp_changed` runs inline with
//! the write. Variants move a single `main` annotation between the type,
//! the entry function, the property and the protocol, vary where the
//! conformance is declared, and optionally embed a `Formatter` type.
//!
//! Every entry script starts in the worker pool, mirroring a detached entry
//! task.

use once_cell::sync::Lazy;

use crate::features::declaration_model::{ConformanceLocation, ModelBuilder, ModelError, Op};
use crate::features::simulation::Scenario;
use crate::shared::models::IsolationDomain;

use super::expectation::Expectation;

/// The single named domain the canonical scenarios use.
pub const CANONICAL_DOMAIN: &str = "main";

/// Which declaration carries the `main` annotation in a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationSite {
    None,
    TypeDeclaration,
    EntryFunction,
    ObservedProperty,
    Protocol,
}

/// A canonical scenario plus its documented outcome.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub scenario: Scenario,
    pub expected: Expectation,
}

/// Build the shared graph with one annotation placement. Public so tests
/// can sweep combinations beyond the catalog's eight.
pub fn build_scenario(
    name: &str,
    title: &str,
    site: AnnotationSite,
    location: ConformanceLocation,
    embedded: bool,
) -> Result<Scenario, ModelError> {
    let mut builder = ModelBuilder::new();
    let main = builder.domain(CANONICAL_DOMAIN)?;
    let annotate = |s: AnnotationSite| (site == s).then(|| main.clone());

    let protocol = builder.declare_protocol("Refreshable", annotate(AnnotationSite::Protocol))?;
    builder.declare_requirement(protocol, "refresh", true)?;

    let store = builder.declare_type("StatusStore", annotate(AnnotationSite::TypeDeclaration))?;
    builder.declare_property(store, "headline", None, None)?;
    let observer = builder.declare_function(store, "timestamp_changed", None, false, vec![])?;
    let timestamp = builder.declare_property(
        store,
        "timestamp",
        annotate(AnnotationSite::ObservedProperty),
        Some(observer),
    )?;
    let apply = builder.declare_function(store, "apply", None, true, vec![Op::mutate(timestamp)])?;

    let mut body = vec![Op::call(apply)];
    if embedded {
        let formatter = builder.declare_nested_type(store, "Formatter", None)?;
        let format = builder.declare_function(formatter, "format", None, false, vec![])?;
        let format_async =
            builder.declare_function(formatter, "format_async", None, true, vec![])?;
        body.push(Op::call(format));
        body.push(Op::call(format_async));
    }
    let refresh = builder.declare_function(
        store,
        "refresh",
        annotate(AnnotationSite::EntryFunction),
        true,
        body,
    )?;
    builder.declare_conformance(store, protocol, location)?;
    let model = builder.finish()?;
    Scenario::new(name, title, model, vec![Op::call_through(refresh, protocol)])
}

/// All canonical scenarios with their documented outcomes.
pub fn catalog() -> &'static [CatalogEntry] {
    &CATALOG
}

/// Look up a canonical scenario by name.
pub fn find_scenario(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.scenario.name == name)
}

static CATALOG: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    build_catalog().expect("canonical scenario graphs are well-formed")
});

fn build_catalog() -> Result<Vec<CatalogEntry>, ModelError> {
    Ok(vec![
        no_isolation()?,
        type_isolated()?,
        function_isolated()?,
        property_isolated()?,
        protocol_inline()?,
        protocol_same_extension()?,
        split_conformance()?,
        embedded_types()?,
    ])
}

#[derive(Clone, Copy)]
enum D {
    Main,
    Pool,
}

fn pairs(rows: &[(&str, D)]) -> Vec<(String, IsolationDomain)> {
    rows.iter()
        .map(|(op, d)| {
            let domain = match d {
                D::Main => IsolationDomain::named(CANONICAL_DOMAIN),
                D::Pool => IsolationDomain::Unconstrained,
            };
            (op.to_string(), domain)
        })
        .collect()
}

fn no_isolation() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "no_isolation",
        "no annotations; every operation stays in the worker pool",
        AnnotationSite::None,
        ConformanceLocation::Inline,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Completes(pairs(&[
            ("refresh", D::Pool),
            ("apply", D::Pool),
            ("timestamp", D::Pool),
            ("timestamp_changed", D::Pool),
        ])),
    })
}

fn type_isolated() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "type_isolated",
        "type pinned to main; members follow and the entry call hops in",
        AnnotationSite::TypeDeclaration,
        ConformanceLocation::Inline,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Completes(pairs(&[
            ("refresh", D::Main),
            ("apply", D::Main),
            ("timestamp", D::Main),
            ("timestamp_changed", D::Main),
        ])),
    })
}

fn function_isolated() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "function_isolated",
        "entry function pinned to main; its async callee detaches back to the pool",
        AnnotationSite::EntryFunction,
        ConformanceLocation::Inline,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Completes(pairs(&[
            ("refresh", D::Main),
            ("apply", D::Pool),
            ("timestamp", D::Pool),
            ("timestamp_changed", D::Pool),
        ])),
    })
}

fn property_isolated() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "property_isolated",
        "observed property pinned to main; the pool-side write halts the run",
        AnnotationSite::ObservedProperty,
        ConformanceLocation::Inline,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Halts {
            after: pairs(&[("refresh", D::Pool), ("apply", D::Pool)]),
            at: "timestamp".to_string(),
        },
    })
}

fn protocol_inline() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "protocol_inline",
        "protocol pinned to main; only the dispatched entry call is isolated",
        AnnotationSite::Protocol,
        ConformanceLocation::Inline,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Completes(protocol_pinned_pairs()),
    })
}

fn protocol_same_extension() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "protocol_same_extension",
        "protocol pinned to main, conformance declared on the witness extension",
        AnnotationSite::Protocol,
        ConformanceLocation::SameExtension,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        // The conformance location is inert: identical to protocol_inline.
        expected: Expectation::Completes(protocol_pinned_pairs()),
    })
}

fn protocol_pinned_pairs() -> Vec<(String, IsolationDomain)> {
    pairs(&[
        ("refresh", D::Main),
        ("apply", D::Pool),
        ("timestamp", D::Pool),
        ("timestamp_changed", D::Pool),
    ])
}

fn split_conformance() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "split_conformance",
        "conformance split from its witnesses, no annotations anywhere",
        AnnotationSite::None,
        ConformanceLocation::SeparateExtension,
        false,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Completes(pairs(&[
            ("refresh", D::Pool),
            ("apply", D::Pool),
            ("timestamp", D::Pool),
            ("timestamp_changed", D::Pool),
        ])),
    })
}

fn embedded_types() -> Result<CatalogEntry, ModelError> {
    let scenario = build_scenario(
        "embedded_types",
        "type pinned to main with an embedded formatter that stays independent",
        AnnotationSite::TypeDeclaration,
        ConformanceLocation::SameExtension,
        true,
    )?;
    Ok(CatalogEntry {
        scenario,
        expected: Expectation::Completes(pairs(&[
            ("refresh", D::Main),
            ("apply", D::Main),
            ("timestamp", D::Main),
            ("timestamp_changed", D::Main),
            // Sync member of the embedded type runs at the call site.
            ("format", D::Main),
            // Async member of the embedded type detaches to the pool.
            ("format_async", D::Pool),
        ])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_holds_eight_entries_with_unique_names() {
        let entries = catalog();
        assert_eq!(entries.len(), 8);
        for (i, entry) in entries.iter().enumerate() {
            assert!(
                entries[..i]
                    .iter()
                    .all(|e| e.scenario.name != entry.scenario.name),
                "duplicate scenario name '{}'",
                entry.scenario.name
            );
        }
    }

    #[test]
    fn lookup_by_name_works() {
        assert!(find_scenario("type_isolated").is_some());
        assert!(find_scenario("missing").is_none());
    }

    #[test]
    fn exactly_one_scenario_halts() {
        let halting: Vec<&str> = catalog()
            .iter()
            .filter(|e| !e.expected.completes())
            .map(|e| e.scenario.name.as_str())
            .collect();
        assert_eq!(halting, vec!["property_isolated"]);
    }

    #[test]
    fn template_accepts_arbitrary_combinations() {
        for site in [
            AnnotationSite::None,
            AnnotationSite::TypeDeclaration,
            AnnotationSite::EntryFunction,
            AnnotationSite::ObservedProperty,
            AnnotationSite::Protocol,
        ] {
            for location in [
                ConformanceLocation::Inline,
                ConformanceLocation::SameExtension,
                ConformanceLocation::SeparateExtension,
            ] {
                for embedded in [false, true] {
                    build_scenario("sweep", "", site, location, embedded).unwrap();
                }
            }
        }
    }
}
