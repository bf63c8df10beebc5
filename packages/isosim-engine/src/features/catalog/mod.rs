/*
 * Scenario Catalog
 *
 * The canonical demonstration set: one shared declaration graph in eight
 * configurations, each entry carrying the documented trace (or the halt)
 * the simulator must reproduce. The catalog is the regression baseline for
 * the resolution rules; anything that changes an expected trace here is a
 * semantic change.
 */

mod cases;
mod expectation;

pub use cases::{
    build_scenario, catalog, find_scenario, AnnotationSite, CatalogEntry, CANONICAL_DOMAIN,
};
pub use expectation::Expectation;
