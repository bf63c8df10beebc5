/*
 * Scenario Files
 *
 * Versioned authoring schema (YAML, name references, schema v1) plus
 * machine-format import/export of whole scenarios. Authoring files are
 * resolved through `ModelBuilder` in passes, so in-file declaration order
 * never matters; machine-format imports re-run whole-graph validation.
 */

pub mod error;
mod io;
mod schema;

pub use error::ScenarioFileError;
pub use io::{
    load_scenario, load_scenario_str, scenario_from_json, scenario_from_yaml, scenario_to_json,
    scenario_to_yaml,
};
pub use schema::{
    ConformanceSpec, FunctionSpec, OpSpec, PropertySpec, ProtocolSpec, RequirementSpec,
    ScenarioFileV1, TypeSpec, SUPPORTED_VERSIONS,
};
