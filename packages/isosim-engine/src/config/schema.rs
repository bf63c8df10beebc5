//! Scenario authoring schema (v1)
//!
//! The YAML format scenarios are written in by hand. References are by
//! name: functions and properties as `Type.member`, protocols and domains
//! bare. The loader resolves names in passes (types, functions, properties,
//! bodies, conformances), so declaration order inside the file does not
//! matter.
//!
//! ```yaml
//! version: 1
//! name: pinned_store
//! domains: [main]
//! types:
//!   - name: StatusStore
//!     isolation: main
//!     functions:
//!       - name: refresh
//!         async: true
//! entry:
//!   - call: StatusStore.refresh
//! ```

use serde::{Deserialize, Serialize};

use crate::features::declaration_model::{ConformanceLocation, ModelBuilder, Op, TypeId};
use crate::features::simulation::Scenario;
use crate::shared::models::{IsolationDomain, UNCONSTRAINED_NAME};

use super::error::{Result, ScenarioFileError};

/// Schema versions this loader understands.
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFileV1 {
    /// Mandatory schema version; files without one are rejected.
    pub version: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub protocols: Vec<ProtocolSpec>,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    #[serde(default)]
    pub conformances: Vec<ConformanceSpec>,
    /// The entry script.
    pub entry: Vec<OpSpec>,
    /// Caller domain the entry script starts from; worker pool by default.
    #[serde(default)]
    pub entry_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolSpec {
    pub name: String,
    #[serde(default)]
    pub isolation: Option<String>,
    #[serde(default)]
    pub requirements: Vec<RequirementSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementSpec {
    pub name: String,
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub isolation: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    #[serde(default)]
    pub nested: Vec<TypeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub isolation: Option<String>,
    /// Name of a synchronous function on the same type.
    #[serde(default)]
    pub on_change: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default)]
    pub isolation: Option<String>,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default)]
    pub body: Vec<OpSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConformanceSpec {
    #[serde(rename = "type")]
    pub ty: String,
    pub protocol: String,
    #[serde(default)]
    pub location: ConformanceLocation,
}

/// One op of a body or the entry script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpSpec {
    Call {
        /// `Type.function`
        call: String,
        /// Protocol name for a dispatched call.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        via: Option<String>,
    },
    Mutate {
        /// `Type.property`
        mutate: String,
    },
}

impl ScenarioFileV1 {
    /// Resolve the file into a validated scenario.
    pub fn into_scenario(self) -> Result<Scenario> {
        match self.version {
            None => return Err(ScenarioFileError::MissingVersion),
            Some(v) if !SUPPORTED_VERSIONS.contains(&v) => {
                return Err(ScenarioFileError::UnsupportedVersion {
                    found: v,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }

        let mut builder = ModelBuilder::new();
        for name in &self.domains {
            builder.domain(name)?;
        }
        for proto in &self.protocols {
            let id = builder.declare_protocol(&proto.name, parse_isolation(&proto.isolation))?;
            for req in &proto.requirements {
                builder.declare_requirement(id, &req.name, req.is_async)?;
            }
        }

        let mut declared: Vec<(TypeId, &TypeSpec)> = Vec::new();
        for spec in &self.types {
            declare_types(&mut builder, spec, None, &mut declared)?;
        }
        for (tid, spec) in &declared {
            for func in &spec.functions {
                builder.declare_function(
                    *tid,
                    &func.name,
                    parse_isolation(&func.isolation),
                    func.is_async,
                    vec![],
                )?;
            }
        }
        for (tid, spec) in &declared {
            for prop in &spec.properties {
                let observer = prop
                    .on_change
                    .as_ref()
                    .map(|name| {
                        builder.lookup_function(*tid, name).ok_or_else(|| {
                            unknown_name(name, &format!("observer of '{}.{}'", spec.name, prop.name))
                        })
                    })
                    .transpose()?;
                builder.declare_property(
                    *tid,
                    &prop.name,
                    parse_isolation(&prop.isolation),
                    observer,
                )?;
            }
        }
        for (tid, spec) in &declared {
            for func in &spec.functions {
                if func.body.is_empty() {
                    continue;
                }
                let body = func
                    .body
                    .iter()
                    .map(|op| resolve_op(&builder, op))
                    .collect::<Result<Vec<_>>>()?;
                let fid = builder
                    .lookup_function(*tid, &func.name)
                    .ok_or_else(|| unknown_name(&func.name, "function body"))?;
                builder.set_body(fid, body)?;
            }
        }
        for conf in &self.conformances {
            let tid = builder
                .lookup_type(&conf.ty)
                .ok_or_else(|| unknown_name(&conf.ty, "conformance declaration"))?;
            let pid = builder
                .lookup_protocol(&conf.protocol)
                .ok_or_else(|| unknown_name(&conf.protocol, "conformance declaration"))?;
            builder.declare_conformance(tid, pid, conf.location)?;
        }

        let script = self
            .entry
            .iter()
            .map(|op| resolve_op(&builder, op))
            .collect::<Result<Vec<_>>>()?;
        let model = builder.finish()?;
        let mut scenario = Scenario::new(self.name, self.title, model, script)?;
        if let Some(domain) = &self.entry_domain {
            scenario = scenario.with_entry_domain(parse_domain(domain))?;
        }
        Ok(scenario)
    }
}

fn declare_types<'a>(
    builder: &mut ModelBuilder,
    spec: &'a TypeSpec,
    parent: Option<TypeId>,
    declared: &mut Vec<(TypeId, &'a TypeSpec)>,
) -> Result<()> {
    let isolation = parse_isolation(&spec.isolation);
    let id = match parent {
        None => builder.declare_type(&spec.name, isolation)?,
        Some(p) => builder.declare_nested_type(p, &spec.name, isolation)?,
    };
    declared.push((id, spec));
    for nested in &spec.nested {
        declare_types(builder, nested, Some(id), declared)?;
    }
    Ok(())
}

fn resolve_op(builder: &ModelBuilder, spec: &OpSpec) -> Result<Op> {
    match spec {
        OpSpec::Call { call, via } => {
            let (ty, name) = split_member(call)?;
            let tid = builder
                .lookup_type(ty)
                .ok_or_else(|| unknown_name(ty, call))?;
            let fid = builder
                .lookup_function(tid, name)
                .ok_or_else(|| unknown_name(name, call))?;
            match via {
                None => Ok(Op::call(fid)),
                Some(protocol) => {
                    let pid = builder
                        .lookup_protocol(protocol)
                        .ok_or_else(|| unknown_name(protocol, call))?;
                    Ok(Op::call_through(fid, pid))
                }
            }
        }
        OpSpec::Mutate { mutate } => {
            let (ty, name) = split_member(mutate)?;
            let tid = builder
                .lookup_type(ty)
                .ok_or_else(|| unknown_name(ty, mutate))?;
            let pid = builder
                .lookup_property(tid, name)
                .ok_or_else(|| unknown_name(name, mutate))?;
            Ok(Op::mutate(pid))
        }
    }
}

fn split_member(path: &str) -> Result<(&str, &str)> {
    path.split_once('.').ok_or_else(|| ScenarioFileError::UnknownName {
        name: path.to_string(),
        context: "member reference (expected 'Type.member')".to_string(),
    })
}

fn unknown_name(name: &str, context: &str) -> ScenarioFileError {
    ScenarioFileError::UnknownName {
        name: name.to_string(),
        context: context.to_string(),
    }
}

fn parse_isolation(spec: &Option<String>) -> Option<IsolationDomain> {
    spec.as_deref().map(parse_domain)
}

fn parse_domain(name: &str) -> IsolationDomain {
    if name.eq_ignore_ascii_case(UNCONSTRAINED_NAME) {
        IsolationDomain::Unconstrained
    } else {
        IsolationDomain::named(name)
    }
}
