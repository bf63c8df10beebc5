//! Declaration records and the finished model
//!
//! A `Model` is the immutable declaration graph a simulation runs over:
//! types, protocols, concrete functions, stored properties and conformance
//! edges, each optionally pinned to an isolation domain. Instances are
//! produced by `ModelBuilder` (or deserialized and re-validated) and never
//! mutated during a run.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::features::declaration_model::error::{ModelError, Result};
use crate::shared::models::{DomainRegistry, IsolationDomain};

use super::handles::{FunctionId, PropertyId, ProtocolId, TypeId};
use super::ops::{Dispatch, Op};

/// A type declaration, possibly embedded in another type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Own annotation; the default for members, but it never crosses an
    /// embedding boundary in either direction.
    pub isolation: Option<IsolationDomain>,
    /// Present exactly when this type is embedded in another.
    pub parent: Option<TypeId>,
    pub functions: Vec<FunctionId>,
    pub properties: Vec<PropertyId>,
    pub nested: Vec<TypeId>,
}

impl TypeDecl {
    pub fn is_embedded(&self) -> bool {
        self.parent.is_some()
    }
}

/// A function signature required by a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub is_async: bool,
}

/// A protocol declaration: a name, an optional annotation and a set of
/// required signatures. Requirements carry no bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDecl {
    pub name: String,
    pub isolation: Option<IsolationDomain>,
    pub requirements: Vec<Requirement>,
}

impl ProtocolDecl {
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }
}

/// A concrete function declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub owner: TypeId,
    pub isolation: Option<IsolationDomain>,
    pub is_async: bool,
    pub body: Vec<Op>,
}

/// A stored property with an optional synchronous on-change observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProperty {
    pub name: String,
    pub owner: TypeId,
    pub isolation: Option<IsolationDomain>,
    /// Fired after every assignment, in the domain the assignment ran in.
    pub on_change: Option<FunctionId>,
}

/// Where a conformance is declared relative to its witnesses.
///
/// Recorded for fidelity to real declaration layouts. The location is inert:
/// it never changes how a domain is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConformanceLocation {
    /// On the type declaration itself.
    #[default]
    Inline,
    /// On an extension that also holds the witness functions.
    SameExtension,
    /// Split from the extension holding the witness functions.
    SeparateExtension,
}

/// A conformance edge: `ty` satisfies `protocol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conformance {
    pub ty: TypeId,
    pub protocol: ProtocolId,
    pub location: ConformanceLocation,
}

/// The immutable declaration graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub(crate) domains: DomainRegistry,
    pub(crate) types: Vec<TypeDecl>,
    pub(crate) protocols: Vec<ProtocolDecl>,
    pub(crate) functions: Vec<FunctionDecl>,
    pub(crate) properties: Vec<StoredProperty>,
    pub(crate) conformances: Vec<Conformance>,
}

impl Model {
    pub fn domains(&self) -> &DomainRegistry {
        &self.domains
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    pub fn protocols(&self) -> &[ProtocolDecl] {
        &self.protocols
    }

    pub fn functions(&self) -> &[FunctionDecl] {
        &self.functions
    }

    pub fn properties(&self) -> &[StoredProperty] {
        &self.properties
    }

    pub fn conformances(&self) -> &[Conformance] {
        &self.conformances
    }

    pub fn type_decl(&self, id: TypeId) -> Option<&TypeDecl> {
        self.types.get(id.index())
    }

    pub fn protocol(&self, id: ProtocolId) -> Option<&ProtocolDecl> {
        self.protocols.get(id.index())
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionDecl> {
        self.functions.get(id.index())
    }

    pub fn property(&self, id: PropertyId) -> Option<&StoredProperty> {
        self.properties.get(id.index())
    }

    /// Look up a top-level or embedded type by name. Names are unique across
    /// the whole model, so a linear scan is enough.
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.name == name)
            .map(TypeId::new)
    }

    pub fn find_protocol(&self, name: &str) -> Option<ProtocolId> {
        self.protocols
            .iter()
            .position(|p| p.name == name)
            .map(ProtocolId::new)
    }

    /// The conformance edge between a type and a protocol, if declared.
    pub fn conformance_between(&self, ty: TypeId, protocol: ProtocolId) -> Option<&Conformance> {
        self.conformances
            .iter()
            .find(|c| c.ty == ty && c.protocol == protocol)
    }

    /// The concrete function on `ty` that witnesses the named requirement of
    /// `protocol`: same name, same asyncness.
    pub fn witness(&self, ty: TypeId, protocol: ProtocolId, requirement: &str) -> Option<FunctionId> {
        let req = self.protocol(protocol)?.requirement(requirement)?;
        let decl = self.type_decl(ty)?;
        decl.functions.iter().copied().find(|f| {
            self.function(*f)
                .map_or(false, |func| func.name == req.name && func.is_async == req.is_async)
        })
    }

    /// Validate a free-standing op sequence (an entry script) against this
    /// model: every handle must exist and every protocol dispatch must be
    /// backed by a conformance.
    pub fn check_ops(&self, ops: &[Op], referrer: &str) -> Result<()> {
        self.check_op_handles(ops, referrer)?;
        for op in ops {
            self.check_dispatch(op, referrer)?;
        }
        Ok(())
    }

    pub(crate) fn check_op_handles(&self, ops: &[Op], referrer: &str) -> Result<()> {
        for op in ops {
            match op {
                Op::Call(call) => {
                    if self.function(call.target).is_none() {
                        return Err(unknown(call.target.to_string(), referrer));
                    }
                    if let Dispatch::Protocol(protocol) = call.dispatch {
                        if self.protocol(protocol).is_none() {
                            return Err(unknown(protocol.to_string(), referrer));
                        }
                    }
                }
                Op::Mutate(m) => {
                    if self.property(m.property).is_none() {
                        return Err(unknown(m.property.to_string(), referrer));
                    }
                }
            }
        }
        Ok(())
    }

    /// A protocol-dispatched call is only legal when the target is the
    /// witness of one of the protocol's requirements on its own type.
    fn check_dispatch(&self, op: &Op, referrer: &str) -> Result<()> {
        let Op::Call(call) = op else { return Ok(()) };
        let Dispatch::Protocol(protocol) = call.dispatch else {
            return Ok(());
        };
        // Handles were range-checked before dispatch checks run.
        let func = &self.functions[call.target.index()];
        let proto = &self.protocols[protocol.index()];
        if self.conformance_between(func.owner, protocol).is_none() {
            return Err(unknown(
                format!(
                    "conformance of '{}' to '{}'",
                    self.types[func.owner.index()].name, proto.name
                ),
                referrer,
            ));
        }
        if self.witness(func.owner, protocol, &func.name) != Some(call.target) {
            return Err(unknown(
                format!("requirement '{}' on protocol '{}'", func.name, proto.name),
                referrer,
            ));
        }
        Ok(())
    }

    /// Whole-graph validation. `ModelBuilder::finish` runs this before
    /// handing out a model; deserialized models must pass it too before use.
    pub fn validate(&self) -> Result<()> {
        self.check_structure()?;
        self.check_annotations()?;
        self.check_conformances()?;
        for func in &self.functions {
            let referrer = format!("function '{}'", func.name);
            self.check_op_handles(&func.body, &referrer)?;
        }
        for func in &self.functions {
            let referrer = format!("function '{}'", func.name);
            for op in &func.body {
                self.check_dispatch(op, &referrer)?;
            }
        }
        self.check_acyclic()?;
        Ok(())
    }

    fn check_structure(&self) -> Result<()> {
        for decl in &self.types {
            let referrer = format!("type '{}'", decl.name);
            if let Some(parent) = decl.parent {
                if self.type_decl(parent).is_none() {
                    return Err(unknown(parent.to_string(), &referrer));
                }
            }
            for f in &decl.functions {
                if self.function(*f).is_none() {
                    return Err(unknown(f.to_string(), &referrer));
                }
            }
            for p in &decl.properties {
                if self.property(*p).is_none() {
                    return Err(unknown(p.to_string(), &referrer));
                }
            }
            for n in &decl.nested {
                if self.type_decl(*n).is_none() {
                    return Err(unknown(n.to_string(), &referrer));
                }
            }
        }
        for func in &self.functions {
            if self.type_decl(func.owner).is_none() {
                return Err(unknown(
                    func.owner.to_string(),
                    &format!("function '{}'", func.name),
                ));
            }
        }
        for prop in &self.properties {
            let referrer = format!("property '{}'", prop.name);
            if self.type_decl(prop.owner).is_none() {
                return Err(unknown(prop.owner.to_string(), &referrer));
            }
            if let Some(observer) = prop.on_change {
                match self.function(observer) {
                    None => return Err(unknown(observer.to_string(), &referrer)),
                    Some(func) if func.is_async => {
                        return Err(ModelError::AsyncObserver {
                            property: prop.name.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn check_annotations(&self) -> Result<()> {
        let all = self
            .types
            .iter()
            .map(|t| &t.isolation)
            .chain(self.protocols.iter().map(|p| &p.isolation))
            .chain(self.functions.iter().map(|f| &f.isolation))
            .chain(self.properties.iter().map(|p| &p.isolation));
        for isolation in all.flatten() {
            if !self.domains.contains(isolation) {
                return Err(ModelError::UnknownDomain {
                    name: isolation.as_str().to_string(),
                    registered: self.domains.names().map(str::to_string).collect(),
                });
            }
        }
        Ok(())
    }

    fn check_conformances(&self) -> Result<()> {
        for (i, conf) in self.conformances.iter().enumerate() {
            let referrer = "conformance declaration";
            let Some(decl) = self.type_decl(conf.ty) else {
                return Err(unknown(conf.ty.to_string(), referrer));
            };
            let Some(proto) = self.protocol(conf.protocol) else {
                return Err(unknown(conf.protocol.to_string(), referrer));
            };
            if self.conformances[..i]
                .iter()
                .any(|c| c.ty == conf.ty && c.protocol == conf.protocol)
            {
                return Err(ModelError::DuplicateDeclaration {
                    what: format!("conformance to '{}'", proto.name),
                    owner: decl.name.clone(),
                });
            }
            for req in &proto.requirements {
                if self.witness(conf.ty, conf.protocol, &req.name).is_none() {
                    return Err(ModelError::MissingWitness {
                        ty: decl.name.clone(),
                        protocol: proto.name.clone(),
                        requirement: req.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Traces must terminate, so the call graph (calls plus observer edges)
    /// has to be acyclic.
    fn check_acyclic(&self) -> Result<()> {
        let mut graph: DiGraph<FunctionId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.functions.len())
            .map(|i| graph.add_node(FunctionId::new(i)))
            .collect();
        for (i, func) in self.functions.iter().enumerate() {
            for op in &func.body {
                match op {
                    Op::Call(call) => {
                        graph.add_edge(nodes[i], nodes[call.target.index()], ());
                    }
                    Op::Mutate(m) => {
                        if let Some(observer) = self.properties[m.property.index()].on_change {
                            graph.add_edge(nodes[i], nodes[observer.index()], ());
                        }
                    }
                }
            }
        }
        for scc in tarjan_scc(&graph) {
            let recursive = scc.len() > 1 || graph.find_edge(scc[0], scc[0]).is_some();
            if recursive {
                let function = self.functions[graph[scc[0]].index()].name.clone();
                return Err(ModelError::RecursiveDeclaration { function });
            }
        }
        Ok(())
    }
}

fn unknown(what: String, referrer: &str) -> ModelError {
    ModelError::UnknownDeclaration {
        what,
        referrer: referrer.to_string(),
    }
}
