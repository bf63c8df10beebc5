//! Model construction
//!
//! `ModelBuilder` is the only way to assemble a `Model`. Every declaration
//! is validated as it is added (unknown handles, duplicate names, unknown
//! domains), and `finish` runs whole-graph validation: conformance
//! witnesses, protocol dispatch legality and call-graph acyclicity.
//!
//! Bodies may be supplied up front with `declare_function` or attached later
//! with `set_body`, which lets mutually referencing declaration sets be
//! built in two passes.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::features::declaration_model::domain::{
    Conformance, ConformanceLocation, FunctionDecl, FunctionId, Model, Op, PropertyId,
    ProtocolDecl, ProtocolId, Requirement, StoredProperty, TypeDecl, TypeId,
};
use crate::features::declaration_model::error::{ModelError, Result};
use crate::shared::models::IsolationDomain;

/// Builder for declaration models.
///
/// # Example
///
/// ```ignore
/// let mut builder = ModelBuilder::new();
/// let main = builder.domain("main")?;
/// let store = builder.declare_type("Store", Some(main))?;
/// let apply = builder.declare_function(store, "apply", None, true, vec![])?;
/// builder.declare_property(store, "timestamp", None, None)?;
/// let model = builder.finish()?;
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: Model,
    type_index: FxHashMap<String, TypeId>,
    protocol_index: FxHashMap<String, ProtocolId>,
    function_index: FxHashMap<(TypeId, String), FunctionId>,
    property_index: FxHashMap<(TypeId, String), PropertyId>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named isolation domain for use in annotations.
    pub fn domain(&mut self, name: impl Into<String>) -> Result<IsolationDomain> {
        Ok(self.model.domains.register(name)?)
    }

    /// Declare a top-level type.
    pub fn declare_type(
        &mut self,
        name: impl Into<String>,
        isolation: Option<IsolationDomain>,
    ) -> Result<TypeId> {
        self.insert_type(name.into(), isolation, None)
    }

    /// Declare a type embedded inside `parent`. The embedded type never
    /// inherits the parent's annotation; a fresh resolution applies to its
    /// members.
    pub fn declare_nested_type(
        &mut self,
        parent: TypeId,
        name: impl Into<String>,
        isolation: Option<IsolationDomain>,
    ) -> Result<TypeId> {
        if self.model.type_decl(parent).is_none() {
            return Err(self.unknown(parent.to_string(), "nested type declaration"));
        }
        let id = self.insert_type(name.into(), isolation, Some(parent))?;
        self.model.types[parent.index()].nested.push(id);
        Ok(id)
    }

    /// Declare a protocol. Requirements are added with
    /// [`declare_requirement`](Self::declare_requirement).
    pub fn declare_protocol(
        &mut self,
        name: impl Into<String>,
        isolation: Option<IsolationDomain>,
    ) -> Result<ProtocolId> {
        let name = name.into();
        self.check_isolation(isolation.as_ref())?;
        if self.protocol_index.contains_key(&name) {
            return Err(ModelError::DuplicateDeclaration {
                what: format!("protocol '{name}'"),
                owner: "the model".to_string(),
            });
        }
        let id = ProtocolId::new(self.model.protocols.len());
        self.model.protocols.push(ProtocolDecl {
            name: name.clone(),
            isolation,
            requirements: Vec::new(),
        });
        self.protocol_index.insert(name, id);
        Ok(id)
    }

    /// Add a required signature to a protocol. Requirements carry only a
    /// name and asyncness; a body or an annotation is rejected by
    /// construction since the parameters do not exist.
    pub fn declare_requirement(
        &mut self,
        protocol: ProtocolId,
        name: impl Into<String>,
        is_async: bool,
    ) -> Result<()> {
        let name = name.into();
        let Some(decl) = self.model.protocols.get_mut(protocol.index()) else {
            return Err(self.unknown(protocol.to_string(), "requirement declaration"));
        };
        if decl.requirement(&name).is_some() {
            return Err(ModelError::DuplicateDeclaration {
                what: format!("requirement '{name}'"),
                owner: decl.name.clone(),
            });
        }
        decl.requirements.push(Requirement { name, is_async });
        Ok(())
    }

    /// Declare a concrete function on a type. The body may reference only
    /// declarations that already exist; for forward references declare with
    /// an empty body and attach it later with [`set_body`](Self::set_body).
    pub fn declare_function(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        isolation: Option<IsolationDomain>,
        is_async: bool,
        body: Vec<Op>,
    ) -> Result<FunctionId> {
        let name = name.into();
        self.check_isolation(isolation.as_ref())?;
        let Some(owner_decl) = self.model.type_decl(owner) else {
            return Err(self.unknown(owner.to_string(), &format!("function '{name}'")));
        };
        let owner_name = owner_decl.name.clone();
        let key = (owner, name.clone());
        if self.function_index.contains_key(&key) {
            return Err(ModelError::DuplicateDeclaration {
                what: format!("function '{name}'"),
                owner: owner_name,
            });
        }
        self.model
            .check_op_handles(&body, &format!("function '{name}'"))?;
        let id = FunctionId::new(self.model.functions.len());
        debug!("declared function '{}.{}' as {}", owner_name, name, id);
        self.model.functions.push(FunctionDecl {
            name: name.clone(),
            owner,
            isolation,
            is_async,
            body,
        });
        self.model.types[owner.index()].functions.push(id);
        self.function_index.insert(key, id);
        Ok(id)
    }

    /// Replace a declared function's body.
    pub fn set_body(&mut self, function: FunctionId, body: Vec<Op>) -> Result<()> {
        let Some(decl) = self.model.function(function) else {
            return Err(self.unknown(function.to_string(), "body attachment"));
        };
        let referrer = format!("function '{}'", decl.name);
        self.model.check_op_handles(&body, &referrer)?;
        self.model.functions[function.index()].body = body;
        Ok(())
    }

    /// Declare a stored property, optionally wired to a synchronous
    /// on-change observer function.
    pub fn declare_property(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        isolation: Option<IsolationDomain>,
        on_change: Option<FunctionId>,
    ) -> Result<PropertyId> {
        let name = name.into();
        self.check_isolation(isolation.as_ref())?;
        let Some(owner_decl) = self.model.type_decl(owner) else {
            return Err(self.unknown(owner.to_string(), &format!("property '{name}'")));
        };
        let owner_name = owner_decl.name.clone();
        let key = (owner, name.clone());
        if self.property_index.contains_key(&key) {
            return Err(ModelError::DuplicateDeclaration {
                what: format!("property '{name}'"),
                owner: owner_name,
            });
        }
        if let Some(observer) = on_change {
            match self.model.function(observer) {
                None => {
                    return Err(self.unknown(observer.to_string(), &format!("property '{name}'")))
                }
                Some(func) if func.is_async => {
                    return Err(ModelError::AsyncObserver { property: name });
                }
                Some(_) => {}
            }
        }
        let id = PropertyId::new(self.model.properties.len());
        self.model.properties.push(StoredProperty {
            name: name.clone(),
            owner,
            isolation,
            on_change,
        });
        self.model.types[owner.index()].properties.push(id);
        self.property_index.insert(key, id);
        Ok(id)
    }

    /// Declare that a type conforms to a protocol. Witnesses are checked at
    /// `finish`, so conformances may be declared before the witness
    /// functions exist.
    pub fn declare_conformance(
        &mut self,
        ty: TypeId,
        protocol: ProtocolId,
        location: ConformanceLocation,
    ) -> Result<()> {
        let Some(decl) = self.model.type_decl(ty) else {
            return Err(self.unknown(ty.to_string(), "conformance declaration"));
        };
        let Some(proto) = self.model.protocol(protocol) else {
            return Err(self.unknown(protocol.to_string(), "conformance declaration"));
        };
        if self.model.conformance_between(ty, protocol).is_some() {
            return Err(ModelError::DuplicateDeclaration {
                what: format!("conformance to '{}'", proto.name),
                owner: decl.name.clone(),
            });
        }
        self.model.conformances.push(Conformance {
            ty,
            protocol,
            location,
        });
        Ok(())
    }

    /// Finish construction. Runs whole-graph validation and returns the
    /// immutable model.
    pub fn finish(self) -> Result<Model> {
        self.model.validate()?;
        debug!(
            "finished model: {} types, {} functions, {} properties, {} conformances",
            self.model.types.len(),
            self.model.functions.len(),
            self.model.properties.len(),
            self.model.conformances.len()
        );
        Ok(self.model)
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name).copied()
    }

    pub fn lookup_protocol(&self, name: &str) -> Option<ProtocolId> {
        self.protocol_index.get(name).copied()
    }

    pub fn lookup_function(&self, owner: TypeId, name: &str) -> Option<FunctionId> {
        self.function_index.get(&(owner, name.to_string())).copied()
    }

    pub fn lookup_property(&self, owner: TypeId, name: &str) -> Option<PropertyId> {
        self.property_index.get(&(owner, name.to_string())).copied()
    }

    fn insert_type(
        &mut self,
        name: String,
        isolation: Option<IsolationDomain>,
        parent: Option<TypeId>,
    ) -> Result<TypeId> {
        self.check_isolation(isolation.as_ref())?;
        if self.type_index.contains_key(&name) {
            return Err(ModelError::DuplicateDeclaration {
                what: format!("type '{name}'"),
                owner: "the model".to_string(),
            });
        }
        let id = TypeId::new(self.model.types.len());
        self.model.types.push(TypeDecl {
            name: name.clone(),
            isolation,
            parent,
            functions: Vec::new(),
            properties: Vec::new(),
            nested: Vec::new(),
        });
        self.type_index.insert(name, id);
        Ok(id)
    }

    fn check_isolation(&self, isolation: Option<&IsolationDomain>) -> Result<()> {
        if let Some(domain) = isolation {
            if !self.model.domains.contains(domain) {
                return Err(ModelError::UnknownDomain {
                    name: domain.as_str().to_string(),
                    registered: self.model.domains.names().map(str::to_string).collect(),
                });
            }
        }
        Ok(())
    }

    fn unknown(&self, what: String, referrer: &str) -> ModelError {
        ModelError::UnknownDeclaration {
            what,
            referrer: referrer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::declaration_model::domain::{CallOp, Dispatch};

    fn main_domain(builder: &mut ModelBuilder) -> IsolationDomain {
        builder.domain("main").unwrap()
    }

    #[test]
    fn builds_a_small_model() {
        let mut builder = ModelBuilder::new();
        let main = main_domain(&mut builder);
        let store = builder.declare_type("Store", Some(main)).unwrap();
        let observer = builder
            .declare_function(store, "changed", None, false, vec![])
            .unwrap();
        let prop = builder
            .declare_property(store, "timestamp", None, Some(observer))
            .unwrap();
        let apply = builder
            .declare_function(store, "apply", None, true, vec![Op::mutate(prop)])
            .unwrap();
        builder
            .declare_function(store, "refresh", None, true, vec![Op::call(apply)])
            .unwrap();
        let model = builder.finish().unwrap();
        assert_eq!(model.types().len(), 1);
        assert_eq!(model.functions().len(), 3);
        assert_eq!(model.properties().len(), 1);
    }

    #[test]
    fn rejects_duplicate_type_names() {
        let mut builder = ModelBuilder::new();
        builder.declare_type("Store", None).unwrap();
        let err = builder.declare_type("Store", None).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn rejects_duplicate_function_on_same_owner() {
        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        builder
            .declare_function(store, "refresh", None, true, vec![])
            .unwrap();
        let err = builder
            .declare_function(store, "refresh", None, false, vec![])
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn allows_same_function_name_on_different_owners() {
        let mut builder = ModelBuilder::new();
        let a = builder.declare_type("A", None).unwrap();
        let b = builder.declare_type("B", None).unwrap();
        builder.declare_function(a, "run", None, false, vec![]).unwrap();
        builder.declare_function(b, "run", None, false, vec![]).unwrap();
        builder.finish().unwrap();
    }

    #[test]
    fn rejects_foreign_handles() {
        let mut other = ModelBuilder::new();
        other.declare_type("X", None).unwrap();
        let foreign = other.declare_type("Y", None).unwrap();

        let mut builder = ModelBuilder::new();
        builder.declare_type("OnlyOne", None).unwrap();
        let err = builder
            .declare_function(foreign, "f", None, false, vec![])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownDeclaration { .. }));
    }

    #[test]
    fn rejects_body_referencing_undeclared_function() {
        let mut other = ModelBuilder::new();
        let t = other.declare_type("T", None).unwrap();
        other.declare_function(t, "a", None, false, vec![]).unwrap();
        let ahead = other.declare_function(t, "b", None, false, vec![]).unwrap();

        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        let err = builder
            .declare_function(store, "refresh", None, true, vec![Op::call(ahead)])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownDeclaration { .. }));
    }

    #[test]
    fn rejects_unregistered_domain_annotation() {
        let mut builder = ModelBuilder::new();
        let err = builder
            .declare_type("Store", Some(IsolationDomain::named("nowhere")))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownDomain { .. }));
    }

    #[test]
    fn rejects_async_observer() {
        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        let observer = builder
            .declare_function(store, "changed", None, true, vec![])
            .unwrap();
        let err = builder
            .declare_property(store, "timestamp", None, Some(observer))
            .unwrap_err();
        assert!(matches!(err, ModelError::AsyncObserver { .. }));
    }

    #[test]
    fn finish_rejects_missing_witness() {
        let mut builder = ModelBuilder::new();
        let proto = builder.declare_protocol("Refreshable", None).unwrap();
        builder.declare_requirement(proto, "refresh", true).unwrap();
        let store = builder.declare_type("Store", None).unwrap();
        builder
            .declare_conformance(store, proto, ConformanceLocation::Inline)
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::MissingWitness { .. }));
    }

    #[test]
    fn witness_must_match_asyncness() {
        let mut builder = ModelBuilder::new();
        let proto = builder.declare_protocol("Refreshable", None).unwrap();
        builder.declare_requirement(proto, "refresh", true).unwrap();
        let store = builder.declare_type("Store", None).unwrap();
        // Sync function under the required name does not witness an async
        // requirement.
        builder
            .declare_function(store, "refresh", None, false, vec![])
            .unwrap();
        builder
            .declare_conformance(store, proto, ConformanceLocation::Inline)
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::MissingWitness { .. }));
    }

    #[test]
    fn finish_rejects_call_cycles() {
        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        let a = builder
            .declare_function(store, "a", None, true, vec![])
            .unwrap();
        let b = builder
            .declare_function(store, "b", None, true, vec![Op::call(a)])
            .unwrap();
        builder.set_body(a, vec![Op::call(b)]).unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::RecursiveDeclaration { .. }));
    }

    #[test]
    fn finish_rejects_self_call() {
        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        let a = builder
            .declare_function(store, "a", None, true, vec![])
            .unwrap();
        builder.set_body(a, vec![Op::call(a)]).unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::RecursiveDeclaration { .. }));
    }

    #[test]
    fn finish_rejects_dispatch_without_conformance() {
        let mut builder = ModelBuilder::new();
        let proto = builder.declare_protocol("Refreshable", None).unwrap();
        builder.declare_requirement(proto, "refresh", true).unwrap();
        let store = builder.declare_type("Store", None).unwrap();
        let refresh = builder
            .declare_function(store, "refresh", None, true, vec![])
            .unwrap();
        let caller = builder.declare_type("Caller", None).unwrap();
        builder
            .declare_function(
                caller,
                "kick",
                None,
                true,
                vec![Op::call_through(refresh, proto)],
            )
            .unwrap();
        // No conformance of Store to Refreshable was declared.
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::UnknownDeclaration { .. }));
    }

    #[test]
    fn observer_cycle_is_rejected() {
        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        let observer = builder
            .declare_function(store, "changed", None, false, vec![])
            .unwrap();
        let prop = builder
            .declare_property(store, "timestamp", None, Some(observer))
            .unwrap();
        // The observer mutates the property it observes.
        builder.set_body(observer, vec![Op::mutate(prop)]).unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::RecursiveDeclaration { .. }));
    }

    #[test]
    fn nested_type_tracks_its_parent() {
        let mut builder = ModelBuilder::new();
        let store = builder.declare_type("Store", None).unwrap();
        let inner = builder
            .declare_nested_type(store, "Formatter", None)
            .unwrap();
        let model = builder.finish().unwrap();
        let decl = model.type_decl(inner).unwrap();
        assert!(decl.is_embedded());
        assert_eq!(decl.parent, Some(store));
        assert_eq!(model.type_decl(store).unwrap().nested, vec![inner]);
    }

    #[test]
    fn dispatch_checks_apply_to_explicit_scripts() {
        let mut builder = ModelBuilder::new();
        let proto = builder.declare_protocol("Refreshable", None).unwrap();
        builder.declare_requirement(proto, "refresh", true).unwrap();
        let store = builder.declare_type("Store", None).unwrap();
        let refresh = builder
            .declare_function(store, "refresh", None, true, vec![])
            .unwrap();
        builder
            .declare_conformance(store, proto, ConformanceLocation::Inline)
            .unwrap();
        let model = builder.finish().unwrap();
        let script = vec![Op::call_through(refresh, proto)];
        model.check_ops(&script, "entry script").unwrap();
        assert!(matches!(
            script[0],
            Op::Call(CallOp {
                dispatch: Dispatch::Protocol(_),
                ..
            })
        ));
    }
}
