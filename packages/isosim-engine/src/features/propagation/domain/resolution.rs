//! Effective-domain resolution
//!
//! Pure functions implementing the fallback chain and the per-site rules.
//! For a function reached through a given dispatch, the effective domain is
//! the first hit in:
//!
//! 1. the function's own annotation
//! 2. the owning type's own annotation (embedding boundaries are opaque,
//!    there is no walk up to enclosing types)
//! 3. the protocol's annotation, only when the call dispatches through that
//!    protocol and the target is the witness
//! 4. unconstrained
//!
//! Whether the resolved domain is actually entered then depends on the call
//! site: async sites hop, sync sites either inherit, stay put or fail.
//!
//! All handles passed here must originate from the model being queried.

use serde::{Deserialize, Serialize};

use crate::features::declaration_model::{CallOp, Dispatch, FunctionId, Model, PropertyId};
use crate::shared::models::IsolationDomain;

use super::super::error::{PropagationError, Result};

/// Outcome of resolving one call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Domain the callee executes in.
    pub domain: IsolationDomain,
    /// Domain the caller suspended in, when the call crossed domains.
    pub hop: Option<IsolationDomain>,
}

/// The effective domain of a function reached through `dispatch`.
pub fn effective_domain(model: &Model, function: FunctionId, dispatch: Dispatch) -> IsolationDomain {
    let func = &model.functions[function.index()];
    if let Some(domain) = &func.isolation {
        return domain.clone();
    }
    let owner = &model.types[func.owner.index()];
    if let Some(domain) = &owner.isolation {
        return domain.clone();
    }
    if let Dispatch::Protocol(protocol) = dispatch {
        if model.witness(func.owner, protocol, &func.name) == Some(function) {
            if let Some(domain) = &model.protocols[protocol.index()].isolation {
                return domain.clone();
            }
        }
    }
    IsolationDomain::Unconstrained
}

/// The effective domain of a stored property: its own annotation, then the
/// owning type's, then unconstrained. Dispatch never applies to properties.
pub fn effective_property_domain(model: &Model, property: PropertyId) -> IsolationDomain {
    let prop = &model.properties[property.index()];
    if let Some(domain) = &prop.isolation {
        return domain.clone();
    }
    model.types[prop.owner.index()]
        .isolation
        .clone()
        .unwrap_or(IsolationDomain::Unconstrained)
}

/// Resolve one call site executing in `caller`.
///
/// Async callees are the only legal hop points: a named effective domain is
/// entered (recording the hop when it differs from the caller), and an
/// unconstrained effective domain always detaches to the worker pool, even
/// from a named caller. Sync callees run inline: unconstrained inherits the
/// caller's domain, a named domain is legal only when the caller is already
/// in it.
pub fn resolve_call(model: &Model, call: CallOp, caller: &IsolationDomain) -> Result<Resolution> {
    let func = &model.functions[call.target.index()];
    let effective = effective_domain(model, call.target, call.dispatch);
    if func.is_async {
        let hop = (effective != *caller).then(|| caller.clone());
        return Ok(Resolution {
            domain: effective,
            hop,
        });
    }
    if effective.inherits_caller() {
        Ok(Resolution {
            domain: caller.clone(),
            hop: None,
        })
    } else if *caller == effective {
        Ok(Resolution {
            domain: effective,
            hop: None,
        })
    } else {
        Err(PropagationError::IsolationViolation {
            operation: func.name.clone(),
            required: effective,
            executing: caller.clone(),
        })
    }
}

/// Resolve one property assignment executing in `site`. An unconstrained
/// property is writable from anywhere and the write runs at the site; a
/// named property requires the site to already be in that domain.
pub fn resolve_mutation(
    model: &Model,
    property: PropertyId,
    site: &IsolationDomain,
) -> Result<IsolationDomain> {
    let required = effective_property_domain(model, property);
    if required.inherits_caller() || *site == required {
        Ok(site.clone())
    } else {
        Err(PropagationError::IsolationViolation {
            operation: model.properties[property.index()].name.clone(),
            required,
            executing: site.clone(),
        })
    }
}
