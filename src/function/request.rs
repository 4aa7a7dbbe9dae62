//! Request envelope extraction
//!
//! Pulls the two inputs of a synthesis run out of the request: the prior
//! desired composed resources and the tenant name from the observed
//! composite. Both are fatal preconditions; a request we cannot read aborts
//! the run before any mutation happens.

use serde_json::Value as JsonValue;

use crate::proto::RunFunctionRequest;
use crate::structpb;
use crate::synthesis::DesiredResources;
use crate::{Error, Result};

/// JSON pointer to the tenant name on the observed composite
const TENANT_NAME_POINTER: &str = "/spec/tenantName";

/// Extract the prior desired composed resources from the request
///
/// The map may already carry entries written by other pipeline functions;
/// they pass through untouched. An entry without a resource document means
/// the request is malformed, which is fatal.
pub fn desired_resources(req: &RunFunctionRequest) -> Result<DesiredResources> {
    let mut desired = DesiredResources::new();

    if let Some(state) = &req.desired {
        for (name, resource) in &state.resources {
            let doc = resource.resource.as_ref().ok_or_else(|| {
                Error::request(format!("desired resource {name:?} has no document"))
            })?;
            desired.insert(name.clone(), structpb::from_struct(doc));
        }
    }

    Ok(desired)
}

/// Extract the tenant name from the observed composite resource
///
/// The tenant name parameterizes every name this run produces; a missing or
/// empty value is fatal since no partial synthesis is possible without it.
pub fn tenant_name(req: &RunFunctionRequest) -> Result<String> {
    let composite = req
        .observed
        .as_ref()
        .and_then(|state| state.composite.as_ref())
        .and_then(|resource| resource.resource.as_ref())
        .ok_or_else(|| Error::request("request has no observed composite resource"))?;

    let doc = structpb::from_struct(composite);
    match doc.pointer(TENANT_NAME_POINTER).and_then(JsonValue::as_str) {
        Some(tenant) if !tenant.is_empty() => Ok(tenant.to_string()),
        _ => Err(Error::request("composite has no spec.tenantName")),
    }
}
