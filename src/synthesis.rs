//! Per-revision synthesis into the desired composed resources
//!
//! This is the core of the function: for each observed ProviderRevision,
//! derive the composed resource carrying the tenant's ClusterRoleBinding and
//! merge it into the desired-resource map shared with the rest of the
//! pipeline. The map may already contain entries from other functions; this
//! module only ever writes keys produced by [`identity::binding_name`] and
//! never reads or removes anything else.
//!
//! Entries under our own keys are rewritten unconditionally on every run -
//! synthesis re-derives its state from scratch rather than diffing, which is
//! what makes runs idempotent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::identity;
use crate::manifest::{self, ClusterRoleBinding};
use crate::observed::ObservedRevision;
use crate::Error;

// =============================================================================
// Composed Resource Envelope
// =============================================================================

/// Annotation naming the external identity of a composed resource
pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";

/// apiVersion of the provider-kubernetes Object wrapper
pub const OBJECT_API_VERSION: &str = "kubernetes.crossplane.io/v1alpha2";

/// kind of the provider-kubernetes Object wrapper
pub const OBJECT_KIND: &str = "Object";

/// The provider-kubernetes `Object` wrapping one synthesized binding
///
/// provider-kubernetes applies `spec.forProvider.manifest` to the cluster
/// verbatim; the outer external-name annotation gives the composed resource
/// the same identity as the binding it carries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComposedObject {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ComposedMeta,
    /// Spec
    pub spec: ComposedSpec,
}

/// Composed Object metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComposedMeta {
    /// Annotations
    pub annotations: BTreeMap<String, String>,
}

/// Composed Object spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComposedSpec {
    /// Provider-facing parameters
    pub for_provider: ForProvider,
}

/// Provider-facing parameters: the manifest to apply
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForProvider {
    /// The embedded ClusterRoleBinding, applied verbatim
    pub manifest: ClusterRoleBinding,
}

impl ComposedObject {
    /// Wrap a rendered binding in the provider-kubernetes envelope
    pub fn wrapping(external_name: impl Into<String>, binding: ClusterRoleBinding) -> Self {
        let mut annotations = BTreeMap::new();
        annotations.insert(EXTERNAL_NAME_ANNOTATION.to_string(), external_name.into());

        Self {
            api_version: OBJECT_API_VERSION.to_string(),
            kind: OBJECT_KIND.to_string(),
            metadata: ComposedMeta { annotations },
            spec: ComposedSpec {
                for_provider: ForProvider { manifest: binding },
            },
        }
    }
}

// =============================================================================
// Synthesis
// =============================================================================

/// The shared desired composed resources, keyed by resource name
///
/// Seeded from the request (it may already hold other functions' entries),
/// mutated in place here, re-emitted in full by the response adapter.
pub type DesiredResources = BTreeMap<String, JsonValue>;

/// Synthesize one binding per observed revision into the desired map
///
/// Returns the number of distinct keys written this run. Insertion is
/// unconditional at each computed key: duplicate package labels across
/// revisions collapse to one entry, last write winning, so the returned
/// count can be smaller than the number of revisions. Input order is
/// arbitrary and only affects which duplicate survives, never the key set.
pub fn synthesize(
    tenant: &str,
    revisions: &[ObservedRevision],
    desired: &mut DesiredResources,
) -> Result<usize, Error> {
    let mut written = BTreeSet::new();

    for revision in revisions {
        let package = revision.package_or_empty();
        let name = identity::binding_name(tenant, package);

        debug!(
            tenant = %tenant,
            package = %package,
            revision = %revision.name,
            resource = %name,
            "synthesizing provider edit binding"
        );

        let binding = manifest::render_binding(tenant, package, &revision.name);
        let object = ComposedObject::wrapping(&name, binding);
        let value = serde_json::to_value(&object)
            .map_err(|e| Error::serialization(format!("cannot encode {name}: {e}")))?;

        desired.insert(name.clone(), value);
        written.insert(name);
    }

    Ok(written.len())
}
