//! ClusterRoleBinding payload templating
//!
//! This module defines the RBAC document embedded in every synthesized
//! resource: a ClusterRoleBinding granting the tenant's ServiceAccount the
//! provider revision's aggregated edit role. The document is a fixed shape;
//! only the tenant name, package label, and revision name vary. Building it
//! as typed structs and serializing through serde keeps the "template" free
//! of positional-substitution bugs and makes repeated renders byte-identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity;

// =============================================================================
// Fixed Template Constants
// =============================================================================

/// Label marking the binding as managed by the tenants Kustomization
pub const FLUX_NAME_LABEL: &str = "kustomize.toolkit.fluxcd.io/name";

/// Value of [`FLUX_NAME_LABEL`] on every synthesized binding
pub const FLUX_NAME: &str = "tenants";

/// Label carrying the Kustomization's namespace
pub const FLUX_NAMESPACE_LABEL: &str = "kustomize.toolkit.fluxcd.io/namespace";

/// Value of [`FLUX_NAMESPACE_LABEL`] on every synthesized binding
pub const FLUX_NAMESPACE: &str = "flux-system";

// =============================================================================
// Kubernetes RBAC Types
// =============================================================================

/// Kubernetes ClusterRoleBinding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: BindingMeta,
    /// Referenced ClusterRole
    pub role_ref: RoleRef,
    /// Bound subjects
    pub subjects: Vec<Subject>,
}

/// ClusterRoleBinding metadata (cluster-scoped, so no namespace)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BindingMeta {
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Resource name
    pub name: String,
}

/// Reference to the role being granted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    /// API group of the referenced role
    pub api_group: String,
    /// Kind of the referenced role
    pub kind: String,
    /// Name of the referenced role
    pub name: String,
}

/// Subject the role is granted to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Subject kind
    pub kind: String,
    /// Subject name
    pub name: String,
    /// Subject namespace
    pub namespace: String,
}

/// Render the ClusterRoleBinding for one observed provider revision
///
/// The binding name equals [`identity::binding_name`], the role reference is
/// the revision's aggregated edit role, and the subject is the tenant's
/// ServiceAccount in the tenant's own namespace. Inputs are substituted
/// verbatim; nothing is validated here.
pub fn render_binding(tenant: &str, package: &str, revision: &str) -> ClusterRoleBinding {
    let mut labels = BTreeMap::new();
    labels.insert(FLUX_NAME_LABEL.to_string(), FLUX_NAME.to_string());
    labels.insert(FLUX_NAMESPACE_LABEL.to_string(), FLUX_NAMESPACE.to_string());

    ClusterRoleBinding {
        api_version: "rbac.authorization.k8s.io/v1".to_string(),
        kind: "ClusterRoleBinding".to_string(),
        metadata: BindingMeta {
            labels,
            name: identity::binding_name(tenant, package),
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: identity::aggregate_role_name(revision),
        },
        subjects: vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: tenant.to_string(),
            namespace: tenant.to_string(),
        }],
    }
}
