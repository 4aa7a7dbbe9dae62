//! Deterministic naming for synthesized resources
//!
//! Two name schemes parameterize everything this function produces:
//!
//! - The binding name `{tenant}-{package}-edit`, used three ways: as the key
//!   into the desired composed resources map, as the external-name
//!   annotation on the composed `Object`, and as the ClusterRoleBinding's
//!   own metadata name. All three must always agree, so they all come from
//!   [`binding_name`].
//! - The aggregated ClusterRole name Crossplane derives per provider
//!   revision, reproduced by [`aggregate_role_name`].
//!
//! Both are pure string derivations. Inputs are substituted verbatim: an
//! empty or oddly-shaped package label still yields a well-formed name, and
//! rejecting it is the API server's job, not ours.

/// Name of the ClusterRoleBinding synthesized for one (tenant, package) pair
///
/// Also serves as the desired-resource key and external-name annotation
/// value. The `-edit` suffix keeps the key out of the namespace other
/// pipeline functions use for their own entries.
pub fn binding_name(tenant: &str, package: &str) -> String {
    format!("{tenant}-{package}-edit")
}

/// Name of the aggregated edit ClusterRole Crossplane manages for a
/// provider revision
pub fn aggregate_role_name(revision: &str) -> String {
    format!("crossplane:provider:{revision}:aggregate-to-edit")
}
