//! ProviderRevision observation
//!
//! The synthesis loop runs over a snapshot of the cluster's ProviderRevision
//! objects. This module projects the two fields synthesis needs out of the
//! untyped API objects and abstracts the listing itself behind a trait so the
//! run logic can be tested without a cluster.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use kube::{Client, ResourceExt};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::Error;

/// Label on a ProviderRevision naming the provider package it belongs to
pub const PACKAGE_LABEL: &str = "pkg.crossplane.io/package";

/// The fields of one observed ProviderRevision that synthesis consumes
///
/// Read-only snapshot: fetched once per run, never mutated, discarded at
/// the end of the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedRevision {
    /// The revision's own object name, e.g. `provider-kubernetes-71953a1e5c15`
    pub name: String,
    /// Value of the `pkg.crossplane.io/package` label, if present
    pub package: Option<String>,
}

impl ObservedRevision {
    /// Project an observed revision out of an untyped API object
    ///
    /// A missing package label becomes `None`; the decision of what to do
    /// about it belongs to the caller.
    pub fn from_dynamic(obj: &DynamicObject) -> Self {
        Self {
            name: obj.name_any(),
            package: obj.labels().get(PACKAGE_LABEL).cloned(),
        }
    }

    /// The package label, or an empty string when the label is absent
    pub fn package_or_empty(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

/// Trait abstracting the per-run ProviderRevision listing
///
/// This trait allows mocking the cluster in tests while using the real
/// client in production. One call per run; no ordering guarantee beyond
/// "each matching object exactly once".
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RevisionLister: Send + Sync {
    /// List the current ProviderRevisions across the cluster
    async fn list_revisions(&self) -> Result<Vec<ObservedRevision>, Error>;
}

/// Real lister backed by a Kubernetes client
///
/// The client is constructed once at process start and shared across runs;
/// a run never builds its own connection.
pub struct KubeRevisionLister {
    client: Client,
}

impl KubeRevisionLister {
    /// Create a new lister over the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn provider_revision_resource() -> ApiResource {
        let gvk = GroupVersionKind::gvk("pkg.crossplane.io", "v1", "ProviderRevision");
        ApiResource::from_gvk_with_plural(&gvk, "providerrevisions")
    }
}

#[async_trait]
impl RevisionLister for KubeRevisionLister {
    async fn list_revisions(&self) -> Result<Vec<ObservedRevision>, Error> {
        let ar = Self::provider_revision_resource();
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &ar);

        let list = api.list(&ListParams::default()).await?;
        let revisions: Vec<ObservedRevision> =
            list.items.iter().map(ObservedRevision::from_dynamic).collect();

        debug!(count = revisions.len(), "listed provider revisions");
        Ok(revisions)
    }
}

/// Lister standing in when no cluster connection could be established
///
/// Holds the construction failure and reports it on every call, so each run
/// takes the degraded zero-revision path instead of crashing the process.
pub struct UnavailableRevisionLister {
    reason: String,
}

impl UnavailableRevisionLister {
    /// Create a lister that fails with the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RevisionLister for UnavailableRevisionLister {
    async fn list_revisions(&self) -> Result<Vec<ObservedRevision>, Error> {
        Err(Error::cluster(self.reason.clone()))
    }
}
