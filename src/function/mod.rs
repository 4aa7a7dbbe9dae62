//! The gRPC function runner service
//!
//! Implements the composition engine's `FunctionRunnerService` contract. One
//! `RunFunction` call is one synthesis run, processed to completion before
//! the response is returned:
//!
//! 1. Seed the response from the request (tag echo, TTL, prior desired state)
//! 2. Extract the desired composed resources and the tenant name
//! 3. List ProviderRevisions through the injected lister
//! 4. Synthesize one binding per revision into the desired map
//! 5. Write the map back and set the success condition
//!
//! Failures split into two classes. Fatal (missing tenant, malformed state,
//! encoding failure) aborts the run with a fatal result and commits no
//! desired-state mutation. Degraded (cluster listing failure) is logged and
//! the run continues with zero revisions, still reporting success, so a
//! broken cluster connection never blocks the rest of the pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use crate::observed::RevisionLister;
use crate::proto::function_runner_service_server::{
    FunctionRunnerService, FunctionRunnerServiceServer,
};
use crate::proto::{RunFunctionRequest, RunFunctionResponse};
use crate::synthesis;
use crate::tls::ServerTls;
use crate::DEFAULT_TTL_SECONDS;

pub mod request;
pub mod response;

/// The function runner service
///
/// Holds the revision lister for its whole lifetime; runs share it and never
/// construct their own cluster connection.
pub struct FunctionService {
    lister: Arc<dyn RevisionLister>,
}

impl FunctionService {
    /// Create a new function service over the given lister
    pub fn new(lister: Arc<dyn RevisionLister>) -> Self {
        Self { lister }
    }

    /// Convert to a tonic service
    pub fn into_service(self) -> FunctionRunnerServiceServer<Self> {
        FunctionRunnerServiceServer::new(self)
    }

    /// Start the gRPC server with TLS on the given address
    ///
    /// This is the primary entry point for running the function. The engine
    /// verifies the server certificate, so `tls` must carry the identity the
    /// engine expects.
    pub async fn serve_with_tls(
        lister: Arc<dyn RevisionLister>,
        addr: SocketAddr,
        tls: ServerTls,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = Self::new(lister);

        info!(%addr, "starting function runner with TLS");

        Server::builder()
            .tls_config(tls.to_tonic_config())?
            .add_service(service.into_service())
            .serve(addr)
            .await?;

        Ok(())
    }

    /// Start the gRPC server without TLS (for local testing only)
    pub async fn serve_insecure(
        lister: Arc<dyn RevisionLister>,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = Self::new(lister);

        warn!(%addr, "starting function runner WITHOUT TLS - for local testing only!");

        Server::builder()
            .add_service(service.into_service())
            .serve(addr)
            .await?;

        Ok(())
    }

    /// Run one synthesis pass over a request
    ///
    /// Always produces a response; failures are reported in-band as fatal
    /// results, never as transport errors.
    async fn run(&self, req: RunFunctionRequest) -> RunFunctionResponse {
        let tag = req.meta.as_ref().map(|m| m.tag.as_str()).unwrap_or("");
        info!(tag = %tag, "running function");

        let mut rsp = response::to(&req, DEFAULT_TTL_SECONDS);

        let mut desired = match request::desired_resources(&req) {
            Ok(desired) => desired,
            Err(e) => {
                response::fatal(&mut rsp, format!("cannot get desired composed resources: {e}"));
                return rsp;
            }
        };

        let tenant = match request::tenant_name(&req) {
            Ok(tenant) => tenant,
            Err(e) => {
                response::fatal(&mut rsp, format!("cannot get tenant name: {e}"));
                return rsp;
            }
        };

        // Degraded path: a cluster we cannot list is an empty cluster for
        // this run. The rest of the pipeline's desired state still flows.
        let revisions = match self.lister.list_revisions().await {
            Ok(revisions) => revisions,
            Err(e) => {
                warn!(
                    tenant = %tenant,
                    error = %e,
                    "cannot list provider revisions, synthesizing nothing this run"
                );
                Vec::new()
            }
        };

        let count = match synthesis::synthesize(&tenant, &revisions, &mut desired) {
            Ok(count) => count,
            Err(e) => {
                response::fatal(&mut rsp, format!("cannot synthesize desired resources: {e}"));
                return rsp;
            }
        };

        if let Err(e) = response::set_desired_resources(&mut rsp, desired) {
            response::fatal(&mut rsp, format!("cannot set desired composed resources: {e}"));
            return rsp;
        }

        info!(
            tenant = %tenant,
            revisions = revisions.len(),
            synthesized = count,
            "granted tenant service account edit access to installed providers"
        );

        response::success(&mut rsp);
        rsp
    }
}

#[tonic::async_trait]
impl FunctionRunnerService for FunctionService {
    async fn run_function(
        &self,
        request: Request<RunFunctionRequest>,
    ) -> Result<Response<RunFunctionResponse>, Status> {
        let rsp = self.run(request.into_inner()).await;
        Ok(Response::new(rsp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::observed::{MockRevisionLister, ObservedRevision};
    use crate::proto::{RequestMeta, Resource, Severity, State, Status as ConditionStatus, Target};
    use crate::structpb;
    use serde_json::json;

    fn observed_composite(tenant: Option<&str>) -> State {
        let mut spec = json!({
            "gitBranch": "main",
            "gitPath": "/demo000"
        });
        if let Some(tenant) = tenant {
            spec["tenantName"] = json!(tenant);
        }
        State {
            composite: Some(Resource {
                resource: Some(
                    structpb::to_struct(&json!({
                        "apiVersion": "gitops.idp.someorg.com/v1alpha1",
                        "kind": "XFluxcdTenant",
                        "spec": spec
                    }))
                    .unwrap(),
                ),
            }),
            resources: Default::default(),
        }
    }

    fn request_for(tenant: Option<&str>) -> RunFunctionRequest {
        RunFunctionRequest {
            meta: Some(RequestMeta {
                tag: "test".to_string(),
            }),
            observed: Some(observed_composite(tenant)),
            desired: None,
            input: None,
        }
    }

    fn service_with(revisions: Vec<ObservedRevision>) -> FunctionService {
        let mut lister = MockRevisionLister::new();
        lister
            .expect_list_revisions()
            .returning(move || Ok(revisions.clone()));
        FunctionService::new(Arc::new(lister))
    }

    // =========================================================================
    // Story: Empty Cluster, Successful Run
    // =========================================================================

    #[tokio::test]
    async fn story_zero_revisions_still_succeeds() {
        let service = service_with(Vec::new());

        let rsp = service.run(request_for(Some("demo000"))).await;

        assert!(rsp.results.is_empty());
        assert_eq!(rsp.conditions.len(), 1);
        let condition = &rsp.conditions[0];
        assert_eq!(condition.r#type, "FunctionSuccess");
        assert_eq!(condition.status, ConditionStatus::ConditionTrue as i32);
        assert_eq!(condition.reason, "Success");
        assert_eq!(condition.target, Some(Target::CompositeAndClaim as i32));

        // Tag and TTL are echoed from the request
        let meta = rsp.meta.unwrap();
        assert_eq!(meta.tag, "test");
        assert_eq!(meta.ttl.unwrap().seconds, 60);

        // No desired entries were added
        assert!(rsp.desired.unwrap().resources.is_empty());
    }

    // =========================================================================
    // Story: Missing Tenant Name Is Fatal
    // =========================================================================

    #[tokio::test]
    async fn story_missing_tenant_name_aborts_the_run() {
        let service = service_with(vec![ObservedRevision {
            name: "provider-kubernetes-71953a1e5c15".to_string(),
            package: Some("provider-kubernetes".to_string()),
        }]);

        let rsp = service.run(request_for(None)).await;

        assert_eq!(rsp.results.len(), 1);
        let result = &rsp.results[0];
        assert_eq!(result.severity, Severity::Fatal as i32);
        assert!(result.message.contains("tenant name"));

        // The terminal failure is also visible as a false condition
        let condition = &rsp.conditions[0];
        assert_eq!(condition.status, ConditionStatus::ConditionFalse as i32);
        assert_eq!(condition.reason, "Fatal");

        // Desired state is echoed unchanged: nothing was synthesized
        assert!(rsp.desired.is_none());
    }

    #[tokio::test]
    async fn story_empty_tenant_name_aborts_the_run() {
        let service = service_with(Vec::new());

        let rsp = service.run(request_for(Some(""))).await;

        assert_eq!(rsp.results.len(), 1);
        assert_eq!(rsp.results[0].severity, Severity::Fatal as i32);
    }

    // =========================================================================
    // Story: Listing Failure Degrades the Run, Never Fails It
    // =========================================================================

    #[tokio::test]
    async fn story_lister_failure_still_reports_success() {
        let mut lister = MockRevisionLister::new();
        lister
            .expect_list_revisions()
            .returning(|| Err(Error::cluster("connection refused")));
        let service = FunctionService::new(Arc::new(lister));

        // Seed the request with another function's entry
        let mut req = request_for(Some("demo000"));
        req.desired = Some(State {
            composite: None,
            resources: [(
                "xbuckets-store".to_string(),
                Resource {
                    resource: Some(structpb::to_struct(&json!({"kind": "Bucket"})).unwrap()),
                },
            )]
            .into(),
        });

        let rsp = service.run(req).await;

        // Success, with the pre-run accumulator flushed unchanged
        assert!(rsp.results.is_empty());
        assert_eq!(rsp.conditions[0].status, ConditionStatus::ConditionTrue as i32);
        let resources = rsp.desired.unwrap().resources;
        assert_eq!(resources.len(), 1);
        assert!(resources.contains_key("xbuckets-store"));
    }

    // =========================================================================
    // Story: A Malformed Desired Entry Is Fatal
    // =========================================================================

    #[tokio::test]
    async fn story_desired_entry_without_document_aborts_the_run() {
        let service = service_with(Vec::new());

        let mut req = request_for(Some("demo000"));
        req.desired = Some(State {
            composite: None,
            resources: [("broken".to_string(), Resource { resource: None })].into(),
        });

        let rsp = service.run(req).await;

        assert_eq!(rsp.results.len(), 1);
        assert_eq!(rsp.results[0].severity, Severity::Fatal as i32);
        assert!(rsp.results[0].message.contains("desired composed resources"));
    }
}
