//! Response envelope construction
//!
//! Helpers for seeding a response from a request and recording the run's
//! terminal outcome. The caller only ever sees one of two shapes: a success
//! condition (even for degraded runs), or a single fatal result paired with
//! a false condition and the request's desired state echoed unchanged.

use tracing::error;

use crate::proto::{
    self, Condition, ResponseMeta, RunFunctionRequest, RunFunctionResponse, Severity, State,
    Status, Target,
};
use crate::structpb;
use crate::synthesis::DesiredResources;
use crate::Result;

/// Condition type reporting this function's outcome on the composite
pub const CONDITION_TYPE: &str = "FunctionSuccess";

/// Seed a response from a request
///
/// Echoes the request tag, sets the TTL hint, and carries the request's
/// desired state forward so a fatal run commits no mutation.
pub fn to(req: &RunFunctionRequest, ttl_seconds: i64) -> RunFunctionResponse {
    RunFunctionResponse {
        meta: Some(ResponseMeta {
            tag: req.meta.as_ref().map(|m| m.tag.clone()).unwrap_or_default(),
            ttl: Some(prost_types::Duration {
                seconds: ttl_seconds,
                nanos: 0,
            }),
        }),
        desired: req.desired.clone(),
        results: Vec::new(),
        conditions: Vec::new(),
    }
}

/// Record the run's single terminal failure
///
/// Appends a fatal result targeting the composite plus a false condition, so
/// both result-watching and condition-watching callers see the failure.
pub fn fatal(rsp: &mut RunFunctionResponse, message: impl Into<String>) {
    let message = message.into();
    error!(message = %message, "function run failed");

    rsp.results.push(proto::Result {
        severity: Severity::Fatal as i32,
        message: message.clone(),
        target: Some(Target::Composite as i32),
    });
    rsp.conditions.push(Condition {
        r#type: CONDITION_TYPE.to_string(),
        status: Status::ConditionFalse as i32,
        reason: "Fatal".to_string(),
        message: Some(message),
        target: Some(Target::Composite as i32),
    });
}

/// Record a successful run on the composite and its claim
pub fn success(rsp: &mut RunFunctionResponse) {
    rsp.conditions.push(Condition {
        r#type: CONDITION_TYPE.to_string(),
        status: Status::ConditionTrue as i32,
        reason: "Success".to_string(),
        message: None,
        target: Some(Target::CompositeAndClaim as i32),
    });
}

/// Write the final desired composed resources into the response
///
/// The whole map is converted before any of it is committed, so an encoding
/// failure leaves the response's desired state untouched.
pub fn set_desired_resources(
    rsp: &mut RunFunctionResponse,
    desired: DesiredResources,
) -> Result<()> {
    let resources = desired
        .into_iter()
        .map(|(name, value)| {
            let resource = proto::Resource {
                resource: Some(structpb::to_struct(&value)?),
            };
            Ok((name, resource))
        })
        .collect::<Result<_>>()?;

    let state = rsp.desired.get_or_insert_with(State::default);
    state.resources = resources;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::RequestMeta;
    use serde_json::json;

    fn tagged_request() -> RunFunctionRequest {
        RunFunctionRequest {
            meta: Some(RequestMeta {
                tag: "abc123".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn seeded_response_echoes_tag_and_ttl() {
        let rsp = to(&tagged_request(), 60);

        let meta = rsp.meta.unwrap();
        assert_eq!(meta.tag, "abc123");
        assert_eq!(meta.ttl, Some(prost_types::Duration { seconds: 60, nanos: 0 }));
        assert!(rsp.results.is_empty());
        assert!(rsp.conditions.is_empty());
    }

    #[test]
    fn fatal_records_result_and_false_condition() {
        let mut rsp = to(&tagged_request(), 60);
        fatal(&mut rsp, "cannot get tenant name");

        assert_eq!(rsp.results.len(), 1);
        assert_eq!(rsp.results[0].severity, Severity::Fatal as i32);
        assert_eq!(rsp.results[0].message, "cannot get tenant name");

        assert_eq!(rsp.conditions.len(), 1);
        assert_eq!(rsp.conditions[0].r#type, CONDITION_TYPE);
        assert_eq!(rsp.conditions[0].status, Status::ConditionFalse as i32);
        assert_eq!(rsp.conditions[0].target, Some(Target::Composite as i32));
    }

    #[test]
    fn success_targets_composite_and_claim() {
        let mut rsp = to(&tagged_request(), 60);
        success(&mut rsp);

        assert_eq!(rsp.conditions.len(), 1);
        assert_eq!(rsp.conditions[0].status, Status::ConditionTrue as i32);
        assert_eq!(rsp.conditions[0].reason, "Success");
        assert_eq!(
            rsp.conditions[0].target,
            Some(Target::CompositeAndClaim as i32)
        );
    }

    #[test]
    fn desired_resources_are_written_back_as_structs() {
        let mut rsp = to(&tagged_request(), 60);

        let mut desired = DesiredResources::new();
        desired.insert("a".to_string(), json!({"kind": "ClusterRoleBinding"}));
        desired.insert("b".to_string(), json!({"kind": "Bucket"}));

        set_desired_resources(&mut rsp, desired).unwrap();

        let resources = rsp.desired.unwrap().resources;
        assert_eq!(resources.len(), 2);
        assert!(resources["a"].resource.is_some());
    }

    #[test]
    fn non_object_entry_fails_without_partial_commit() {
        let mut rsp = to(&tagged_request(), 60);

        let mut desired = DesiredResources::new();
        desired.insert("good".to_string(), json!({"kind": "Bucket"}));
        desired.insert("bad".to_string(), json!("not an object"));

        assert!(set_desired_resources(&mut rsp, desired).is_err());
        // The seeded desired state (None) is untouched
        assert!(rsp.desired.is_none());
    }
}
