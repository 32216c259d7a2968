use json_patch::PatchOperation;
use tracing::debug;

use crate::{
    admission_request::{AdmissionRequest, GroupVersionKind},
    errors::MutationError,
    settings::MutationSettings,
};

mod deployment;

/// The kinds of objects that receive a dedicated treatment.
///
/// The match on the kind is exact and case sensitive, the group and version
/// are not considered. Every other kind falls into `Passthrough` and is
/// admitted unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationTarget {
    Deployment,
    Passthrough,
}

impl MutationTarget {
    pub fn from_kind(kind: &GroupVersionKind) -> Self {
        match kind.kind.as_str() {
            deployment::KIND => MutationTarget::Deployment,
            _ => MutationTarget::Passthrough,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    /// Reject the request with a reason. No rule emits it yet.
    Denied { reason: String },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// The outcome of the rule engine: a verdict plus the ordered patch operations.
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    pub verdict: Verdict,
    pub operations: Vec<PatchOperation>,
}

impl Mutation {
    fn allowed(operations: Vec<PatchOperation>) -> Self {
        Mutation {
            verdict: Verdict::Allowed,
            operations,
        }
    }
}

/// Decide the patch to apply to the object carried by the request.
///
/// Requests without an object, such as DELETE operations, are never mutated.
pub fn mutate(
    settings: &MutationSettings,
    request: &AdmissionRequest,
) -> Result<Mutation, MutationError> {
    let target = MutationTarget::from_kind(&request.kind);

    let Some(object) = request.object.as_ref() else {
        debug!(
            uid = request.uid.as_str(),
            kind = %request.kind,
            operation = %request.operation,
            "request carries no object, nothing to mutate"
        );
        return Ok(Mutation::allowed(Vec::new()));
    };

    match target {
        MutationTarget::Deployment => {
            let operations = deployment::placement_patch(settings, request, &object.0)?;
            Ok(Mutation::allowed(operations))
        }
        MutationTarget::Passthrough => {
            debug!(
                uid = request.uid.as_str(),
                kind = %request.kind,
                "kind is not handled, allowing unchanged"
            );
            Ok(Mutation::allowed(Vec::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn kind(kind: &str) -> GroupVersionKind {
        GroupVersionKind {
            group: "apps".to_owned(),
            version: "v1".to_owned(),
            kind: kind.to_owned(),
        }
    }

    #[rstest]
    #[case::deployment("Deployment", MutationTarget::Deployment)]
    #[case::lowercase("deployment", MutationTarget::Passthrough)]
    #[case::plural("Deployments", MutationTarget::Passthrough)]
    #[case::pod("Pod", MutationTarget::Passthrough)]
    #[case::stateful_set("StatefulSet", MutationTarget::Passthrough)]
    fn dispatch_is_exact(#[case] input: &str, #[case] expected: MutationTarget) {
        assert_eq!(MutationTarget::from_kind(&kind(input)), expected);
    }

    #[rstest]
    #[case::apps("apps", "v1")]
    #[case::extensions("extensions", "v1beta1")]
    fn dispatch_ignores_group_and_version(#[case] group: &str, #[case] version: &str) {
        let kind = GroupVersionKind {
            group: group.to_owned(),
            version: version.to_owned(),
            kind: "Deployment".to_owned(),
        };
        assert_eq!(MutationTarget::from_kind(&kind), MutationTarget::Deployment);
    }

    fn request(kind: &str, object: Option<serde_json::Value>) -> AdmissionRequest {
        let operation = if object.is_some() { "CREATE" } else { "DELETE" };
        serde_json::from_value(json!({
            "uid": "xyz-999",
            "kind": {"group": "", "version": "v1", "kind": kind},
            "operation": operation,
            "userInfo": {"username": "admin"},
            "object": object,
        }))
        .unwrap()
    }

    #[test]
    fn other_kinds_pass_through() {
        let request = request(
            "Pod",
            Some(json!({"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "nginx"}})),
        );

        let mutation = mutate(&MutationSettings::default(), &request).unwrap();
        assert!(mutation.verdict.is_allowed());
        assert!(mutation.operations.is_empty());
    }

    #[test]
    fn deployment_without_object_is_not_mutated() {
        let request = request("Deployment", None);

        let mutation = mutate(&MutationSettings::default(), &request).unwrap();
        assert_eq!(mutation, Mutation::allowed(Vec::new()));
    }

    #[test]
    fn malformed_deployment_is_a_decode_error() {
        let request = request(
            "Deployment",
            Some(json!({"apiVersion": "apps/v1", "kind": "Deployment", "spec": "oops"})),
        );

        let err = mutate(&MutationSettings::default(), &request).unwrap_err();
        assert!(matches!(
            err,
            MutationError::Decode(crate::errors::DecodeError::MalformedObject { ref kind, .. })
                if kind == "Deployment"
        ));
    }
}
