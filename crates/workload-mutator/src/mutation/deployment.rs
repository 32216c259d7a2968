use json_patch::{AddOperation, PatchOperation, ReplaceOperation};
use jsonptr::PointerBuf;
use k8s_openapi::{
    Resource,
    api::{
        apps::v1::Deployment,
        core::v1::{PodSpec, Toleration},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::{
    admission_request::AdmissionRequest,
    errors::{DecodeError, EncodeError, MutationError},
    patch::patch_value,
    settings::{MutationSettings, PatchStrategy},
};

pub(super) const KIND: &str = "Deployment";

const TOLERATION_OPERATOR_EQUAL: &str = "Equal";
const TAINT_EFFECT_NO_SCHEDULE: &str = "NoSchedule";

/// Pin the pods of a Deployment to the workload nodes and let them tolerate
/// the taint those nodes carry.
pub(super) fn placement_patch(
    settings: &MutationSettings,
    request: &AdmissionRequest,
    object: &serde_json::Value,
) -> Result<Vec<PatchOperation>, MutationError> {
    let deployment = decode_deployment(object)?;

    info!(
        uid = request.uid.as_str(),
        kind = %request.kind,
        namespace = request.namespace.as_deref().unwrap_or_default(),
        name = request.name.as_deref().unwrap_or_default(),
        operation = %request.operation,
        user = request.user_info.username.as_deref().unwrap_or_default(),
        strategy = %settings.strategy,
        "mutating deployment"
    );

    let operations = match settings.strategy {
        PatchStrategy::Overwrite => overwrite(settings)?,
        PatchStrategy::Merge => merge(settings, pod_spec(&deployment))?,
    };
    Ok(operations)
}

/// Read the object into the typed Deployment shape, whatever group and
/// version it was sent as: only the fields matter, not the type metadata.
fn decode_deployment(object: &serde_json::Value) -> Result<Deployment, DecodeError> {
    let mut object = object.clone();
    if let Some(fields) = object.as_object_mut() {
        fields.insert(
            "apiVersion".to_owned(),
            serde_json::Value::from(<Deployment as Resource>::API_VERSION),
        );
        fields.insert(
            "kind".to_owned(),
            serde_json::Value::from(<Deployment as Resource>::KIND),
        );
    }

    Deployment::deserialize(object).map_err(|source| DecodeError::MalformedObject {
        kind: KIND.to_owned(),
        source,
    })
}

fn pod_spec(deployment: &Deployment) -> Option<&PodSpec> {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
}

// "add" replaces whatever is already at the path: existing node selectors and
// tolerations are dropped.
fn overwrite(settings: &MutationSettings) -> Result<Vec<PatchOperation>, EncodeError> {
    Ok(vec![
        add(node_selector_path(), &node_selector(settings))?,
        add(tolerations_path(), &vec![toleration(settings)])?,
    ])
}

fn merge(
    settings: &MutationSettings,
    pod_spec: Option<&PodSpec>,
) -> Result<Vec<PatchOperation>, EncodeError> {
    let mut operations = Vec::new();

    match pod_spec.and_then(|spec| spec.node_selector.as_ref()) {
        None => operations.push(add(node_selector_path(), &node_selector(settings))?),
        Some(selector) => match selector.get(&settings.node_selector_key) {
            None => operations.push(add(
                node_selector_entry_path(settings),
                &settings.node_selector_value,
            )?),
            Some(value) if *value != settings.node_selector_value => operations.push(replace(
                node_selector_entry_path(settings),
                &settings.node_selector_value,
            )?),
            Some(_) => {}
        },
    }

    let toleration = toleration(settings);
    match pod_spec.and_then(|spec| spec.tolerations.as_ref()) {
        None => operations.push(add(tolerations_path(), &vec![toleration])?),
        Some(tolerations) if !tolerations.contains(&toleration) => {
            operations.push(add(tolerations_append_path(), &toleration)?)
        }
        Some(_) => {}
    }

    Ok(operations)
}

fn node_selector(settings: &MutationSettings) -> BTreeMap<String, String> {
    BTreeMap::from([(
        settings.node_selector_key.clone(),
        settings.node_selector_value.clone(),
    )])
}

fn toleration(settings: &MutationSettings) -> Toleration {
    Toleration {
        key: Some(settings.toleration_key.clone()),
        operator: Some(TOLERATION_OPERATOR_EQUAL.to_owned()),
        value: Some(settings.toleration_value.clone()),
        effect: Some(TAINT_EFFECT_NO_SCHEDULE.to_owned()),
        ..Default::default()
    }
}

fn add<T: Serialize>(path: PointerBuf, value: &T) -> Result<PatchOperation, EncodeError> {
    let value = patch_value(&path, value)?;
    Ok(PatchOperation::Add(AddOperation { path, value }))
}

fn replace<T: Serialize>(path: PointerBuf, value: &T) -> Result<PatchOperation, EncodeError> {
    let value = patch_value(&path, value)?;
    Ok(PatchOperation::Replace(ReplaceOperation { path, value }))
}

fn node_selector_path() -> PointerBuf {
    PointerBuf::from_tokens(["spec", "template", "spec", "nodeSelector"])
}

fn node_selector_entry_path(settings: &MutationSettings) -> PointerBuf {
    PointerBuf::from_tokens([
        "spec",
        "template",
        "spec",
        "nodeSelector",
        settings.node_selector_key.as_str(),
    ])
}

fn tolerations_path() -> PointerBuf {
    PointerBuf::from_tokens(["spec", "template", "spec", "tolerations"])
}

fn tolerations_append_path() -> PointerBuf {
    PointerBuf::from_tokens(["spec", "template", "spec", "tolerations", "-"])
}
