use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::patch::EncodedPatch;

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
///
/// `patch` and `patch_type` can only be set together, through
/// [`AdmissionResponse::with_patch`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    patch_type: Option<PatchType>,

    /// The base64 encoded patch body, a JSONPatch document (RFC 6902).
    #[serde(skip_serializing_if = "Option::is_none")]
    patch: Option<String>,

    /// Status contains extra details into why an admission request was denied.
    /// This field IS NOT consulted in any way if "Allowed" is "true".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,

    /// warnings is a list of warning messages to return to the requesting API client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl AdmissionResponse {
    pub fn allow(uid: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            ..Default::default()
        }
    }

    pub fn reject(uid: String, message: String, code: u16) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(message),
                code: Some(code),
            }),
            ..Default::default()
        }
    }

    pub fn with_patch(self, patch: EncodedPatch) -> AdmissionResponse {
        AdmissionResponse {
            patch_type: Some(patch.patch_type()),
            patch: Some(general_purpose::STANDARD.encode(patch.document())),
            ..self
        }
    }

    pub fn with_warning(mut self, warning: String) -> AdmissionResponse {
        self.warnings.get_or_insert_with(Vec::new).push(warning);
        self
    }

    /// The base64 encoded JSONPatch, if the object has been mutated
    pub fn patch(&self) -> Option<&str> {
        self.patch.as_deref()
    }

    pub fn patch_type(&self) -> Option<PatchType> {
        self.patch_type
    }

    pub fn is_mutated(&self) -> bool {
        self.patch.is_some()
    }
}
