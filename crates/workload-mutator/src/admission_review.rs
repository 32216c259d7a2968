use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse,
    errors::DecodeError,
};

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// The versions of the admission.k8s.io API this webhook speaks.
/// The response always uses the version of the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewVersion {
    #[default]
    #[serde(rename = "admission.k8s.io/v1")]
    V1,
    #[serde(rename = "admission.k8s.io/v1beta1")]
    V1Beta1,
}

impl ReviewVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewVersion::V1 => "admission.k8s.io/v1",
            ReviewVersion::V1Beta1 => "admission.k8s.io/v1beta1",
        }
    }
}

impl FromStr for ReviewVersion {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admission.k8s.io/v1" => Ok(ReviewVersion::V1),
            "admission.k8s.io/v1beta1" => Ok(ReviewVersion::V1Beta1),
            other => Err(DecodeError::UnsupportedVersion(other.to_owned())),
        }
    }
}

impl fmt::Display for ReviewVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    pub api_version: ReviewVersion,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: ReviewVersion,
    pub kind: String,
    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    pub fn new(api_version: ReviewVersion, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version,
            kind: ADMISSION_REVIEW_KIND.to_owned(),
            response,
        }
    }
}
