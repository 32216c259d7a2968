use std::io::Write;

use crate::{
    admission_response::AdmissionResponse,
    admission_review::{AdmissionReviewResponse, ReviewVersion},
    errors::AssembleError,
    mutation::Verdict,
    patch::EncodedPatch,
    settings::FailurePolicy,
};

/// HTTP code suggested to the API server when a review cannot be processed.
const FAILURE_STATUS_CODE: u16 = 400;

/// Build the response of a review that went through the whole pipeline.
pub fn assemble(
    api_version: ReviewVersion,
    uid: &str,
    verdict: Verdict,
    patch: Option<EncodedPatch>,
) -> AdmissionReviewResponse {
    let response = match verdict {
        Verdict::Allowed => {
            let response = AdmissionResponse::allow(uid.to_owned());
            match patch {
                Some(patch) => response.with_patch(patch),
                None => response,
            }
        }
        Verdict::Denied { reason } => {
            AdmissionResponse::reject(uid.to_owned(), reason, FAILURE_STATUS_CODE)
        }
    };

    AdmissionReviewResponse::new(api_version, response)
}

/// Build the response of a review whose processing was aborted.
///
/// The uid is always echoed and no patch is ever attached, the reason is
/// reported either as the rejection message or as a warning.
pub fn assemble_failure(
    api_version: ReviewVersion,
    uid: &str,
    policy: FailurePolicy,
    reason: String,
) -> AdmissionReviewResponse {
    let response = match policy {
        FailurePolicy::Deny => {
            AdmissionResponse::reject(uid.to_owned(), reason, FAILURE_STATUS_CODE)
        }
        FailurePolicy::Allow => AdmissionResponse::allow(uid.to_owned()).with_warning(reason),
    };

    AdmissionReviewResponse::new(api_version, response)
}

/// Serialize the review and write it to the output, returning the number of
/// bytes written.
pub fn write_review<W: Write>(
    review: &AdmissionReviewResponse,
    mut writer: W,
) -> Result<usize, AssembleError> {
    let body = serde_json::to_vec(review).map_err(AssembleError::Serialize)?;
    writer.write_all(&body).map_err(AssembleError::Write)?;
    writer.flush().map_err(AssembleError::Write)?;

    Ok(body.len())
}
