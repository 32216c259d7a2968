use tracing::{debug, warn};

use crate::{
    admission_review::{AdmissionReviewResponse, ReviewVersion},
    assembler,
    decoder::{self, DecodeFailure, DecodedReview},
    errors::DecodeError,
    mutation, patch,
    settings::{FailurePolicy, MutationSettings},
};

/// Everything the review pipeline needs, built once at startup and shared
/// read-only by all the requests.
#[derive(Clone, Debug, Default)]
pub struct ReviewContext {
    settings: MutationSettings,
    failure_policy: FailurePolicy,
}

impl ReviewContext {
    pub fn new(settings: MutationSettings, failure_policy: FailurePolicy) -> Self {
        ReviewContext {
            settings,
            failure_policy,
        }
    }

    pub fn settings(&self) -> &MutationSettings {
        &self.settings
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Run a webhook call through the whole pipeline: decode, mutate, encode
    /// and assemble.
    ///
    /// Failures that happen once the uid is known are turned into a response
    /// shaped by the failure policy. The error is returned only when the body
    /// did not even carry a readable uid, there is nothing to answer to then.
    pub fn review(
        &self,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<AdmissionReviewResponse, DecodeError> {
        let DecodedReview {
            api_version,
            request,
        } = match decoder::decode_review(content_type, body) {
            Ok(decoded) => decoded,
            Err(DecodeFailure {
                uid: Some(uid),
                api_version,
                error,
            }) => {
                warn!(uid = uid.as_str(), error = %error, "cannot decode admission review");
                return Ok(self.failure(api_version.unwrap_or_default(), &uid, &error));
            }
            Err(DecodeFailure { error, .. }) => return Err(error),
        };

        let outcome = mutation::mutate(&self.settings, &request).and_then(|mutation| {
            let patch = patch::encode(mutation.operations)?;
            Ok((mutation.verdict, patch))
        });

        match outcome {
            Ok((verdict, patch)) => {
                debug!(
                    uid = request.uid.as_str(),
                    allowed = verdict.is_allowed(),
                    mutated = patch.is_some(),
                    "admission review processed"
                );
                Ok(assembler::assemble(api_version, &request.uid, verdict, patch))
            }
            Err(error) => {
                warn!(
                    uid = request.uid.as_str(),
                    kind = %request.kind,
                    error = %error,
                    "cannot mutate object"
                );
                Ok(self.failure(api_version, &request.uid, &error))
            }
        }
    }

    fn failure(
        &self,
        api_version: ReviewVersion,
        uid: &str,
        error: &dyn std::error::Error,
    ) -> AdmissionReviewResponse {
        assembler::assemble_failure(api_version, uid, self.failure_policy, error.to_string())
    }
}
