use tracing::debug;

use crate::{
    admission_request::AdmissionRequest,
    admission_review::{ADMISSION_REVIEW_KIND, AdmissionReviewRequest, ReviewVersion},
    errors::DecodeError,
};

/// A review that passed every decoding check.
#[derive(Clone, Debug)]
pub struct DecodedReview {
    pub api_version: ReviewVersion,
    pub request: AdmissionRequest,
}

/// A review that could not be decoded.
///
/// `uid` holds the correlation identifier when it could be read from the body
/// despite the failure; it is `None` when nothing could be salvaged.
#[derive(Debug)]
pub struct DecodeFailure {
    pub uid: Option<String>,
    pub api_version: Option<ReviewVersion>,
    pub error: DecodeError,
}

impl DecodeFailure {
    fn unattributed(error: DecodeError) -> Self {
        DecodeFailure {
            uid: None,
            api_version: None,
            error,
        }
    }
}

/// Decode the body of an admission webhook call.
///
/// Nothing is returned on failure but the error and the salvaged identifiers:
/// callers never get a partially populated request.
pub fn decode_review(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<DecodedReview, DecodeFailure> {
    let content_type_check = check_content_type(content_type);

    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            let error = match content_type_check {
                Err(error) => error,
                Ok(()) => DecodeError::MalformedBody(e),
            };
            return Err(DecodeFailure::unattributed(error));
        }
    };

    // Read before any check, so that failures can still be answered to the
    // caller in its own version.
    let uid = value
        .pointer("/request/uid")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);
    let raw_api_version = value
        .get("apiVersion")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    let salvaged_version = raw_api_version.parse::<ReviewVersion>().ok();
    let failure = |api_version: Option<ReviewVersion>, error: DecodeError| DecodeFailure {
        uid: uid.clone(),
        api_version,
        error,
    };

    content_type_check.map_err(|e| failure(salvaged_version, e))?;

    let kind = value
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if kind != ADMISSION_REVIEW_KIND {
        return Err(failure(
            salvaged_version,
            DecodeError::UnsupportedKind(kind.to_owned()),
        ));
    }

    let api_version: ReviewVersion = raw_api_version.parse().map_err(|e| failure(None, e))?;

    let review: AdmissionReviewRequest = serde_json::from_value(value)
        .map_err(|e| failure(Some(api_version), DecodeError::MalformedBody(e)))?;

    let request = review
        .request
        .ok_or_else(|| failure(Some(api_version), DecodeError::MissingRequest))?;

    debug!(
        uid = request.uid.as_str(),
        api_version = api_version.as_str(),
        "admission review decoded"
    );

    Ok(DecodedReview {
        api_version,
        request,
    })
}

// A missing content type is accepted, the API server always sends JSON.
fn check_content_type(content_type: Option<&str>) -> Result<(), DecodeError> {
    let Some(content_type) = content_type else {
        return Ok(());
    };

    match content_type.parse::<mime::Mime>() {
        Ok(media_type) if media_type.essence_str() == mime::APPLICATION_JSON.essence_str() => {
            Ok(())
        }
        _ => Err(DecodeError::UnsupportedContentType(content_type.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission_request::Operation;
    use rstest::rstest;
    use serde_json::json;

    fn review(api_version: &str) -> serde_json::Value {
        json!({
            "apiVersion": api_version,
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "apps", "version": "v1", "kind": "Deployment"},
                "resource": {"group": "apps", "version": "v1", "resource": "deployments"},
                "name": "web",
                "namespace": "default",
                "operation": "CREATE",
                "userInfo": {
                    "username": "admin",
                    "uid": "014fbff9a07c",
                    "groups": ["system:authenticated"]
                },
                "object": {
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "metadata": {"name": "web", "namespace": "default"}
                },
                "dryRun": false
            }
        })
    }

    #[rstest]
    #[case::v1("admission.k8s.io/v1", ReviewVersion::V1)]
    #[case::v1beta1("admission.k8s.io/v1beta1", ReviewVersion::V1Beta1)]
    fn decode_supported_versions(#[case] api_version: &str, #[case] expected: ReviewVersion) {
        let body = serde_json::to_vec(&review(api_version)).unwrap();

        let decoded = decode_review(Some("application/json"), &body).unwrap();
        assert_eq!(decoded.api_version, expected);
        assert_eq!(decoded.request.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(decoded.request.kind.kind, "Deployment");
        assert_eq!(decoded.request.namespace.as_deref(), Some("default"));
        assert_eq!(decoded.request.name.as_deref(), Some("web"));
        assert_eq!(decoded.request.operation, Operation::Create);
        assert_eq!(decoded.request.user_info.username.as_deref(), Some("admin"));
        assert!(decoded.request.object.is_some());
    }

    #[test]
    fn encoding_a_decoded_review_gives_back_the_original() {
        let original = review("admission.k8s.io/v1");
        let body = serde_json::to_vec(&original).unwrap();

        let decoded = decode_review(None, &body).unwrap();
        let envelope = AdmissionReviewRequest {
            api_version: decoded.api_version,
            kind: ADMISSION_REVIEW_KIND.to_owned(),
            request: Some(decoded.request),
        };

        assert_eq!(serde_json::to_value(&envelope).unwrap(), original);
    }

    #[rstest]
    #[case::charset("application/json; charset=utf-8")]
    #[case::uppercase("Application/JSON")]
    fn json_content_type_variants_are_accepted(#[case] content_type: &str) {
        let body = serde_json::to_vec(&review("admission.k8s.io/v1")).unwrap();
        assert!(decode_review(Some(content_type), &body).is_ok());
    }

    #[test]
    fn other_content_types_are_rejected() {
        let body = serde_json::to_vec(&review("admission.k8s.io/v1")).unwrap();

        let failure = decode_review(Some("application/yaml"), &body).unwrap_err();
        assert!(matches!(
            failure.error,
            DecodeError::UnsupportedContentType(_)
        ));
        assert_eq!(
            failure.uid.as_deref(),
            Some("705ab4f5-6393-11e8-b7cc-42010a800002")
        );
        assert_eq!(failure.api_version, Some(ReviewVersion::V1));
    }

    #[rstest]
    #[case::not_json(b"not json at all".as_slice())]
    #[case::no_request(br#"{"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview"}"#.as_slice())]
    fn content_type_error_without_uid(#[case] body: &[u8]) {
        let failure = decode_review(Some("text/plain"), body).unwrap_err();

        assert!(matches!(
            failure.error,
            DecodeError::UnsupportedContentType(ref c) if c == "text/plain"
        ));
        assert_eq!(failure.uid, None);
    }

    #[test]
    fn non_json_body_has_no_uid() {
        let failure = decode_review(Some("application/json"), b"not json at all").unwrap_err();

        assert!(matches!(failure.error, DecodeError::MalformedBody(_)));
        assert_eq!(failure.uid, None);
        assert_eq!(failure.api_version, None);
    }

    #[test]
    fn unsupported_version_keeps_the_uid() {
        let body = serde_json::to_vec(&review("admission.k8s.io/v2")).unwrap();

        let failure = decode_review(None, &body).unwrap_err();
        assert!(
            matches!(failure.error, DecodeError::UnsupportedVersion(ref v) if v == "admission.k8s.io/v2")
        );
        assert_eq!(
            failure.uid.as_deref(),
            Some("705ab4f5-6393-11e8-b7cc-42010a800002")
        );
    }

    #[test]
    fn missing_version_is_unsupported() {
        let mut value = review("admission.k8s.io/v1");
        value.as_object_mut().unwrap().remove("apiVersion");
        let body = serde_json::to_vec(&value).unwrap();

        let failure = decode_review(None, &body).unwrap_err();
        assert!(matches!(failure.error, DecodeError::UnsupportedVersion(ref v) if v.is_empty()));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let mut value = review("admission.k8s.io/v1");
        value["kind"] = json!("ConversionReview");
        let body = serde_json::to_vec(&value).unwrap();

        let failure = decode_review(None, &body).unwrap_err();
        assert!(matches!(failure.error, DecodeError::UnsupportedKind(ref k) if k == "ConversionReview"));
        assert_eq!(failure.api_version, Some(ReviewVersion::V1));
    }

    #[test]
    fn wrong_kind_keeps_the_caller_version() {
        let mut value = review("admission.k8s.io/v1beta1");
        value["kind"] = json!("ConversionReview");
        let body = serde_json::to_vec(&value).unwrap();

        let failure = decode_review(None, &body).unwrap_err();
        assert!(matches!(failure.error, DecodeError::UnsupportedKind(_)));
        assert_eq!(failure.api_version, Some(ReviewVersion::V1Beta1));
        assert_eq!(
            failure.uid.as_deref(),
            Some("705ab4f5-6393-11e8-b7cc-42010a800002")
        );
    }

    #[test]
    fn missing_request_is_rejected() {
        let body = serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
        }))
        .unwrap();

        let failure = decode_review(None, &body).unwrap_err();
        assert!(matches!(failure.error, DecodeError::MissingRequest));
        assert_eq!(failure.uid, None);
        assert_eq!(failure.api_version, Some(ReviewVersion::V1));
    }

    #[test]
    fn invalid_request_shape_keeps_the_uid() {
        let mut value = review("admission.k8s.io/v1");
        value["request"]["operation"] = json!("EXPLODE");
        let body = serde_json::to_vec(&value).unwrap();

        let failure = decode_review(None, &body).unwrap_err();
        assert!(matches!(failure.error, DecodeError::MalformedBody(_)));
        assert_eq!(
            failure.uid.as_deref(),
            Some("705ab4f5-6393-11e8-b7cc-42010a800002")
        );
        assert_eq!(failure.api_version, Some(ReviewVersion::V1));
    }
}
