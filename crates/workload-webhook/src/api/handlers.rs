use axum::{
    body::Bytes,
    extract,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn, Span};
use workload_mutator::{
    admission_response::AdmissionResponse, assembler::write_review, errors::AssembleError,
};

use crate::api::{api_error::ApiError, state::ApiServerState};

#[tracing::instrument(
    name = "mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Review a candidate object and answer with the verdict and the patch to apply.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let review = state
        .review_context
        .review(content_type, &body)
        .map_err(|e| {
            warn!(error = %e, "rejecting unreadable admission review");
            ApiError {
                status: StatusCode::BAD_REQUEST,
                message: e.to_string(),
            }
        })?;

    populate_span_with_review_results(&review.response);

    let mut output = Vec::new();
    write_review(&review, &mut output).map_err(handle_assemble_error)?;

    Ok((
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.essence_str())],
        output,
    )
        .into_response())
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn populate_span_with_review_results(response: &AdmissionResponse) {
    Span::current().record("request_uid", response.uid.as_str());
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.is_mutated());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}

fn handle_assemble_error(error: AssembleError) -> ApiError {
    error!("Cannot send admission review response: {}", error);

    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Something went wrong".to_owned(),
    }
}
