use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("cannot decode admission review: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("unsupported review kind \"{0}\", expected AdmissionReview")]
    UnsupportedKind(String),

    #[error("unsupported admission review version \"{0}\"")]
    UnsupportedVersion(String),

    #[error("admission review does not contain a request")]
    MissingRequest,

    #[error("cannot decode {kind} object: {source}")]
    MalformedObject {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot serialize value of patch operation at {path}: {source}")]
    Value {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize JSON patch: {0}")]
    Document(#[source] serde_json::Error),
}

/// Failures of the mutation stage, before any response has been built.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("cannot serialize admission review response: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("cannot write admission review response: {0}")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown {kind} \"{value}\"")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}
