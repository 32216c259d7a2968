pub mod admission_request;
pub mod admission_response;
pub mod admission_review;
pub mod assembler;
pub mod context;
pub mod decoder;
pub mod errors;
pub mod mutation;
pub mod patch;
pub mod settings;

pub use context::ReviewContext;
