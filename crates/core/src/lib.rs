pub mod types;
pub mod validation;

pub use types::{ConsultationRecord, SubmissionRequest, DEFAULT_CLICK_SOURCE};
pub use validation::{validate, ValidationError};
