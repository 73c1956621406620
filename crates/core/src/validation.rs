use thiserror::Error;

use crate::types::SubmissionRequest;

/// Reasons a submission is rejected before any storage interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name and contact are required")]
    MissingContactDetails,
    #[error("privacy agreement is required")]
    ConsentRequired,
}

/// Validates a submission. The field check always runs before the consent
/// check, so a body missing both reports the missing fields.
pub fn validate(request: &SubmissionRequest) -> Result<(), ValidationError> {
    if request.name.trim().is_empty() || request.contact.trim().is_empty() {
        return Err(ValidationError::MissingContactDetails);
    }

    if !request.privacy_agreed {
        return Err(ValidationError::ConsentRequired);
    }

    Ok(())
}
