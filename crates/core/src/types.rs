use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Click source recorded when a submission carries no attribution tag.
pub const DEFAULT_CLICK_SOURCE: &str = "unknown";

/// Inbound consultation submission as received by the intake endpoint.
///
/// Every field defaults when absent so that incomplete bodies surface as
/// validation failures rather than deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionRequest {
    pub name: String,
    pub contact: String,
    pub privacy_agreed: bool,
    pub click_source: Option<String>,
}

impl SubmissionRequest {
    /// Returns the attribution tag, treating an empty tag as absent.
    pub fn click_source(&self) -> Option<&str> {
        self.click_source
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    /// Returns the tag that will be persisted with the record.
    ///
    /// Note the asymmetry with [`SubmissionRequest::click_source`]: the stored
    /// column falls back to [`DEFAULT_CLICK_SOURCE`], while the notification
    /// payload keeps a missing tag as `null`.
    pub fn persisted_click_source(&self) -> &str {
        self.click_source().unwrap_or(DEFAULT_CLICK_SOURCE)
    }
}

/// Durable consultation row created from an accepted submission.
///
/// `id` and `created_at` are assigned by the database. The record is insert
/// only; `is_completed` is owned by a downstream admin process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub is_completed: bool,
    pub click_source: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_body() {
        let request: SubmissionRequest = serde_json::from_str(
            r#"{"name":"Kim","contact":"010-1234-5678","privacyAgreed":true,"clickSource":"blog"}"#,
        )
        .expect("valid body");

        assert_eq!(request.name, "Kim");
        assert_eq!(request.contact, "010-1234-5678");
        assert!(request.privacy_agreed);
        assert_eq!(request.click_source(), Some("blog"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let request: SubmissionRequest = serde_json::from_str("{}").expect("empty body parses");

        assert!(request.name.is_empty());
        assert!(request.contact.is_empty());
        assert!(!request.privacy_agreed);
        assert!(request.click_source.is_none());
    }

    #[test]
    fn empty_click_source_is_treated_as_absent() {
        let request = SubmissionRequest {
            click_source: Some("  ".to_string()),
            ..SubmissionRequest::default()
        };

        assert_eq!(request.click_source(), None);
        assert_eq!(request.persisted_click_source(), DEFAULT_CLICK_SOURCE);
    }

    #[test]
    fn present_click_source_is_kept_verbatim() {
        let request = SubmissionRequest {
            click_source: Some("spring-campaign".to_string()),
            ..SubmissionRequest::default()
        };

        assert_eq!(request.click_source(), Some("spring-campaign"));
        assert_eq!(request.persisted_click_source(), "spring-campaign");
    }
}
