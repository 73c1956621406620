use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Client for the HTTP mail relay used to announce new consultations.
#[derive(Clone)]
pub struct MailRelayClient {
    http: Client,
    base_url: Url,
    api_token: String,
    sender: String,
    notify_to: String,
}

impl MailRelayClient {
    /// Creates a new relay client with the provided configuration.
    pub fn new(
        base_url: Url,
        api_token: impl Into<String>,
        sender: impl Into<String>,
        notify_to: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            http,
            base_url,
            api_token: api_token.into(),
            sender: sender.into(),
            notify_to: notify_to.into(),
        }
    }

    /// Posts a consultation notification to the relay and returns its receipt.
    pub async fn send_consultation(
        &self,
        message: &ConsultationMessage,
    ) -> Result<MailReceipt, MailerError> {
        let url = self.base_url.join("messages")?;

        let body = RelaySendRequest {
            from: &self.sender,
            to: &self.notify_to,
            subject: format!("New consultation request from {}", message.name),
            text: message.render_text(),
            click_source: message.click_source.as_deref(),
        };

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await?;

        let receipt: RelaySendResponse = parse_json(response).await?;
        Ok(MailReceipt {
            message_id: receipt.id,
        })
    }
}

/// Notification payload derived from a just-written consultation.
///
/// `click_source` stays `None` when the submission carried no tag; unlike the
/// persisted column it is never defaulted, so the relay can tell "no tag"
/// apart from "tag unknown".
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultationMessage {
    pub name: String,
    pub contact: String,
    pub click_source: Option<String>,
}

impl ConsultationMessage {
    fn render_text(&self) -> String {
        format!(
            "Name: {}\nContact: {}\nClick source: {}\n",
            self.name,
            self.contact,
            self.click_source.as_deref().unwrap_or("-"),
        )
    }
}

/// Acknowledgement returned by the relay for an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub struct MailReceipt {
    pub message_id: String,
}

#[derive(Serialize)]
struct RelaySendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
    click_source: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RelaySendResponse {
    id: String,
}

/// Errors produced by the mail relay client.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

async fn parse_json<T>(response: Response) -> Result<T, MailerError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(MailerError::Status { status, body });
    }

    Ok(response.json().await?)
}
