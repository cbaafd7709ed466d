//! LINE Messaging API push transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::MessagingProvider;
use crate::error::ProviderError;

const PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";
// Push is on the webhook hot path; keep the bound tight.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

/// Messaging capability backed by the LINE push endpoint.
pub struct LinePush {
    client: reqwest::Client,
    channel_token: String,
}

impl LinePush {
    /// Build a sender, or `None` when no channel token is configured.
    pub fn new(channel_token: Option<&str>) -> Option<Self> {
        let channel_token = channel_token?.trim();
        if channel_token.is_empty() {
            return None;
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .ok()?;
        Some(Self {
            client,
            channel_token: channel_token.to_string(),
        })
    }
}

#[async_trait]
impl MessagingProvider for LinePush {
    async fn push(&self, to: &str, text: &str) -> Result<(), ProviderError> {
        let request = PushRequest {
            to,
            messages: vec![TextMessage { kind: "text", text }],
        };

        let resp = self
            .client
            .post(PUSH_URL)
            .bearer_auth(&self.channel_token)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
