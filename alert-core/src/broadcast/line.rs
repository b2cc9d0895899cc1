use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Broadcaster;

pub const DEFAULT_BASE_URL: &str = "https://api.line.me";

/// Environment variable holding the LINE channel access token.
pub const TOKEN_ENV_VAR: &str = "LINE_CHANNEL_ACCESS_TOKEN";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// LINE Messaging API broadcast client: pushes a text message to every
/// follower of the channel identified by the access token.
#[derive(Debug, Clone)]
pub struct LineBroadcaster {
    base_url: String,
    token: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct LineMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BroadcastBody<'a> {
    messages: Vec<LineMessage<'a>>,
}

impl LineBroadcaster {
    pub fn new(token: String) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), token)
    }

    /// Like [`new`](Self::new) with an explicit base URL, so tests can point
    /// at a mock server.
    pub fn with_base_url(base_url: String, token: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build broadcast HTTP client")?;

        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    /// Build from the environment, targeting `base_url`. `None` means the
    /// token is unset or blank: sending is disabled, but the rest of the
    /// cycle still runs.
    pub fn from_env(base_url: String) -> Result<Option<Self>> {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => {
                Self::with_base_url(base_url, token).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Broadcaster for LineBroadcaster {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/v2/bot/message/broadcast", self.base_url);
        let body = BroadcastBody {
            messages: vec![LineMessage { kind: "text", text }],
        };

        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to LINE broadcast API")?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .context("Failed to read LINE broadcast response body")?;
            return Err(anyhow!(
                "LINE broadcast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        Ok(())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Walk back to a char boundary so multibyte bodies cannot panic the slice.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
