//! Chat API client used to publish status messages.
//!
//! [`ChatApi`] is the narrow seam the rest of the crate talks to: post a new
//! message, or overwrite an existing one by its timestamp. [`SlackClient`]
//! implements it over the Slack Web API with a blocking HTTP client, so every
//! publish is a synchronous round-trip and failures surface to the caller.
//!
//! Setup:
//! 1. Create a Slack App at https://api.slack.com/apps
//! 2. Add the `chat:write` Bot Token Scope
//! 3. Install the app to the workspace and invite the bot to the channel
//! 4. Use the Bot User OAuth Token (`xoxb-...`)

use crate::attachment::Attachment;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Slack API base URL
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Remote operations needed to publish a message.
pub trait ChatApi: Send + Sync {
    /// Post a new message and return its timestamp (the message id).
    fn create_message(&self, channel: &str, attachments: &[Attachment]) -> Result<String>;

    /// Replace the attachments of the message identified by `ts`.
    fn update_message(&self, channel: &str, ts: &str, attachments: &[Attachment]) -> Result<()>;
}

/// Slack API response envelope
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Slack Web API client
pub struct SlackClient {
    token: String,
    base_url: String,
    http: Client,
}

impl SlackClient {
    /// Create a client against the public Slack API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_options(token, SLACK_API_BASE, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client against a custom base URL (e.g. a proxy or test server).
    pub fn with_options(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call a Slack API method
    fn api_call(&self, method: &str, params: &Value) -> Result<SlackResponse> {
        let url = format!("{}/{}", self.base_url, method);

        let resp: SlackResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(params)
            .send()?
            .error_for_status()?
            .json()?;

        check_response(method, resp)
    }
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ChatApi for SlackClient {
    fn create_message(&self, channel: &str, attachments: &[Attachment]) -> Result<String> {
        let params = post_message_params(channel, attachments);
        let resp = self.api_call("chat.postMessage", &params)?;
        let ts = resp.ts.ok_or(Error::MissingTimestamp)?;
        debug!(channel, ts = %ts, "posted message");
        Ok(ts)
    }

    fn update_message(&self, channel: &str, ts: &str, attachments: &[Attachment]) -> Result<()> {
        let params = update_params(channel, ts, attachments);
        self.api_call("chat.update", &params)?;
        debug!(channel, ts, "updated message");
        Ok(())
    }
}

fn check_response(method: &str, resp: SlackResponse) -> Result<SlackResponse> {
    if !resp.ok {
        return Err(Error::Api {
            method: method.to_string(),
            error: resp.error.unwrap_or_else(|| "unknown".to_string()),
        });
    }
    Ok(resp)
}

/// Request body for `chat.postMessage`.
pub fn post_message_params(channel: &str, attachments: &[Attachment]) -> Value {
    json!({
        "channel": channel,
        "attachments": attachments,
    })
}

/// Request body for `chat.update`.
pub fn update_params(channel: &str, ts: &str, attachments: &[Attachment]) -> Value {
    json!({
        "channel": channel,
        "ts": ts,
        "attachments": attachments,
    })
}
