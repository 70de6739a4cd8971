use crate::client::{ChatApi, SlackClient};
use crate::config::NotifierConfig;
use crate::error::Result;
use crate::task::{Task, TaskOptions};
use std::sync::Arc;
use std::time::Duration;

/// Entry point: a chat API client bound to one channel.
///
/// Cloning is cheap; every [`Message`](crate::Message) keeps its own clone so
/// it can publish without borrowing the notifier. Several notifiers may live
/// in one process, each with its own credential and channel.
#[derive(Clone)]
pub struct Notifier {
    api: Arc<dyn ChatApi>,
    channel: String,
}

impl Notifier {
    /// Bind an API client to `channel` (a Slack channel ID such as `C1234567890`).
    pub fn new(api: impl ChatApi + 'static, channel: impl Into<String>) -> Self {
        Self::with_api(Arc::new(api), channel)
    }

    /// Like [`Notifier::new`], for an already shared client.
    pub fn with_api(api: Arc<dyn ChatApi>, channel: impl Into<String>) -> Self {
        Self {
            api,
            channel: channel.into(),
        }
    }

    /// Slack notifier authenticated with a bot token.
    pub fn slack(token: impl Into<String>, channel: impl Into<String>) -> Result<Self> {
        Ok(Self::new(SlackClient::new(token)?, channel))
    }

    /// Build a Slack notifier from a validated configuration.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        config.validate()?;
        let client = SlackClient::with_options(
            config.token.clone(),
            config.api_base(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(client, config.channel.clone()))
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub(crate) fn api(&self) -> &dyn ChatApi {
        self.api.as_ref()
    }

    /// Create a pending [`Task`] posting to this notifier's channel.
    pub fn task(&self, options: TaskOptions) -> Task {
        Task::new(self.clone(), options)
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
