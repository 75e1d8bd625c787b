//! Completion notifications posted to a chat webhook.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

/// Sender name shown by the chat service.
pub const WEBHOOK_USERNAME: &str = "transcriber-bot";

/// Default request timeout for webhook posts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON body posted to the webhook.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct WebhookPayload<'a> {
    pub username: &'a str,
    pub text: &'a str,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            username: WEBHOOK_USERNAME,
            text,
        }
    }
}

/// Delivers a status message to an endpoint.
pub trait Notifier {
    fn send(&self, url: &str, message: &str) -> Result<()>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn send(&self, url: &str, message: &str) -> Result<()> {
        (**self).send(url, message)
    }
}

/// [`Notifier`] that posts a [`WebhookPayload`] with a blocking HTTP client.
///
/// Exactly one request per message; nothing is retried. The client is built when a message is
/// sent, so a broken TLS or header setup surfaces as a notification failure instead of keeping
/// the other stages from running.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    timeout: Duration,
    user_agent: String,
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }

    /// Override the `User-Agent` header (defaults to `transcribe-srt/<version>`).
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn client(&self) -> anyhow::Result<Client> {
        Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()
            .context("failed to build HTTP client")
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, url: &str, message: &str) -> Result<()> {
        let client = self.client().map_err(Error::notification)?;

        client
            .post(url)
            .json(&WebhookPayload::new(message))
            .send()
            .with_context(|| format!("request failed: {url}"))
            .and_then(|resp| {
                resp.error_for_status()
                    .with_context(|| format!("webhook rejected the message: {url}"))
            })
            .map_err(Error::notification)?;

        Ok(())
    }
}

/// Send `message` through `notifier` and log the outcome on success.
///
/// An empty `url` is still attempted; it fails as an invalid URL.
pub fn notify(notifier: &dyn Notifier, url: &str, message: &str) -> Result<()> {
    notifier.send(url, message)?;
    info!("Message sent to webhook successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_fixed_username() -> anyhow::Result<()> {
        let json = serde_json::to_value(WebhookPayload::new("done"))?;
        assert_eq!(
            json,
            serde_json::json!({ "username": "transcriber-bot", "text": "done" })
        );
        Ok(())
    }

    #[test]
    fn empty_url_is_attempted_and_fails() {
        let err = notify(&WebhookNotifier::new(), "", "hello").unwrap_err();
        assert!(matches!(err, Error::Notification(_)));
    }

    #[test]
    fn client_setup_failure_is_a_notification_error() {
        let notifier = WebhookNotifier::new().user_agent("bad\nagent");

        let err = notifier.send("http://127.0.0.1:9/hook", "done").unwrap_err();

        assert!(matches!(err, Error::Notification(_)));
        assert!(err.to_string().contains("failed to build HTTP client"));
    }
}
