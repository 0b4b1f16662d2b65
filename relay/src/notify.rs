//! Operator notification channel.
//!
//! Notifications are fire-and-forget from the caller's point of view: the
//! validator logs a failure and moves on.

use std::time::Duration;

use crate::NotifyError;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// `GET {hook}{message}`, the shape accepted by IFTTT-style webhook URLs.
pub struct WebhookNotifier {
    http_client: reqwest::Client,
    hook: String,
}

impl WebhookNotifier {
    pub fn new(hook: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self {
            http_client,
            hook: hook.into(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}{}", self.hook, message);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Used when no hook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

#[async_trait::async_trait]
impl Notifier for SilentNotifier {
    async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
