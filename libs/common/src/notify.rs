//! Notification and e-mail dispatch
//!
//! In-app notifications are recorded through the notification repository.
//! E-mail goes out through an HTTP mail API when one is configured and is
//! only logged otherwise. Callers treat both as best-effort: a failed
//! delivery is logged and never fails the operation that triggered it.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NewNotification, NotificationKind};
use crate::repositories::NotificationRepository;

/// Delivers in-app notifications to a user
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(
        &self,
        user_id: Uuid,
        message: &str,
        kind: NotificationKind,
        contact_details: Option<&str>,
    ) -> Result<()>;
}

/// Dispatcher that stores notifications for the user to read later
#[derive(Clone)]
pub struct RepositoryDispatcher {
    notifications: Arc<dyn NotificationRepository>,
}

impl RepositoryDispatcher {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl NotificationDispatcher for RepositoryDispatcher {
    async fn send(
        &self,
        user_id: Uuid,
        message: &str,
        kind: NotificationKind,
        contact_details: Option<&str>,
    ) -> Result<()> {
        self.notifications
            .record(&NewNotification {
                user_id,
                message: message.to_string(),
                kind,
                contact_details: contact_details.map(str::to_string),
            })
            .await?;
        Ok(())
    }
}

/// Sends e-mail
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Configuration for the HTTP mail API
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl EmailConfig {
    /// Create an EmailConfig from environment variables
    ///
    /// Returns `None` when `EMAIL_API_URL` is not set.
    ///
    /// # Environment Variables
    /// - `EMAIL_API_URL`: Endpoint accepting `POST {from, to, subject, text}`
    /// - `EMAIL_API_KEY`: Bearer token for the endpoint (default: empty)
    /// - `EMAIL_FROM`: Sender address (default: "no-reply@marketplace.local")
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("EMAIL_API_URL").ok()?;
        let api_key = std::env::var("EMAIL_API_KEY").unwrap_or_default();
        let from = std::env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "no-reply@marketplace.local".to_string());

        Some(EmailConfig {
            api_url,
            api_key,
            from,
        })
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// E-mail sender posting to an HTTP mail API
#[derive(Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    config: EmailConfig,
}

impl HttpEmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&EmailPayload {
                from: &self.config.from,
                to,
                subject,
                text: body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Mail API responded with {}", response.status());
        }

        info!("Sent e-mail '{}' to {}", subject, to);
        Ok(())
    }
}

/// E-mail sender that only logs
#[derive(Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!("E-mail delivery disabled; would send '{}' to {}", subject, to);
        Ok(())
    }
}

/// A message captured by [`MemoryEmailSender`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// E-mail sender that keeps messages in memory
#[derive(Clone, Default)]
pub struct MemoryEmailSender {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Pick the HTTP sender when configured, the logging one otherwise
pub fn email_sender_from_env() -> Arc<dyn EmailSender> {
    match EmailConfig::from_env() {
        Some(config) => {
            info!("E-mail delivery via {}", config.api_url);
            Arc::new(HttpEmailSender::new(config))
        }
        None => Arc::new(LogEmailSender),
    }
}

/// Send a notification, logging instead of failing
pub async fn notify_best_effort(
    dispatcher: &dyn NotificationDispatcher,
    user_id: Uuid,
    message: &str,
    kind: NotificationKind,
    contact_details: Option<&str>,
) {
    if let Err(e) = dispatcher
        .send(user_id, message, kind, contact_details)
        .await
    {
        warn!("Failed to notify user {}: {}", user_id, e);
    }
}

/// Send an e-mail, logging instead of failing
pub async fn email_best_effort(sender: &dyn EmailSender, to: &str, subject: &str, body: &str) {
    if let Err(e) = sender.send(to, subject, body).await {
        warn!("Failed to e-mail {}: {}", to, e);
    }
}
