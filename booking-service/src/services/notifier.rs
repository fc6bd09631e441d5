//! Fire-and-forget notification dispatch.
//!
//! Notifications are a best-effort side effect of an already-committed
//! state change. Dispatch happens on a spawned task after the transaction
//! commits; delivery failures are logged and swallowed, never propagated
//! to the caller or the HTTP response.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A booking event worth telling someone about.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Recipient role (e.g. "manager") or a customer email address.
    pub recipient: String,
    pub event: String,
    pub payload: BTreeMap<String, String>,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), anyhow::Error>;
}

/// SMTP delivery via lettre. Disabled configs build a channel that reports
/// itself unavailable instead of failing startup.
pub struct SmtpChannel {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpChannel {
    pub fn new(config: SmtpConfig) -> Result<Self, anyhow::Error> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP relay: {}", e))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }
}

#[async_trait]
impl NotificationChannel for SmtpChannel {
    async fn send(&self, notification: &Notification) -> Result<(), anyhow::Error> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP channel is not enabled"))?;

        let body = notification
            .payload
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n");

        let message = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(notification.recipient.parse()?)
            .subject(&notification.event)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        transport.send(message).await?;
        Ok(())
    }
}

/// Dispatcher handed to handlers; cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    pub fn smtp(config: SmtpConfig) -> Result<Self, anyhow::Error> {
        Ok(Self::new(Arc::new(SmtpChannel::new(config)?)))
    }

    /// Dispatch after commit. Never blocks the request, never fails it.
    pub fn dispatch(&self, notification: Notification) {
        let channel = self.channel.clone();
        tokio::spawn(async move {
            match channel.send(&notification).await {
                Ok(()) => {
                    info!(
                        event = %notification.event,
                        recipient = %notification.recipient,
                        "Notification dispatched"
                    );
                }
                Err(e) => {
                    // The state change is already committed; log and move on.
                    warn!(
                        event = %notification.event,
                        recipient = %notification.recipient,
                        error = %e,
                        "Notification dispatch failed"
                    );
                }
            }
        });
    }
}
