//! Outbound alert transports.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

/// Confirmation that a transport accepted a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub recipient: String,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("could not build message: {0}")]
    Message(String),
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Anything that can carry an alert to a recipient
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn sink_name(&self) -> &'static str;

    async fn dispatch(&self, recipient: &str, subject: &str, body: &str)
        -> Result<Sent, DeliveryError>;
}

fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// SMTP delivery over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        let from = mailbox(&config.from)?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl NotificationSink for SmtpMailer {
    fn sink_name(&self) -> &'static str {
        "smtp"
    }

    async fn dispatch(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<Sent, DeliveryError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mailbox(recipient)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Sent {
            recipient: recipient.to_string(),
        })
    }
}

/// Writes alerts to the log instead of sending them. Used when no SMTP host is configured.
pub struct LogMailer;

#[async_trait]
impl NotificationSink for LogMailer {
    fn sink_name(&self) -> &'static str {
        "log"
    }

    async fn dispatch(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<Sent, DeliveryError> {
        mailbox(recipient)?;
        info!(%recipient, %subject, "alert (log delivery)\n{}", body);
        Ok(Sent {
            recipient: recipient.to_string(),
        })
    }
}
