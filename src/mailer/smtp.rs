//! SMTP mailer built on lettre
//!
//! - Fetches the artifact bytes from the resolved access URL with reqwest
//! - Sends `multipart/mixed`: plain-text body plus the PDF attachment
//! - Uses implicit TLS or STARTTLS depending on [`SmtpConfig::use_tls`]

use super::traits::{DeliveryReport, Mailer, OutgoingEmail};
use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MessageBuilder, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Mailer sending through an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    http: reqwest::Client,
}

impl SmtpMailer {
    /// Create a mailer from SMTP settings
    ///
    /// No connection is opened here; lettre connects on first send.
    pub fn new(config: &SmtpConfig, attachment_timeout: Duration) -> Result<Self> {
        let from: Mailbox = match &config.from_name {
            Some(name) => format!("{} <{}>", name, config.from_address),
            None => config.from_address.clone(),
        }
        .parse()
        .map_err(|e| Error::Mail(format!("invalid from address: {}", e)))?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| Error::Mail(format!("SMTP relay error: {}", e)))?
        .port(config.port);

        let transport = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => builder
                .credentials(SmtpCredentials::new(user.clone(), pass.clone()))
                .build(),
            _ => builder.build(),
        };

        let http = reqwest::Client::builder()
            .timeout(attachment_timeout)
            .build()?;

        Ok(Self {
            transport,
            from,
            http,
        })
    }

    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("attachment download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "attachment download returned status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("attachment download failed: {}", e)))?;
        Ok(bytes.to_vec())
    }

    /// Build the RFC 5322 message
    pub(crate) fn build_message(&self, email: &OutgoingEmail, pdf: Vec<u8>) -> Result<Message> {
        let mut builder = MessageBuilder::new()
            .from(self.from.clone())
            .subject(&email.subject);

        for addr in &email.to {
            let mailbox: Mailbox = addr
                .parse()
                .map_err(|e| Error::Mail(format!("invalid to address '{}': {}", addr, e)))?;
            builder = builder.to(mailbox);
        }

        for addr in &email.cc {
            let mailbox: Mailbox = addr
                .parse()
                .map_err(|e| Error::Mail(format!("invalid cc address '{}': {}", addr, e)))?;
            builder = builder.cc(mailbox);
        }

        let content_type = ContentType::parse("application/pdf")
            .map_err(|e| Error::Mail(format!("invalid content type: {}", e)))?;
        let attachment =
            Attachment::new(email.attachment.file_name.clone()).body(pdf, content_type);

        let body = MultiPart::mixed()
            .singlepart(SinglePart::plain(email.body.clone()))
            .singlepart(attachment);

        builder
            .multipart(body)
            .map_err(|e| Error::Mail(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<DeliveryReport> {
        let pdf = match self.fetch_attachment(&email.attachment.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(student_id = %email.student_id, error = %e, "could not fetch attachment");
                return Ok(DeliveryReport::failed(e.to_string()));
            }
        };

        let message = self.build_message(&email, pdf)?;

        match self.transport.send(message).await {
            Ok(response) => {
                tracing::debug!(
                    student_id = %email.student_id,
                    code = %response.code(),
                    "email accepted by SMTP server"
                );
                Ok(DeliveryReport::sent())
            }
            Err(e) => {
                tracing::warn!(student_id = %email.student_id, error = %e, "SMTP send failed");
                Ok(DeliveryReport::failed(format!("SMTP send failed: {}", e)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
