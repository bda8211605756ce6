// src/delivery.rs
//! Mails finished documents and cleans up ephemeral output.

use crate::config::{Config, MailSettings};
use crate::error::{ReportError, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Hands a finished message to a mail system. Implementations must not retry.
pub trait MailTransport {
    fn send(&self, message: &Message) -> Result<()>;
}

/// SMTP submission through the configured gateway.
///
/// A new connection is opened for every message and closed again once the message is
/// accepted or rejected. With a password the connection is upgraded with STARTTLS and the
/// sender authenticates before the envelope is sent.
pub struct SmtpMailTransport {
    gateway: String,
    port: u16,
    credentials: Option<Credentials>,
}

impl SmtpMailTransport {
    pub fn new(settings: &MailSettings) -> Self {
        Self {
            gateway: settings.gateway.clone(),
            port: settings.port,
            credentials: settings
                .password
                .as_ref()
                .map(|password| Credentials::new(settings.sender.clone(), password.clone())),
        }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let transport = match &self.credentials {
            Some(credentials) => SmtpTransport::starttls_relay(&self.gateway)
                .map_err(|e| ReportError::Delivery(format!("TLS setup for {} failed: {}", self.gateway, e)))?
                .port(self.port)
                .credentials(credentials.clone())
                .build(),
            None => SmtpTransport::builder_dangerous(&self.gateway)
                .port(self.port)
                .build(),
        };
        Ok(transport)
    }
}

impl MailTransport for SmtpMailTransport {
    fn send(&self, message: &Message) -> Result<()> {
        debug!("Connecting to {}:{}", self.gateway, self.port);
        self.transport()?
            .send(message)
            .map(|_| ())
            .map_err(|e| ReportError::Delivery(format!("{}:{}: {}", self.gateway, self.port, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Mail is not configured.
    Skipped,
}

pub struct DeliveryDispatcher {
    mail: MailSettings,
    transport: Option<Box<dyn MailTransport>>,
    ephemeral: bool,
}

impl DeliveryDispatcher {
    /// Uses SMTP when the configuration has complete mail settings.
    pub fn from_config(config: &Config) -> Self {
        let transport = config
            .send_mail()
            .then(|| Box::new(SmtpMailTransport::new(&config.mail)) as Box<dyn MailTransport>);
        Self::with_transport(config, transport)
    }

    /// Uses `transport` instead of SMTP. It is ignored when mail is not configured.
    pub fn with_transport(config: &Config, transport: Option<Box<dyn MailTransport>>) -> Self {
        Self {
            mail: config.mail.clone(),
            transport: transport.filter(|_| config.send_mail()),
            ephemeral: config.is_ephemeral(),
        }
    }

    pub fn sends_mail(&self) -> bool {
        self.transport.is_some()
    }

    /// Sends the document if mail is configured. Ephemeral documents are removed afterwards,
    /// whatever the outcome of the attempt.
    pub fn deliver(&self, document: &Path) -> Result<DeliveryOutcome> {
        let outcome = self.send(document);
        if self.ephemeral {
            remove_document(document);
        }
        outcome
    }

    fn send(&self, document: &Path) -> Result<DeliveryOutcome> {
        let Some(transport) = self.transport.as_deref() else {
            return Ok(DeliveryOutcome::Skipped);
        };
        let message = build_message(&self.mail, document)?;
        transport.send(&message)?;
        info!(
            "Sent {} to {}",
            attachment_name(document),
            self.mail.recipients.join(";")
        );
        Ok(DeliveryOutcome::Sent)
    }
}

/// Builds the multipart message: a plain-text body followed by the PDF attachment.
pub fn build_message(mail: &MailSettings, document: &Path) -> Result<Message> {
    let from = parse_mailbox(&mail.sender)?;
    let mut builder = Message::builder().from(from).subject(mail.subject.clone());
    for recipient in &mail.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    let content = fs::read(document)?;
    let pdf = ContentType::parse("application/pdf")
        .map_err(|e| ReportError::Delivery(e.to_string()))?;
    let name = attachment_name(document);
    debug!(
        "Mail from {} to {} subject {:?} attachment {} ({} bytes)",
        mail.sender,
        mail.recipients.join(";"),
        mail.subject,
        name,
        content.len()
    );

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(mail.body.clone()))
                .singlepart(Attachment::new(name).body(content, pdf)),
        )
        .map_err(|e| ReportError::Delivery(e.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| ReportError::Delivery(format!("invalid address '{}': {}", address, e)))
}

fn attachment_name(document: &Path) -> String {
    document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn remove_document(document: &Path) {
    match fs::remove_file(document) {
        Ok(()) => debug!("Removed {}", document.display()),
        Err(e) => warn!("Could not remove {}: {}", document.display(), e),
    }
}
