//! Digest delivery by email.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{EmailConfig, Secrets};

/// A rendered digest ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub plain: String,
    pub html: String,
}

impl EmailMessage {
    pub fn new(keyword: &str, run_date: NaiveDate, plain: String, html: String) -> Self {
        Self {
            subject: subject_for(keyword, run_date),
            plain,
            html,
        }
    }
}

pub fn subject_for(keyword: &str, run_date: NaiveDate) -> String {
    format!("GitHub Search Digest: {keyword} ({run_date})")
}

/// Delivers digests somewhere a human will read them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Sends the digest to the configured address over SMTP with implicit TLS.
pub struct SmtpNotifier {
    config: EmailConfig,
    address: String,
    username: String,
    password: String,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig, secrets: &Secrets) -> Self {
        Self {
            config,
            address: secrets.email_address.clone(),
            username: secrets.email_username.clone(),
            password: secrets.email_password.clone(),
        }
    }

    /// The digest goes from and to the same mailbox.
    fn mailbox(&self) -> Result<Mailbox> {
        let address: Address = self
            .address
            .parse()
            .with_context(|| format!("Invalid email address: {}", self.address))?;
        Ok(Mailbox::new(Some(self.username.clone()), address))
    }

    fn build(&self, message: &EmailMessage) -> Result<Message> {
        let mailbox = self.mailbox()?;

        Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(message.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.plain.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )
            .context("Failed to build email message")
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = self.build(message)?;

        let creds = Credentials::new(self.address.clone(), self.password.clone());
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .context("Failed to create SMTP transport")?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build();

        mailer
            .send(email)
            .await
            .context("Failed to send email via SMTP")?;

        tracing::info!(
            to = %self.address,
            subject = message.subject.as_str(),
            "Email sent successfully"
        );

        Ok(())
    }
}
