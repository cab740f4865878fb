use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info, warn};

use crate::config::SmtpConfig;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .context("configure SMTP relay")?
            .credentials(creds)
            .build();
        Ok(Self {
            transport,
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.sender.parse().context("parse sender address")?)
            .to(message.to.parse().context("parse recipient address")?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("build email")?;
        self.transport.send(email).await.context("send email")?;
        Ok(())
    }
}

/// Logs instead of sending. Selected when SMTP credentials are absent so
/// local setups keep working without a relay.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email delivery skipped (no SMTP configured)"
        );
        Ok(())
    }
}

/// Fire-and-forget delivery: the outcome is consumed only by the log.
pub fn send_best_effort(mailer: Arc<dyn Mailer>, timeout: Duration, message: EmailMessage) {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, mailer.send(&message)).await {
            Ok(Ok(())) => debug!(to = %message.to, subject = %message.subject, "email sent"),
            Ok(Err(e)) => warn!(error = %e, to = %message.to, "email delivery failed"),
            Err(_) => warn!(to = %message.to, "email delivery timed out"),
        }
    });
}

pub fn welcome_email(to: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_owned(),
        subject: "Welcome".into(),
        body: format!("Welcome! Your account has been created with email ID: {to}"),
    }
}

pub fn verify_otp_email(to: &str, otp: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_owned(),
        subject: "Account Verification OTP".into(),
        body: format!("Your OTP is {otp}. Verify your account using this OTP."),
    }
}

pub fn reset_otp_email(to: &str, otp: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_owned(),
        subject: "Password Reset OTP".into(),
        body: format!(
            "Your OTP for resetting your password is {otp}. \
             Use this OTP to proceed with resetting your password."
        ),
    }
}
