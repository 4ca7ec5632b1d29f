//! Outgoing mail.
//!
//! Registration hands a rendered message to whichever `Mailer` the process was
//! configured with. Delivery is attempted once; failures go back to the caller.

mod smtp;
mod templates;

pub use templates::ActivationEmail;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{MailBackend, MailConfig};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to send mail: {0}")]
    SendFailed(String),

    #[error("Invalid mail configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Writes mail to the log instead of delivering it.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "\n{}",
            mail.body
        );
        Ok(())
    }
}

pub fn create_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.backend {
        MailBackend::Console => Ok(Arc::new(ConsoleMailer)),
        MailBackend::Smtp {
            host,
            port,
            username,
            password,
            use_tls,
        } => {
            let mailer = smtp::SmtpMailer::new(
                host.clone(),
                *port,
                username.clone(),
                password.clone(),
                *use_tls,
            )?;
            Ok(Arc::new(mailer))
        }
    }
}

/// Keeps every message in memory; tests read them back.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMailer {
    pub outbox: std::sync::Mutex<Vec<OutgoingMail>>,
    pub fail: bool,
}

#[cfg(test)]
impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::SendFailed("connection refused".to_string()));
        }
        self.outbox.lock().unwrap().push(mail.clone());
        Ok(())
    }
}
