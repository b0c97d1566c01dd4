//! Outbound email port.
//!
//! Delivery is an external collaborator: the engine only defines the
//! contract. The facade's `send_email` tool goes through [`Mailer`], and
//! deployments wire in a real transport; [`LogMailer`] is the default and
//! records the send in the log instead of delivering it.

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
    pub from: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("no recipients given")]
    NoRecipients,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutboundEmail) -> Result<(), MailError>;
}

/// Logs outbound mail instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &OutboundEmail) -> Result<(), MailError> {
        if mail.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        tracing::info!(
            subject = %mail.subject,
            to = ?mail.to,
            from = %mail.from,
            "outbound email (log-only delivery)"
        );
        Ok(())
    }
}
