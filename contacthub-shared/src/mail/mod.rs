/// Outgoing email
///
/// Handlers depend on the [`Mailer`] trait. Production uses
/// [`smtp::SmtpMailer`]; without SMTP settings the server falls back to
/// [`LogMailer`], which writes messages to the log instead of sending them.
///
/// # Example
///
/// ```no_run
/// use contacthub_shared::mail::{confirmation_email, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), contacthub_shared::mail::MailError> {
/// let mailer = LogMailer;
/// mailer.send(confirmation_email("ada@example.com", "042917", 10)).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use tracing::info;

pub mod smtp;

/// Errors from composing or delivering mail
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Failed to deliver message: {0}")]
    Transport(String),
}

/// A plain-text message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers outgoing email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Composes the confirmation code message
pub fn confirmation_email(to: &str, code: &str, ttl_minutes: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Your Contact Hub confirmation code".to_string(),
        body: format!(
            "Your confirmation code is {code}.\n\n\
             It expires in {ttl_minutes} minutes and can only be used once.\n\
             If you did not request it, you can ignore this message.\n"
        ),
    }
}

/// Writes messages to the log
///
/// For development setups with no SMTP server. The body is logged at debug
/// level only, since it carries the code.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "Mail delivery disabled, logging message");
        tracing::debug!(body = %email.body, "Logged message body");
        Ok(())
    }
}

/// Keeps sent messages in memory for assertions
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<OutgoingEmail>>,
    fail: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    /// Switches delivery failure on or off
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The 6-digit code in the latest message sent to `to`
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.to.eq_ignore_ascii_case(to))
            .and_then(|m| {
                m.body
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|word| word.len() == crate::auth::confirmation::CODE_DIGITS)
                    .map(str::to_string)
            })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(MailError::Transport("delivery disabled".to_string()));
        }

        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_email_contents() {
        let email = confirmation_email("ada@example.com", "004213", 10);
        assert_eq!(email.to, "ada@example.com");
        assert!(email.body.contains("004213"));
        assert!(email.body.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        assert!(LogMailer.send(confirmation_email("x@example.com", "123456", 10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_recording_mailer_finds_latest_code() {
        let mailer = RecordingMailer::new();
        mailer.send(confirmation_email("ada@example.com", "111111", 10)).await.unwrap();
        mailer.send(confirmation_email("bob@example.com", "222222", 10)).await.unwrap();
        mailer.send(confirmation_email("ada@example.com", "333333", 10)).await.unwrap();

        assert_eq!(mailer.sent().len(), 3);
        assert_eq!(mailer.last_code_for("ADA@example.com").as_deref(), Some("333333"));
        assert_eq!(mailer.last_code_for("carol@example.com"), None);
    }

    #[tokio::test]
    async fn test_failing_mailer() {
        let mailer = RecordingMailer::failing();
        let result = mailer.send(confirmation_email("ada@example.com", "111111", 10)).await;
        assert!(matches!(result, Err(MailError::Transport(_))));
        assert!(mailer.sent().is_empty());
    }
}
