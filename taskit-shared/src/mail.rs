/// Transactional email delivery
///
/// Account emails (welcome on signup, goodbye on account deletion) are sent
/// through the SendGrid v3 `mail/send` HTTP API. Sending is best effort: the
/// request handlers call [`Mailer::send_welcome_email`] or
/// [`Mailer::send_cancellation_email`], which spawn the delivery on a
/// detached task and only log failures.
///
/// When no API key is configured the mailer is disabled and every send is
/// skipped with a log line.
///
/// # Example
///
/// ```no_run
/// use taskit_shared::mail::{MailConfig, Mailer};
///
/// # async fn example() {
/// let mailer = Mailer::new(MailConfig {
///     api_key: Some("SG.xxxx".to_string()),
///     ..Default::default()
/// });
///
/// mailer.send_welcome_email("steve@example.com", "Steve");
/// # }
/// ```

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public SendGrid endpoint
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// No API key configured
    #[error("Mail delivery is not configured")]
    Disabled,

    /// The HTTP request could not be made
    #[error("Failed to reach mail API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The mail API answered with a non-success status
    #[error("Mail API error: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Mail delivery configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SendGrid API key; `None` disables delivery
    pub api_key: Option<String>,

    /// Sender address
    pub from_address: String,

    /// Mail API endpoint
    pub api_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from_address: "russell.burdikin@gmail.com".to_string(),
            api_url: SENDGRID_API_URL.to_string(),
        }
    }
}

/// A plain-text message to a single recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    /// Greeting sent after signup
    pub fn welcome(email: &str, name: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: "Thanks for joining in!".to_string(),
            text: format!(
                "Welcome to the app, {}. Let me know how you get along with the app",
                name
            ),
        }
    }

    /// Farewell sent after account deletion
    pub fn cancellation(email: &str, name: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: "Goodbye, thanks for joining in!".to_string(),
            text: format!(
                "Goodbye, {}. It is sad to see you go, if you wish you can sign up again",
                name
            ),
        }
    }
}

#[derive(Serialize)]
struct SendGridRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

/// Sends account emails
///
/// Cheap to clone; the HTTP client shares one connection pool.
#[derive(Debug, Clone)]
pub struct Mailer {
    config: MailConfig,
    client: reqwest::Client,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("taskit/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self { config, client }
    }

    /// Whether an API key is configured
    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Delivers a message and waits for the API's answer
    pub async fn deliver(&self, message: &EmailMessage) -> Result<(), MailError> {
        let api_key = self.config.api_key.as_deref().ok_or(MailError::Disabled)?;

        let payload = SendGridRequest {
            personalizations: [Personalization {
                to: [Address { email: &message.to }],
            }],
            from: Address {
                email: &self.config.from_address,
            },
            subject: &message.subject,
            content: [Content {
                kind: "text/plain",
                value: &message.text,
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, subject = %message.subject, "Email accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Sends the welcome email in the background
    pub fn send_welcome_email(&self, email: &str, name: &str) {
        self.dispatch(EmailMessage::welcome(email, name));
    }

    /// Sends the cancellation email in the background
    pub fn send_cancellation_email(&self, email: &str, name: &str) {
        self.dispatch(EmailMessage::cancellation(email, name));
    }

    fn dispatch(&self, message: EmailMessage) {
        if !self.is_enabled() {
            info!(to = %message.to, "Mail not configured, skipping \"{}\"", message.subject);
            return;
        }

        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.deliver(&message).await {
                warn!(to = %message.to, error = %e, "Failed to send email");
            }
        });
    }
}
