/// Account notification emails
///
/// Fire-and-forget delivery of the welcome email on registration and the
/// cancellation email on account deletion. Sends go out on a spawned task;
/// a delivery failure is logged at `warn` and never reaches the request
/// that triggered it.
///
/// The provider is a SendGrid-style JSON API reached over HTTPS; the wire
/// protocol beyond "POST a message object" is the provider's concern.
use serde_json::json;
use tracing::{debug, warn};

/// Mail-provider send endpoint
const SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The HTTP request failed or the provider rejected the message
    #[error("Mail delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),
}

/// Mail client, constructed once at startup and cloned into handlers
#[derive(Debug, Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_key: String,
    from: String,
}

impl Mailer {
    /// Creates a mailer with the provider API key and sender address
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
        }
    }

    /// Queues the welcome email for a newly registered user
    ///
    /// Returns immediately; delivery happens on a spawned task.
    pub fn spawn_welcome(&self, email: String, name: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            let subject = "Thanks for joining in!".to_string();
            let body = format!(
                "Welcome to Taskmate, {}. Let us know how you get along with the app.",
                name
            );
            if let Err(e) = mailer.send(&email, &subject, &body).await {
                warn!(to = %email, "Failed to send welcome email: {}", e);
            }
        });
    }

    /// Queues the cancellation email for a deleted account
    ///
    /// Returns immediately; delivery happens on a spawned task.
    pub fn spawn_cancellation(&self, email: String, name: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            let subject = "Sorry to see you go!".to_string();
            let body = format!(
                "Dear {}, this confirms that your account has been cancelled. \
                 We hope to see you back sometime soon.",
                name
            );
            if let Err(e) = mailer.send(&email, &subject, &body).await {
                warn!(to = %email, "Failed to send cancellation email: {}", e);
            }
        });
    }

    /// Sends one plain-text message through the provider
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        self.http
            .post(SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;

        debug!(to = %to, subject = %subject, "Mail accepted by provider");
        Ok(())
    }
}
