//! Email delivery over SMTP with STARTTLS.

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as MailMessage, Tokio1Executor};
use tracing::{info, instrument};

use super::{ChannelError, NotifyChannel};
use crate::config::Email;
use crate::notify::Message;
use crate::util::{get_smtp_password, get_smtp_username};

#[derive(Debug, Clone)]
pub struct EmailChannel {
    config: Email,
    credentials: Option<(String, String)>,
}

impl EmailChannel {
    pub fn new(config: Email, credentials: Option<(String, String)>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Credentials come from `SMTP_USERNAME` / `SMTP_PASSWORD`
    pub fn from_env(config: Email) -> Self {
        let credentials = get_smtp_username().zip(get_smtp_password());
        Self::new(config, credentials)
    }

    fn build(&self, message: &Message) -> Result<MailMessage, ChannelError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| ChannelError::Email(format!("invalid from address: {e}")))?;

        let to: Mailbox = self
            .config
            .to
            .parse()
            .map_err(|e| ChannelError::Email(format!("invalid to address: {e}")))?;

        MailMessage::builder()
            .from(from)
            .to(to)
            .subject(message.title.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| ChannelError::Email(format!("failed to build email: {e}")))
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    fn enabled(&self) -> bool {
        self.credentials.is_some()
    }

    #[instrument(skip(self, message), fields(to = %self.config.to))]
    async fn deliver(&self, message: &Message) -> Result<(), ChannelError> {
        let Some((username, password)) = &self.credentials else {
            return Err(ChannelError::NotConfigured(
                "SMTP_USERNAME and SMTP_PASSWORD must be set".to_string(),
            ));
        };

        let email = self.build(message)?;

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| ChannelError::Email(format!("failed to create SMTP transport: {e}")))?
                .port(self.config.smtp_port)
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| ChannelError::Email(format!("failed to send email via SMTP: {e}")))?;

        info!("email sent");
        Ok(())
    }
}
