/// Outbound transactional email
///
/// Everything the backend emails goes through the [`Mailer`] trait:
///
/// - [`SmtpMailer`]: lettre over STARTTLS, used when SMTP settings are configured
/// - [`LogMailer`]: writes the message to the log, used in development
///
/// Messages are plain text. Links point at the storefront (`FRONTEND_URL`):
///
/// - verification: `{frontend}/verify-email?token={token}`
/// - password reset: `{frontend}/reset-password/{token}`
///
/// # Example
///
/// ```
/// use sellos_shared::mail::{verification_email, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = LogMailer;
/// let email = verification_email("https://sellos-g.com", "alice@x.com", "Alice", "abc123");
/// assert!(email.body.contains("https://sellos-g.com/verify-email?token=abc123"));
/// mailer.send(email).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Errors that can occur when sending email
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport error
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the message
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Address could not be parsed
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// A rendered message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,

    /// Action link embedded in the body, if any
    pub link: Option<String>,
}

/// Sends transactional email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// Mailer delivering over SMTP with STARTTLS
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Builds the transport; no connection is opened until the first send
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable relay host.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: settings.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| MailError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)?;

        self.transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Mailer that only logs; nothing leaves the process
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            link = email.link.as_deref().unwrap_or(""),
            "Email not sent (SMTP not configured)"
        );
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Email verification message for a new customer
pub fn verification_email(frontend_url: &str, to: &str, name: &str, token: &str) -> OutgoingEmail {
    let link = join_url(frontend_url, &format!("/verify-email?token={}", token));

    OutgoingEmail {
        to: to.to_string(),
        subject: "Verify your Sellos G account".to_string(),
        body: format!(
            "Hello {},\n\n\
             Thanks for registering with Sellos G. Confirm your email address by opening:\n\n\
             {}\n\n\
             The link expires in one hour.\n",
            name, link
        ),
        link: Some(link),
    }
}

/// Password reset message
pub fn password_reset_email(frontend_url: &str, to: &str, name: &str, token: &str) -> OutgoingEmail {
    let link = join_url(frontend_url, &format!("/reset-password/{}", token));

    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your Sellos G password".to_string(),
        body: format!(
            "Hello {},\n\n\
             We received a request to reset your password. Choose a new one here:\n\n\
             {}\n\n\
             The link expires in one hour. If you did not ask for this, ignore this email.\n",
            name, link
        ),
        link: Some(link),
    }
}

/// Welcome message for a newly created employee
pub fn employee_welcome_email(frontend_url: &str, to: &str, name: &str) -> OutgoingEmail {
    let link = join_url(frontend_url, "/login");

    OutgoingEmail {
        to: to.to_string(),
        subject: "Welcome to the Sellos G team".to_string(),
        body: format!(
            "Hello {},\n\n\
             An administrator created your Sellos G staff account for {}.\n\
             Sign in at {} with the password you were given and change it from your profile.\n",
            name, to, link
        ),
        link: Some(link),
    }
}
