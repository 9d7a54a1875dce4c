//! SMTP mail delivery

use std::time::Duration;

use clap::Parser;
use lettre::{
    address::{Address, Envelope},
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::SmtpConnection,
        extension::ClientId,
        SMTP_PORT,
    },
};
use tracing::debug;

use crate::domain::mail::{MailError, Mailer, Message};

/// SMTP configuration
#[derive(Clone, Debug, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long, env = "SMTP_HOST", default_value = "localhost")]
    pub host: String,

    /// The SMTP port; 0 selects the protocol default
    #[clap(long, env = "SMTP_PORT", default_value = "0")]
    pub port: u16,

    /// The SMTP username
    #[clap(long, env = "SMTP_USER")]
    pub user: Option<String>,

    /// The SMTP password
    #[clap(long, env = "SMTP_PASSWORD")]
    pub password: Option<String>,

    /// Connection establishment timeout in seconds
    #[clap(long, env = "SMTP_TIMEOUT")]
    pub timeout: Option<u64>,
}

impl Default for SMTPConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 0,
            user: None,
            password: None,
            timeout: None,
        }
    }
}

impl SMTPConfig {
    /// Read the configuration from the process environment.
    #[mutants::skip]
    pub fn from_env() -> Result<Self, MailError> {
        dotenvy::dotenv().ok();

        Self::try_parse_from(["opsmail"]).map_err(|err| MailError::MissingConfig(err.to_string()))
    }

    /// The port to dial, mapping 0 to the protocol default.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            SMTP_PORT
        } else {
            self.port
        }
    }

    /// Credentials for SMTP AUTH; both parts must be present and non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(Credentials::new(user.to_string(), password.to_string()))
            }
            _ => None,
        }
    }

    fn connect_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// SMTP mailer
///
/// Holds the connection parameters and performs one-shot delivery: every
/// [`send`](Mailer::send) call opens its own connection and terminates the
/// session before returning.
#[derive(Clone, Debug, Default)]
pub struct SMTPMailer {
    config: SMTPConfig,
}

impl SMTPMailer {
    /// Create a new SMTP mailer
    pub fn new(config: SMTPConfig) -> Self {
        Self { config }
    }

    /// Create a new SMTP mailer from environment variables
    #[mutants::skip]
    pub fn from_env() -> Result<Self, MailError> {
        Ok(Self::new(SMTPConfig::from_env()?))
    }

    fn connect(&self) -> Result<SmtpConnection, MailError> {
        let server = (self.config.host.as_str(), self.config.effective_port());

        SmtpConnection::connect(
            server,
            self.config.connect_timeout(),
            &ClientId::default(),
            None,
            None,
        )
        .map_err(|err| MailError::Connection(err.to_string()))
    }

    fn transact(
        &self,
        conn: &mut SmtpConnection,
        envelope: &Envelope,
        payload: &[u8],
    ) -> Result<(), MailError> {
        if let Some(credentials) = self.config.credentials() {
            conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
                .map_err(|err| MailError::Authentication(err.to_string()))?;
        }

        conn.send(envelope, payload)
            .map_err(|err| MailError::Transmission(err.to_string()))?;

        Ok(())
    }
}

impl Mailer for SMTPMailer {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let payload = crlf_normalized(&message.formatted()?);
        let envelope = envelope(message)?;

        let mut conn = self.connect()?;

        debug!(
            "connected to {}:{}",
            self.config.host,
            self.config.effective_port()
        );

        let outcome = self.transact(&mut conn, &envelope, payload.as_bytes());

        // Terminate the session even when the transaction failed; a QUIT
        // failure must not mask the transaction result.
        let _ = conn.quit();

        if outcome.is_ok() {
            debug!("message accepted for {} recipient(s)", message.to.len());
        }

        outcome
    }
}

/// Envelope sender and recipients from the message fields, through the
/// transport's typed address parsing.
fn envelope(message: &Message) -> Result<Envelope, MailError> {
    let sender = parse_address(&message.sender)?;
    let recipients = message
        .to
        .iter()
        .map(|to| parse_address(to))
        .collect::<Result<Vec<_>, _>>()?;

    Envelope::new(Some(sender), recipients)
        .map_err(|err| MailError::InvalidAddress(err.to_string()))
}

fn parse_address(address: &str) -> Result<Address, MailError> {
    address
        .parse::<Address>()
        .map_err(|err| MailError::InvalidAddress(format!("{address}: {err}")))
}

/// Rewrite every line ending in `payload` to CRLF. Bare LF or CR inside the
/// SMTP DATA stream is rejected by some servers.
fn crlf_normalized(payload: &str) -> String {
    let mut normalized = String::with_capacity(payload.len());
    let mut chars = payload.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                normalized.push_str("\r\n");

                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => normalized.push_str("\r\n"),
            c => normalized.push(c),
        }
    }

    normalized
}
