//! Email infrastructure: SMTP transport and administrator alert wiring.

use clap::Parser;

use crate::domain::mail::{Admin, AdminNotifier, MailError};

pub mod smtp;

use smtp::{SMTPConfig, SMTPMailer};

/// Administrator alert configuration
#[derive(Clone, Debug, Parser)]
pub struct AdminAlertConfig {
    /// The administrators to notify; comma-separated `Name <email>` or bare
    /// address entries
    #[clap(long, env = "ADMINS", value_delimiter = ',')]
    pub admins: Vec<Admin>,

    /// The sender address for alert mail
    #[clap(long, env = "SMTP_SENDER", default_value = "root@localhost")]
    pub sender: String,
}

impl AdminAlertConfig {
    /// Read the configuration from the process environment.
    #[mutants::skip]
    pub fn from_env() -> Result<Self, MailError> {
        dotenvy::dotenv().ok();

        Self::try_parse_from(["opsmail"]).map_err(|err| MailError::MissingConfig(err.to_string()))
    }
}

/// Send an alert to every configured administrator.
///
/// Wires an [`SMTPMailer`] from `smtp` and delivers `subject` and `body` to
/// the administrators in `config`. Does nothing when no administrators are
/// configured. With `fail_silently` set, delivery failures are logged as
/// warnings instead of returned.
pub fn mail_admins(
    config: AdminAlertConfig,
    smtp: SMTPConfig,
    subject: &str,
    body: &str,
    fail_silently: bool,
) -> Result<(), MailError> {
    AdminNotifier::new(config.admins, config.sender, SMTPMailer::new(smtp))
        .notify(subject, body, fail_silently)
}
