//! Administrator alerts

use std::{fmt, str::FromStr};

use thiserror::Error;
use tracing::warn;

use super::{errors::MailError, mailer::Mailer, message::Message};

/// An error that can occur when parsing an administrator entry
#[derive(Debug, Error)]
pub enum AdminParseError {
    /// The entry is empty
    #[error("admin entry is empty")]
    Empty,

    /// The entry is not `Name <email>` or a bare address
    #[error("admin entry is malformed: {0}")]
    Malformed(String),
}

/// An administrator to notify, as a display name and email address pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admin {
    name: String,
    email: String,
}

impl Admin {
    /// Create a new administrator entry.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// The display name; empty when configured as a bare address.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The email address.
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl FromStr for Admin {
    type Err = AdminParseError;

    /// Parse `Name <email>` or a bare `email`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = s.trim();

        if entry.is_empty() {
            return Err(AdminParseError::Empty);
        }

        let Some((name, rest)) = entry.split_once('<') else {
            return Ok(Self::new("", entry));
        };

        let email = rest
            .strip_suffix('>')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AdminParseError::Malformed(entry.to_string()))?;

        Ok(Self::new(name.trim(), email))
    }
}

impl fmt::Display for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.email)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

/// Sends operational alerts to every configured administrator.
#[derive(Debug)]
pub struct AdminNotifier<M: Mailer> {
    admins: Vec<Admin>,
    sender: String,
    mailer: M,
}

impl<M: Mailer> AdminNotifier<M> {
    /// Create a new notifier.
    pub fn new(admins: Vec<Admin>, sender: impl Into<String>, mailer: M) -> Self {
        Self {
            admins,
            sender: sender.into(),
            mailer,
        }
    }

    /// Send `subject` and `body` to every administrator in one message.
    ///
    /// Returns without sending when no administrators are configured. With
    /// `fail_silently` set, a delivery failure is reported as a warning
    /// event instead of an error; message construction failures always
    /// propagate.
    pub fn notify(&self, subject: &str, body: &str, fail_silently: bool) -> Result<(), MailError> {
        if self.admins.is_empty() {
            return Ok(());
        }

        let message = Message::builder()
            .to_many(self.admins.iter().map(Admin::email))
            .sender(&self.sender)
            .subject(subject)
            .body(body)
            .build()?;

        match self.mailer.send(&message) {
            Err(err) if fail_silently => {
                warn!(
                    "mail could not be sent: {} (subject {:?}, {} recipient(s))",
                    err,
                    subject,
                    message.to.len()
                );

                Ok(())
            }
            outcome => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::{Arc, Mutex},
    };

    use testresult::TestResult;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::domain::mail::tests::MockMailer;

    use super::*;

    #[test]
    fn test_admin_from_named_entry() -> TestResult {
        let admin: Admin = "Jane Ops <jane@example.com>".parse()?;

        assert_eq!(admin.name(), "Jane Ops");
        assert_eq!(admin.email(), "jane@example.com");

        Ok(())
    }

    #[test]
    fn test_admin_from_bare_address() -> TestResult {
        let admin: Admin = "jane@example.com".parse()?;

        assert_eq!(admin.name(), "");
        assert_eq!(admin.email(), "jane@example.com");

        Ok(())
    }

    #[test]
    fn test_empty_admin_entry_is_rejected() {
        let result = "   ".parse::<Admin>();

        assert!(matches!(result.unwrap_err(), AdminParseError::Empty));
    }

    #[test]
    fn test_admin_entry_without_closing_bracket_is_rejected() {
        let result = "Jane <jane@example.com".parse::<Admin>();

        assert!(matches!(result.unwrap_err(), AdminParseError::Malformed(_)));
    }

    #[test]
    fn test_admin_entry_with_empty_brackets_is_rejected() {
        let result = "Jane <>".parse::<Admin>();

        assert!(matches!(result.unwrap_err(), AdminParseError::Malformed(_)));
    }

    #[test]
    fn test_admin_display_round_trips() -> TestResult {
        let named: Admin = "Jane Ops <jane@example.com>".parse()?;
        let bare: Admin = "jane@example.com".parse()?;

        assert_eq!(named.to_string(), "Jane Ops <jane@example.com>");
        assert_eq!(bare.to_string(), "jane@example.com");

        Ok(())
    }

    #[test]
    fn test_notify_without_admins_is_a_no_op() -> TestResult {
        let mut mailer = MockMailer::new();

        mailer.expect_send().times(0);

        let notifier = AdminNotifier::new(vec![], "root@localhost", mailer);

        notifier.notify("subject", "body", false)?;

        Ok(())
    }

    #[test]
    fn test_notify_addresses_every_admin_in_order() -> TestResult {
        let mut mailer = MockMailer::new();

        mailer
            .expect_send()
            .times(1)
            .withf(|message| {
                message.to == ["first@example.com", "second@example.com"]
                    && message.sender == "root@localhost"
                    && message.subject == "disk almost full"
                    && message.body == "97% used"
            })
            .returning(|_| Ok(()));

        let admins = vec![
            Admin::new("First", "first@example.com"),
            Admin::new("", "second@example.com"),
        ];
        let notifier = AdminNotifier::new(admins, "root@localhost", mailer);

        notifier.notify("disk almost full", "97% used", false)?;

        Ok(())
    }

    #[test]
    fn test_notify_propagates_failures_by_default() {
        let mut mailer = MockMailer::new();

        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Connection("connection refused".to_string())));

        let admins = vec![Admin::new("", "a@example.com")];
        let notifier = AdminNotifier::new(admins, "root@localhost", mailer);

        let result = notifier.notify("subject", "body", false);

        assert!(matches!(result.unwrap_err(), MailError::Connection(_)));
    }

    #[test]
    fn test_notify_fail_silently_warns_and_succeeds() -> TestResult {
        let mut mailer = MockMailer::new();

        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Connection("connection refused".to_string())));

        let admins = vec![Admin::new("", "a@example.com")];
        let notifier = AdminNotifier::new(admins, "root@localhost", mailer);

        let writer = CaptureWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            notifier.notify("subject", "body", true)
        })?;

        let output = writer.contents();

        assert!(output.contains("WARN"));
        assert!(output.contains("mail could not be sent"));
        assert!(output.contains("connection refused"));

        Ok(())
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);

            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
