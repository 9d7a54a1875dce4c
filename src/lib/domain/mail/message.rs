//! Mail message

use super::errors::MailError;

/// Character set applied when the builder does not set one.
pub const DEFAULT_CHARSET: &str = "us-ascii";

/// A plain-text mail message.
///
/// Built with [`Message::builder`] and serialized on demand with
/// [`Message::formatted`]. Address syntax is not validated here; the
/// transport parses the addresses when it builds the envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The sender address, used for the From header and the envelope
    pub sender: String,

    /// The recipient addresses, in order
    pub to: Vec<String>,

    /// The subject line, inserted verbatim
    pub subject: String,

    /// The plain-text body
    pub body: String,

    /// The character set declared for the body
    pub charset: String,
}

impl Message {
    /// Start building a message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Serialize the message to a MIME text/plain document.
    ///
    /// A pure function of the fields: every call yields the same document.
    /// The header block is Content-Type, MIME-Version and
    /// Content-Transfer-Encoding, then Subject, From and To, with the
    /// recipients joined by `", "` in insertion order. Lines are
    /// CRLF-terminated and a blank line separates the headers from the body.
    ///
    /// # Returns
    /// - [`Ok`] with the document.
    /// - [`Err`] with [`MailError::Encoding`] when the declared charset
    ///   cannot represent the body.
    pub fn formatted(&self) -> Result<String, MailError> {
        let headers = [
            format!("Content-Type: text/plain; charset=\"{}\"", self.charset),
            "MIME-Version: 1.0".to_string(),
            format!("Content-Transfer-Encoding: {}", self.transfer_encoding()?),
            format!("Subject: {}", self.subject),
            format!("From: {}", self.sender),
            format!("To: {}", self.to.join(", ")),
        ];

        Ok(format!("{}\r\n\r\n{}", headers.join("\r\n"), self.body))
    }

    /// 7bit for an all-ASCII body, 8bit for a non-ASCII body under a UTF-8
    /// charset. No transcoding is performed, so any other charset can only
    /// carry ASCII.
    fn transfer_encoding(&self) -> Result<&'static str, MailError> {
        if self.body.is_ascii() {
            return Ok("7bit");
        }

        if self.charset.eq_ignore_ascii_case("utf-8") || self.charset.eq_ignore_ascii_case("utf8") {
            return Ok("8bit");
        }

        Err(MailError::Encoding {
            charset: self.charset.clone(),
        })
    }
}

/// Builder for [`Message`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    sender: Option<String>,
    to: Vec<String>,
    subject: Option<String>,
    body: Option<String>,
    charset: Option<String>,
}

impl MessageBuilder {
    /// Set the sender address.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Add a single recipient.
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Add a sequence of recipients, preserving their order.
    pub fn to_many<I, S>(mut self, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to.extend(to.into_iter().map(Into::into));
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the plain-text body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Override the default character set.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Finish building the message.
    ///
    /// # Returns
    /// - [`Ok`] with the [`Message`].
    /// - [`Err`] with [`MailError::Build`] when the sender, subject or body
    ///   is missing, or no recipient was added.
    pub fn build(self) -> Result<Message, MailError> {
        let sender = self
            .sender
            .ok_or_else(|| MailError::Build("message has no sender".to_string()))?;

        if self.to.is_empty() {
            return Err(MailError::Build("message has no recipients".to_string()));
        }

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("message has no subject".to_string()))?;

        let body = self
            .body
            .ok_or_else(|| MailError::Build("message has no body".to_string()))?;

        Ok(Message {
            sender,
            to: self.to,
            subject,
            body,
            charset: self.charset.unwrap_or_else(|| DEFAULT_CHARSET.to_string()),
        })
    }
}
