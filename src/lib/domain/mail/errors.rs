//! Mail errors

use thiserror::Error;

/// Mail errors
///
/// Every failure carries exactly one of these kinds; nothing is wrapped or
/// retried on the way to the caller.
#[derive(Debug, Error)]
pub enum MailError {
    /// Ambient configuration could not be loaded
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// The message is missing a required field
    #[error("could not build the message: {0}")]
    Build(String),

    /// The body cannot be represented in the declared charset
    #[error("cannot encode the body as {charset}")]
    Encoding {
        /// The charset that cannot carry the body
        charset: String,
    },

    /// An address was rejected by the transport's parser
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// The SMTP server could not be reached
    #[error("could not connect to the SMTP server: {0}")]
    Connection(String),

    /// The SMTP server rejected the credentials
    #[error("could not authenticate with the SMTP server: {0}")]
    Authentication(String),

    /// The SMTP server rejected the mail transaction
    #[error("could not transmit the message: {0}")]
    Transmission(String),
}
