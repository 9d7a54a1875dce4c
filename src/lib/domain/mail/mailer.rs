//! Mail delivery seam

#[cfg(test)]
use mockall::mock;

use super::{errors::MailError, message::Message};

/// Mail delivery service
pub trait Mailer: Send + Sync + 'static {
    /// Deliver a message in one shot, blocking until the transport accepts
    /// or rejects it.
    ///
    /// # Arguments
    /// * `message` - The [`Message`] to deliver.
    ///
    /// # Returns
    /// A [`Result`] indicating success or failure.
    fn send(&self, message: &Message) -> Result<(), MailError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Mailer for Mailer {
        fn send(&self, message: &Message) -> Result<(), MailError>;
    }
}
