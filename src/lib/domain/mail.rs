//! Mail module: message composition, the delivery seam, and administrator alerts.

mod admins;
mod errors;
mod mailer;
mod message;

pub use admins::{Admin, AdminNotifier, AdminParseError};
pub use errors::MailError;
pub use mailer::Mailer;
pub use message::{Message, MessageBuilder, DEFAULT_CHARSET};

#[cfg(test)]
pub mod tests {
    pub use super::mailer::MockMailer;
}
