//! Outgoing mail
//!
//! [`SmtpMailer`] is the production transport; [`NoOpMailer`] stands in when no
//! mail server is configured.

mod noop;
mod smtp;
mod traits;

pub use noop::NoOpMailer;
pub use smtp::SmtpMailer;
pub use traits::{AttachmentRef, DeliveryReport, DeliveryStatus, Mailer, OutgoingEmail};
