pub mod relay;

pub use relay::{ConsultationMessage, MailReceipt, MailRelayClient, MailerError};
