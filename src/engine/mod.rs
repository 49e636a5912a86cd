// Account verification and message lifecycle services

pub mod inbox_gate;
pub mod mailbox;
pub mod mailer;
pub mod registration;
pub mod sign_in;
pub mod verification;
