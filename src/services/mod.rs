pub mod auth;
pub mod booking;
pub mod gateway;
pub mod mailer;
pub mod notify;
pub mod payments;
pub mod validation;
