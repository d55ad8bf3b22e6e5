pub mod booking;
pub mod contact;
pub mod equipment;
pub mod expense;
pub mod lead;
pub mod notification;
pub mod payment;
pub mod review;
pub mod service;
pub mod user;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use contact::ContactMessage;
pub use equipment::{Equipment, MaintenanceRecord};
pub use expense::Expense;
pub use lead::{Lead, LeadActivity};
pub use notification::Notification;
pub use payment::{Payment, PaymentState};
pub use review::Review;
pub use service::Service;
pub use user::{Role, User};
