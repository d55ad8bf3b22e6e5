use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::queries::{BookingDetail, ReminderBooking};
use crate::models::Payment;
use crate::services::mailer::OutgoingEmail;
use crate::state::AppState;

/// Sends emails off the request path. Failures are logged and dropped; mail
/// never decides the outcome of the request that queued it.
pub fn dispatch(state: &Arc<AppState>, emails: Vec<OutgoingEmail>) {
    if emails.is_empty() {
        return;
    }
    let state = Arc::clone(state);
    tokio::spawn(async move {
        for email in emails {
            if let Err(e) = state.mailer.send(&email).await {
                tracing::error!(error = %e, to = %email.to, subject = %email.subject, "email dispatch failed");
            }
        }
    });
}

/// Customer confirmation plus the studio's own copy for a fresh booking.
pub fn booking_emails(config: &AppConfig, detail: &BookingDetail) -> Vec<OutgoingEmail> {
    let b = &detail.booking;
    let customer = OutgoingEmail {
        to: b.customer_email.clone(),
        subject: format!("Booking Confirmed - {}", detail.service_name),
        html: format!(
            "<h2>Thank you for your booking, {}!</h2>\
             <p>We have received your booking for <strong>{}</strong>.</p>\
             <p>Date: {} at {}<br>Location: {}<br>Amount: &#8377;{}</p>\
             <p>We will contact you shortly to confirm the details.</p>",
            b.customer_name,
            detail.service_name,
            b.event_date,
            b.event_time,
            b.event_location,
            b.total_amount,
        ),
    };
    let admin = OutgoingEmail {
        to: config.admin_email.clone(),
        subject: format!("New Booking: {} - {}", detail.service_name, b.customer_name),
        html: format!(
            "<h2>New booking #{}</h2>\
             <p>{} ({}, {})</p>\
             <p>Service: {}<br>Date: {} at {}<br>Location: {}<br>Amount: &#8377;{}</p>",
            b.id,
            b.customer_name,
            b.customer_email,
            b.customer_phone,
            detail.service_name,
            b.event_date,
            b.event_time,
            b.event_location,
            b.total_amount,
        ),
    };
    vec![customer, admin]
}

/// Receipt for the customer and an alert for the studio once a payment
/// verifies.
pub fn payment_emails(
    config: &AppConfig,
    detail: &BookingDetail,
    payment: &Payment,
) -> Vec<OutgoingEmail> {
    let b = &detail.booking;
    let location = b.venue_address.as_deref().unwrap_or(&b.event_location);
    let admin = OutgoingEmail {
        to: config.admin_email.clone(),
        subject: format!(
            "Payment Received: \u{20b9}{} - {}",
            payment.amount, b.customer_name
        ),
        html: format!(
            "<h2>Payment received for booking #{}</h2>\
             <p>{} paid &#8377;{} for {}.</p>\
             <p>Order: {}<br>Payment: {}</p>\
             <p>Event: {} at {}, {}</p>",
            b.id,
            b.customer_name,
            payment.amount,
            detail.service_name,
            payment.order_id,
            payment.payment_id.as_deref().unwrap_or("-"),
            b.event_date,
            b.event_time,
            location,
        ),
    };
    let customer = OutgoingEmail {
        to: b.customer_email.clone(),
        subject: format!(
            "Payment Successful - Booking Confirmed! \u{20b9}{}",
            payment.amount
        ),
        html: format!(
            "<h2>Payment successful, {}!</h2>\
             <p>Your payment of <strong>&#8377;{}</strong> for {} is confirmed.</p>\
             <p>Event: {} at {}<br>Location: {}</p>\
             <p>See you there!</p>",
            b.customer_name,
            payment.amount,
            detail.service_name,
            b.event_date,
            b.event_time,
            location,
        ),
    };
    vec![admin, customer]
}

pub fn contact_alert(
    config: &AppConfig,
    name: &str,
    email: &str,
    phone: Option<&str>,
    subject: &str,
    message: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: config.admin_email.clone(),
        subject: format!("New Contact Form: {subject}"),
        html: format!(
            "<h2>New contact message</h2>\
             <p>From: {} ({}{})</p>\
             <p>{}</p>",
            name,
            email,
            phone.map(|p| format!(", {p}")).unwrap_or_default(),
            message,
        ),
    }
}

pub fn review_alert(config: &AppConfig, name: &str, rating: i64, text: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: config.admin_email.clone(),
        subject: format!("New Review: {rating}/5 stars from {name}"),
        html: format!(
            "<h2>New review awaiting approval</h2>\
             <p>{name} rated their experience {rating}/5:</p>\
             <blockquote>{text}</blockquote>",
        ),
    }
}

pub fn event_reminder(booking: &ReminderBooking) -> OutgoingEmail {
    OutgoingEmail {
        to: booking.customer_email.clone(),
        subject: format!(
            "Reminder: {} on {}",
            booking.service_name, booking.event_date
        ),
        html: format!(
            "<h2>Your event is coming up, {}!</h2>\
             <p>{} on {} at {}.</p>\
             <p>Location: {}</p>\
             <p>Our team will arrive ahead of time to set up.</p>",
            booking.customer_name,
            booking.service_name,
            booking.event_date,
            booking.event_time,
            booking.event_location,
        ),
    }
}

pub fn custom(to: &str, title: &str, message: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: title.to_string(),
        html: format!("<h2>{title}</h2><p>{message}</p>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, BookingStatus, PaymentState, PaymentStatus};

    fn test_config() -> AppConfig {
        AppConfig {
            port: 5000,
            database_url: ":memory:".to_string(),
            environment: "test".to_string(),
            admin_api_key: "k".to_string(),
            admin_email: "studio@example.com".to_string(),
            admin_password: "pw".to_string(),
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            resend_api_key: String::new(),
            from_email: "noreply@example.com".to_string(),
            allowed_origins: vec![],
            min_order_amount: 100,
            enforce_status_graph: false,
        }
    }

    fn test_detail() -> BookingDetail {
        BookingDetail {
            booking: Booking {
                id: 7,
                user_id: None,
                service_id: 1,
                customer_name: "Priya".to_string(),
                customer_email: "priya@example.com".to_string(),
                customer_phone: "9876543210".to_string(),
                alt_phone: None,
                event_date: "2025-06-15".to_string(),
                event_time: "14:00".to_string(),
                event_location: "Jaipur".to_string(),
                venue_address: None,
                special_requirements: None,
                total_amount: 25000,
                advance_amount: 0,
                payment_status: PaymentStatus::Pending,
                booking_status: BookingStatus::Pending,
                razorpay_order_id: None,
                razorpay_payment_id: None,
                created_at: "2025-06-01 10:00:00".to_string(),
                updated_at: "2025-06-01 10:00:00".to_string(),
            },
            service_name: "Wedding Basic".to_string(),
            service_price: 25000,
            user_name: None,
            user_email: None,
            service_features: None,
        }
    }

    #[test]
    fn booking_emails_go_to_customer_and_admin() {
        let emails = booking_emails(&test_config(), &test_detail());
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].to, "priya@example.com");
        assert_eq!(emails[0].subject, "Booking Confirmed - Wedding Basic");
        assert_eq!(emails[1].to, "studio@example.com");
        assert!(emails[1].subject.contains("New Booking"));
        assert!(emails[1].html.contains("booking #7"));
    }

    #[test]
    fn payment_emails_carry_the_amount() {
        let payment = Payment {
            id: 1,
            order_id: "order_abc".to_string(),
            booking_id: Some(7),
            amount: 25000,
            currency: "INR".to_string(),
            status: PaymentState::Completed,
            payment_id: Some("pay_xyz".to_string()),
            signature: None,
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            gateway: "razorpay".to_string(),
            created_at: "2025-06-01 10:05:00".to_string(),
            completed_at: None,
        };
        let emails = payment_emails(&test_config(), &test_detail(), &payment);
        assert_eq!(emails.len(), 2);
        assert!(emails[0].subject.contains("25000"));
        assert!(emails[0].html.contains("order_abc"));
        assert_eq!(emails[1].to, "priya@example.com");
        assert!(emails[1].subject.contains("Payment Successful"));
    }

    #[test]
    fn reminder_names_the_service_and_date() {
        let email = event_reminder(&ReminderBooking {
            id: 7,
            customer_name: "Priya".to_string(),
            customer_email: "priya@example.com".to_string(),
            event_date: "2025-06-15".to_string(),
            event_time: "14:00".to_string(),
            event_location: "Jaipur".to_string(),
            service_name: "Wedding Basic".to_string(),
        });
        assert_eq!(email.subject, "Reminder: Wedding Basic on 2025-06-15");
        assert!(email.html.contains("Jaipur"));
    }
}
