use std::sync::Arc;

use serde::Deserialize;

use crate::db::queries::{self, BookingDetail, NewBooking};
use crate::errors::AppError;
use crate::models::{BookingStatus, PaymentStatus};
use crate::services::{notify, validation};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(rename = "altPhone")]
    pub alt_phone: Option<String>,
    #[serde(default)]
    pub service: String,
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "specialRequirements")]
    pub special_requirements: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub booking_status: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
}

/// Who is asking for a cancellation. Admins reach any booking, customers
/// only their own.
pub enum Actor {
    Admin,
    Customer(i64),
}

pub fn create_booking(
    state: &Arc<AppState>,
    user_id: Option<i64>,
    req: &CreateBookingRequest,
) -> Result<BookingDetail, AppError> {
    let mut errors = vec![];
    validation::min_len(&mut errors, "name", &req.name, 2, "Name must be at least 2 characters");
    validation::email(&mut errors, "email", &req.email, "Valid email required");
    validation::mobile(&mut errors, "phone", &req.phone, "Valid Indian phone number required");
    validation::not_empty(&mut errors, "service", &req.service, "Service selection required");
    let price = validation::numeric_amount(
        &mut errors,
        "price",
        req.price.as_ref(),
        "Valid price required",
    );
    validation::iso_date(&mut errors, "date", &req.date, "Valid date required");
    validation::time_hhmm(&mut errors, "time", &req.time, "Valid time required");
    validation::min_len(
        &mut errors,
        "location",
        &req.location,
        5,
        "Location must be at least 5 characters",
    );
    validation::finish(errors)?;
    let price = price.unwrap_or_default();

    let detail = {
        let db = state.db.lock().unwrap();
        let service = match queries::get_service(&db, req.service.trim())? {
            Some(service) => service,
            None => return Err(AppError::UnknownService(req.service.trim().to_string())),
        };

        if queries::slot_taken(&db, req.date.trim(), req.time.trim())? {
            return Err(AppError::SlotConflict);
        }

        let id = queries::insert_booking(
            &db,
            &NewBooking {
                user_id,
                service_id: service.id,
                customer_name: req.name.trim(),
                customer_email: req.email.trim(),
                customer_phone: req.phone.trim(),
                alt_phone: req.alt_phone.as_deref(),
                event_date: req.date.trim(),
                event_time: req.time.trim(),
                event_location: req.location.trim(),
                special_requirements: req.special_requirements.as_deref(),
                total_amount: price,
            },
        )?;

        queries::get_booking_detail(&db, id)?
            .ok_or_else(|| anyhow::anyhow!("booking {id} missing after insert"))?
    };

    tracing::info!(
        booking_id = detail.booking.id,
        service = %detail.service_name,
        event_date = %detail.booking.event_date,
        "booking created"
    );
    notify::dispatch(state, notify::booking_emails(&state.config, &detail));

    Ok(detail)
}

pub fn cancel_booking(
    state: &Arc<AppState>,
    id: i64,
    actor: Actor,
    reason: Option<&str>,
) -> Result<(), AppError> {
    let db = state.db.lock().unwrap();

    // Customers get the same 404 for someone else's booking as for a
    // missing one, so ids cannot be probed.
    let booking = match actor {
        Actor::Admin => queries::get_booking(&db, id)?,
        Actor::Customer(user_id) => queries::get_booking_owned(&db, id, user_id)?,
    };
    let Some(booking) = booking else {
        return Err(AppError::NotFound("Booking not found or access denied"));
    };

    match booking.booking_status {
        BookingStatus::Completed => {
            return Err(AppError::InvalidTransition(
                "Cannot cancel completed booking".to_string(),
            ))
        }
        BookingStatus::Cancelled => {
            return Err(AppError::InvalidTransition(
                "Booking is already cancelled".to_string(),
            ))
        }
        _ => {}
    }

    let reason = reason.filter(|r| !r.trim().is_empty()).unwrap_or("No reason provided");
    queries::cancel_booking(&db, id, reason)?;

    tracing::info!(booking_id = id, "booking cancelled");
    Ok(())
}

pub fn admin_update_booking(
    state: &Arc<AppState>,
    id: i64,
    req: &UpdateStatusRequest,
) -> Result<BookingDetail, AppError> {
    let booking_status = match req.booking_status.as_deref() {
        Some(s) => Some(BookingStatus::parse(s).ok_or(AppError::InvalidStatus("booking"))?),
        None => None,
    };
    let payment_status = match req.payment_status.as_deref() {
        Some(s) => Some(PaymentStatus::parse(s).ok_or(AppError::InvalidStatus("payment"))?),
        None => None,
    };

    let db = state.db.lock().unwrap();
    let current = queries::get_booking(&db, id)?.ok_or(AppError::NotFound("Booking not found"))?;

    if state.config.enforce_status_graph {
        if let Some(next) = booking_status {
            if next != current.booking_status && !current.booking_status.can_transition_to(next) {
                return Err(AppError::InvalidTransition(format!(
                    "Cannot move booking from {} to {}",
                    current.booking_status.as_str(),
                    next.as_str()
                )));
            }
        }
    }

    queries::admin_update_booking(
        &db,
        id,
        booking_status.map(|s| s.as_str()),
        payment_status.map(|s| s.as_str()),
        req.notes.as_deref(),
    )?;

    queries::get_booking_detail(&db, id)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("booking {id} missing after update")))
}
