use rusqlite::{params, Connection};
use serde::Serialize;

use crate::models::{
    Booking, BookingStatus, ContactMessage, Equipment, Expense, Lead, LeadActivity,
    MaintenanceRecord, Notification, Payment, PaymentState, PaymentStatus, Review, Role, Service,
    User,
};

const BOOKING_COLS: &str = "b.id, b.user_id, b.service_id, b.customer_name, b.customer_email, \
     b.customer_phone, b.alt_phone, b.event_date, b.event_time, b.event_location, \
     b.venue_address, b.special_requirements, b.total_amount, b.advance_amount, \
     b.payment_status, b.booking_status, b.razorpay_order_id, b.razorpay_payment_id, \
     b.created_at, b.updated_at";

const PAYMENT_COLS: &str = "p.id, p.order_id, p.booking_id, p.amount, p.currency, p.status, \
     p.payment_id, p.signature, p.customer_name, p.customer_email, p.customer_phone, \
     p.gateway, p.created_at, p.completed_at";

const USER_COLS: &str = "u.id, u.name, u.email, u.phone, u.password_hash, u.role, \
     u.created_at, u.updated_at";

const LEAD_COLS: &str = "l.id, l.name, l.phone, l.email, l.service_interest, l.event_date, \
     l.budget, l.source, l.notes, l.priority, l.status, l.follow_up_date, l.created_at, \
     l.updated_at";

type BoxedParams = Vec<Box<dyn rusqlite::types::ToSql>>;

// ── Services ──

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        duration_hours: row.get(5)?,
        features: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Looks a service up by machine name, display name or numeric id, so the
/// booking form can send whichever identifier it has.
pub fn get_service(conn: &Connection, ident: &str) -> anyhow::Result<Option<Service>> {
    let numeric_id: i64 = ident.parse().unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, name, display_name, description, price, duration_hours, features, is_active, created_at
         FROM services WHERE (name = ?1 OR display_name = ?1 OR id = ?2) AND is_active = 1",
    )?;

    let result = stmt.query_row(params![ident, numeric_id], |row| Ok(parse_service_row(row)));
    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Users & sessions ──

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        role: Role::parse(&role),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLS} FROM users u WHERE u.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], |row| Ok(parse_user_row(row)));
    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLS} FROM users u WHERE u.email = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![email], |row| Ok(parse_user_row(row)));
    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_user(
    conn: &Connection,
    name: &str,
    email: &str,
    phone: Option<&str>,
    password_hash: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (name, email, phone, password_hash, role) VALUES (?1, ?2, ?3, ?4, 'customer')",
        params![name, email, phone, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn ensure_admin_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO users (name, email, password_hash, role) VALUES (?1, ?2, ?3, 'admin')",
        params![name, email, password_hash],
    )?;
    Ok(())
}

pub fn update_user_profile(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    phone: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET name = COALESCE(?1, name), phone = COALESCE(?2, phone),
         updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
        params![name, phone, id],
    )?;
    Ok(())
}

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: i64,
    expires_at: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at],
    )?;
    Ok(())
}

pub fn get_session_user(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    let sql = format!(
        "SELECT {USER_COLS} FROM sessions s JOIN users u ON s.user_id = u.id
         WHERE s.token = ?1 AND s.expires_at > datetime('now')"
    );
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![token], |row| Ok(parse_user_row(row)));
    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_session(conn: &Connection, token: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

// ── Bookings ──

/// Booking joined with its service (and, on admin listings, the account that
/// placed it). Serializes flat so clients see one object per booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub service_name: String,
    pub service_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_features: Option<Vec<String>>,
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let payment_status: String = row.get(14)?;
    let booking_status: String = row.get(15)?;
    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        service_id: row.get(2)?,
        customer_name: row.get(3)?,
        customer_email: row.get(4)?,
        customer_phone: row.get(5)?,
        alt_phone: row.get(6)?,
        event_date: row.get(7)?,
        event_time: row.get(8)?,
        event_location: row.get(9)?,
        venue_address: row.get(10)?,
        special_requirements: row.get(11)?,
        total_amount: row.get(12)?,
        advance_amount: row.get(13)?,
        payment_status: PaymentStatus::parse(&payment_status).unwrap_or(PaymentStatus::Pending),
        booking_status: BookingStatus::parse(&booking_status).unwrap_or(BookingStatus::Pending),
        razorpay_order_id: row.get(16)?,
        razorpay_payment_id: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}

/// A slot is taken only while a booking in it is confirmed or underway.
/// Pending bookings do not block the slot until payment lands.
pub fn slot_taken(conn: &Connection, event_date: &str, event_time: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE event_date = ?1 AND event_time = ?2
           AND booking_status IN ('confirmed', 'in_progress')",
        params![event_date, event_time],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub struct NewBooking<'a> {
    pub user_id: Option<i64>,
    pub service_id: i64,
    pub customer_name: &'a str,
    pub customer_email: &'a str,
    pub customer_phone: &'a str,
    pub alt_phone: Option<&'a str>,
    pub event_date: &'a str,
    pub event_time: &'a str,
    pub event_location: &'a str,
    pub special_requirements: Option<&'a str>,
    pub total_amount: i64,
}

pub fn insert_booking(conn: &Connection, b: &NewBooking) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (user_id, service_id, customer_name, customer_email, customer_phone,
             alt_phone, event_date, event_time, event_location, special_requirements, total_amount,
             payment_status, booking_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'pending', 'pending')",
        params![
            b.user_id,
            b.service_id,
            b.customer_name,
            b.customer_email,
            b.customer_phone,
            b.alt_phone,
            b.event_date,
            b.event_time,
            b.event_location,
            b.special_requirements,
            b.total_amount,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLS} FROM bookings b WHERE b.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], |row| Ok(parse_booking_row(row)));
    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_owned(
    conn: &Connection,
    id: i64,
    user_id: i64,
) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLS} FROM bookings b WHERE b.id = ?1 AND b.user_id = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id, user_id], |row| Ok(parse_booking_row(row)));
    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_detail(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingDetail>> {
    let sql = format!(
        "SELECT {BOOKING_COLS}, COALESCE(s.display_name, s.name), s.price
         FROM bookings b JOIN services s ON b.service_id = s.id WHERE b.id = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], |row| {
        Ok((
            parse_booking_row(row),
            row.get::<_, String>(20)?,
            row.get::<_, i64>(21)?,
        ))
    });
    match result {
        Ok((booking, service_name, service_price)) => Ok(Some(BookingDetail {
            booking: booking?,
            service_name,
            service_price,
            user_name: None,
            user_email: None,
            service_features: None,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub struct BookingFilter {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

pub fn list_bookings_admin(
    conn: &Connection,
    filter: &BookingFilter,
) -> anyhow::Result<(Vec<BookingDetail>, i64)> {
    let mut clauses: Vec<&str> = vec![];
    let mut query_params: BoxedParams = vec![];

    if let Some(status) = &filter.status {
        clauses.push("b.booking_status = ?");
        query_params.push(Box::new(status.clone()));
    }
    if let Some(from) = &filter.date_from {
        clauses.push("b.event_date >= ?");
        query_params.push(Box::new(from.clone()));
    }
    if let Some(to) = &filter.date_to {
        clauses.push("b.event_date <= ?");
        query_params.push(Box::new(to.clone()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM bookings b {where_sql}");
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, params_refs.as_slice(), |row| row.get(0))?;

    let sql = format!(
        "SELECT {BOOKING_COLS}, COALESCE(s.display_name, s.name), s.price, u.name, u.email
         FROM bookings b
         JOIN services s ON b.service_id = s.id
         LEFT JOIN users u ON b.user_id = u.id
         {where_sql}
         ORDER BY b.created_at DESC
         LIMIT ? OFFSET ?"
    );
    query_params.push(Box::new(filter.limit));
    query_params.push(Box::new(filter.offset));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((
            parse_booking_row(row),
            row.get::<_, String>(20)?,
            row.get::<_, i64>(21)?,
            row.get::<_, Option<String>>(22)?,
            row.get::<_, Option<String>>(23)?,
        ))
    })?;

    let mut bookings = vec![];
    for row in rows {
        let (booking, service_name, service_price, user_name, user_email) = row?;
        bookings.push(BookingDetail {
            booking: booking?,
            service_name,
            service_price,
            user_name,
            user_email,
            service_features: None,
        });
    }
    Ok((bookings, total))
}

pub fn list_user_bookings(
    conn: &Connection,
    user_id: i64,
    status: Option<&str>,
) -> anyhow::Result<Vec<BookingDetail>> {
    let mut sql = format!(
        "SELECT {BOOKING_COLS}, COALESCE(s.display_name, s.name), s.price, s.features
         FROM bookings b JOIN services s ON b.service_id = s.id
         WHERE b.user_id = ?1"
    );
    let mut query_params: BoxedParams = vec![Box::new(user_id)];
    if let Some(status) = status {
        sql.push_str(" AND b.booking_status = ?2");
        query_params.push(Box::new(status.to_string()));
    }
    sql.push_str(" ORDER BY b.event_date DESC");

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((
            parse_booking_row(row),
            row.get::<_, String>(20)?,
            row.get::<_, i64>(21)?,
            row.get::<_, Option<String>>(22)?,
        ))
    })?;

    let mut bookings = vec![];
    for row in rows {
        let (booking, service_name, service_price, features) = row?;
        bookings.push(BookingDetail {
            booking: booking?,
            service_name,
            service_price,
            user_name: None,
            user_email: None,
            service_features: Some(
                features
                    .as_deref()
                    .and_then(|raw| serde_json::from_str(raw).ok())
                    .unwrap_or_default(),
            ),
        });
    }
    Ok(bookings)
}

pub fn admin_update_booking(
    conn: &Connection,
    id: i64,
    booking_status: Option<&str>,
    payment_status: Option<&str>,
    notes: Option<&str>,
) -> anyhow::Result<bool> {
    let mut sets: Vec<&str> = vec!["updated_at = CURRENT_TIMESTAMP"];
    let mut query_params: BoxedParams = vec![];

    if let Some(s) = booking_status {
        sets.push("booking_status = ?");
        query_params.push(Box::new(s.to_string()));
    }
    if let Some(s) = payment_status {
        sets.push("payment_status = ?");
        query_params.push(Box::new(s.to_string()));
    }
    if let Some(n) = notes {
        sets.push("special_requirements = ?");
        query_params.push(Box::new(n.to_string()));
    }
    query_params.push(Box::new(id));

    let sql = format!("UPDATE bookings SET {} WHERE id = ?", sets.join(", "));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let count = conn.execute(&sql, params_refs.as_slice())?;
    Ok(count > 0)
}

pub fn cancel_booking(conn: &Connection, id: i64, reason: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings
         SET booking_status = 'cancelled',
             special_requirements = COALESCE(special_requirements, '') || ' | Cancellation reason: ' || ?1,
             updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2",
        params![reason, id],
    )?;
    Ok(())
}

pub fn mark_booking_paid(conn: &Connection, id: i64, payment_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings
         SET payment_status = 'paid', booking_status = 'confirmed',
             razorpay_payment_id = ?1, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2",
        params![payment_id, id],
    )?;
    Ok(())
}

// ── Booking analytics ──

#[derive(Debug, Serialize)]
pub struct PopularService {
    pub service_name: String,
    pub bookings: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentBooking {
    pub id: i64,
    pub customer_name: String,
    pub event_date: String,
    pub booking_status: String,
    pub service_name: String,
    pub total_amount: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub bookings: i64,
    pub revenue: i64,
}

/// (total, confirmed, pending, completed)
pub fn booking_counts(conn: &Connection) -> anyhow::Result<(i64, i64, i64, i64)> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN booking_status = 'confirmed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN booking_status = 'pending' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN booking_status = 'completed' THEN 1 ELSE 0 END), 0)
         FROM bookings",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )
    .map_err(Into::into)
}

/// Revenue counts money that actually arrived: paid plus partial.
pub fn revenue_totals(conn: &Connection) -> anyhow::Result<(i64, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(total_amount), 0) FROM bookings
         WHERE payment_status IN ('paid', 'partial')",
        [],
        |row| row.get(0),
    )?;
    let monthly: i64 = conn.query_row(
        "SELECT COALESCE(SUM(total_amount), 0) FROM bookings
         WHERE payment_status IN ('paid', 'partial')
           AND strftime('%Y-%m', created_at) = strftime('%Y-%m', 'now')",
        [],
        |row| row.get(0),
    )?;
    Ok((total, monthly))
}

pub fn popular_services(conn: &Connection, limit: i64) -> anyhow::Result<Vec<PopularService>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(s.display_name, s.name), COUNT(*), COALESCE(SUM(b.total_amount), 0)
         FROM bookings b JOIN services s ON b.service_id = s.id
         GROUP BY s.id ORDER BY COUNT(*) DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(PopularService {
            service_name: row.get(0)?,
            bookings: row.get(1)?,
            revenue: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn recent_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<RecentBooking>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.customer_name, b.event_date, b.booking_status,
                COALESCE(s.display_name, s.name), b.total_amount, b.created_at
         FROM bookings b JOIN services s ON b.service_id = s.id
         ORDER BY b.created_at DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(RecentBooking {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            event_date: row.get(2)?,
            booking_status: row.get(3)?,
            service_name: row.get(4)?,
            total_amount: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn monthly_trends(conn: &Connection, months: i64) -> anyhow::Result<Vec<MonthlyTrend>> {
    let modifier = format!("-{months} months");
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*),
                COALESCE(SUM(CASE WHEN payment_status IN ('paid', 'partial')
                              THEN total_amount ELSE 0 END), 0)
         FROM bookings WHERE created_at >= date('now', ?1)
         GROUP BY month ORDER BY month",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok(MonthlyTrend {
            month: row.get(0)?,
            bookings: row.get(1)?,
            revenue: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Payments ──

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetail {
    #[serde(flatten)]
    pub payment: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<Payment> {
    let status: String = row.get(5)?;
    Ok(Payment {
        id: row.get(0)?,
        order_id: row.get(1)?,
        booking_id: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        status: PaymentState::parse(&status).unwrap_or(PaymentState::Created),
        payment_id: row.get(6)?,
        signature: row.get(7)?,
        customer_name: row.get(8)?,
        customer_email: row.get(9)?,
        customer_phone: row.get(10)?,
        gateway: row.get(11)?,
        created_at: row.get(12)?,
        completed_at: row.get(13)?,
    })
}

pub fn insert_payment(
    conn: &Connection,
    order_id: &str,
    booking_id: Option<i64>,
    amount: i64,
    customer_name: Option<&str>,
    customer_email: Option<&str>,
    customer_phone: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO payments (order_id, booking_id, amount, customer_name, customer_email, customer_phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![order_id, booking_id, amount, customer_name, customer_email, customer_phone],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Records the verified payment against its order. Overwrites on replay so a
/// retried callback converges to the same state.
pub fn complete_payment(
    conn: &Connection,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE payments
         SET status = 'completed', payment_id = ?1, signature = ?2,
             completed_at = CURRENT_TIMESTAMP
         WHERE order_id = ?3",
        params![payment_id, signature, order_id],
    )?;
    Ok(count)
}

pub fn get_payment_by_order(conn: &Connection, order_id: &str) -> anyhow::Result<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLS} FROM payments p WHERE p.order_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![order_id], |row| Ok(parse_payment_row(row)));
    match result {
        Ok(payment) => Ok(Some(payment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch by internal row id or by the gateway payment id, whichever the
/// caller has in hand.
pub fn get_payment_detail(conn: &Connection, ident: &str) -> anyhow::Result<Option<PaymentDetail>> {
    let numeric_id: i64 = ident.parse().unwrap_or(-1);
    let sql = format!(
        "SELECT {PAYMENT_COLS}, b.customer_name, b.event_date
         FROM payments p LEFT JOIN bookings b ON p.booking_id = b.id
         WHERE p.id = ?1 OR p.payment_id = ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![numeric_id, ident], |row| {
        Ok((
            parse_payment_row(row),
            row.get::<_, Option<String>>(14)?,
            row.get::<_, Option<String>>(15)?,
        ))
    });
    match result {
        Ok((payment, booking_customer, event_date)) => Ok(Some(PaymentDetail {
            payment: payment?,
            booking_customer,
            event_date,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_payments(
    conn: &Connection,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<PaymentDetail>, i64)> {
    let mut where_sql = String::new();
    let mut query_params: BoxedParams = vec![];
    if let Some(status) = status {
        where_sql.push_str("WHERE p.status = ?");
        query_params.push(Box::new(status.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM payments p {where_sql}");
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, params_refs.as_slice(), |row| row.get(0))?;

    let sql = format!(
        "SELECT {PAYMENT_COLS}, b.customer_name, b.event_date
         FROM payments p LEFT JOIN bookings b ON p.booking_id = b.id
         {where_sql}
         ORDER BY p.created_at DESC
         LIMIT ? OFFSET ?"
    );
    query_params.push(Box::new(limit));
    query_params.push(Box::new(offset));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((
            parse_payment_row(row),
            row.get::<_, Option<String>>(14)?,
            row.get::<_, Option<String>>(15)?,
        ))
    })?;

    let mut payments = vec![];
    for row in rows {
        let (payment, booking_customer, event_date) = row?;
        payments.push(PaymentDetail {
            payment: payment?,
            booking_customer,
            event_date,
        });
    }
    Ok((payments, total))
}

// ── Reviews ──

const REVIEW_COLS: &str =
    "id, booking_id, customer_name, customer_email, rating, review_text, is_approved, is_featured, created_at";

#[derive(Debug, Serialize)]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub average_rating: f64,
    pub five_star: i64,
    pub four_star: i64,
    pub three_star: i64,
    pub two_star: i64,
    pub one_star: i64,
}

fn parse_review_row(row: &rusqlite::Row) -> anyhow::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        rating: row.get(4)?,
        review_text: row.get(5)?,
        is_approved: row.get(6)?,
        is_featured: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn list_approved_reviews(conn: &Connection) -> anyhow::Result<Vec<Review>> {
    let sql =
        format!("SELECT {REVIEW_COLS} FROM reviews WHERE is_approved = 1 ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_review_row(row)))?;
    let mut reviews = vec![];
    for row in rows {
        reviews.push(row??);
    }
    Ok(reviews)
}

pub fn featured_reviews(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Review>> {
    let sql = format!(
        "SELECT {REVIEW_COLS} FROM reviews WHERE is_approved = 1 AND is_featured = 1
         ORDER BY created_at DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_review_row(row)))?;
    let mut reviews = vec![];
    for row in rows {
        reviews.push(row??);
    }
    Ok(reviews)
}

pub fn list_all_reviews(conn: &Connection) -> anyhow::Result<Vec<Review>> {
    let sql = format!("SELECT {REVIEW_COLS} FROM reviews ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_review_row(row)))?;
    let mut reviews = vec![];
    for row in rows {
        reviews.push(row??);
    }
    Ok(reviews)
}

pub fn insert_review(
    conn: &Connection,
    booking_id: Option<i64>,
    customer_name: &str,
    customer_email: Option<&str>,
    rating: i64,
    review_text: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO reviews (booking_id, customer_name, customer_email, rating, review_text, is_approved, is_featured)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, 0)",
        params![booking_id, customer_name, customer_email, rating, review_text],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn review_stats(conn: &Connection) -> anyhow::Result<ReviewStats> {
    let (total, avg, five, four, three, two, one): (i64, f64, i64, i64, i64, i64, i64) = conn
        .query_row(
            "SELECT COUNT(*),
                COALESCE(AVG(rating), 0),
                COALESCE(SUM(CASE WHEN rating = 5 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN rating = 4 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN rating = 3 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN rating = 2 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN rating = 1 THEN 1 ELSE 0 END), 0)
         FROM reviews WHERE is_approved = 1",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )?;
    Ok(ReviewStats {
        total_reviews: total,
        average_rating: (avg * 10.0).round() / 10.0,
        five_star: five,
        four_star: four,
        three_star: three,
        two_star: two,
        one_star: one,
    })
}

pub fn approve_review(conn: &Connection, id: i64, featured: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE reviews SET is_approved = 1, is_featured = ?1 WHERE id = ?2",
        params![featured, id],
    )?;
    Ok(count > 0)
}

pub fn toggle_review_featured(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE reviews SET is_featured = CASE WHEN is_featured = 1 THEN 0 ELSE 1 END WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn delete_review(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Contact messages ──

const MESSAGE_COLS: &str =
    "id, name, email, phone, subject, message, is_read, replied, created_at";

#[derive(Debug, Serialize)]
pub struct ContactStats {
    pub total_messages: i64,
    pub unread_messages: i64,
    pub replied_messages: i64,
    pub today_messages: i64,
}

fn parse_message_row(row: &rusqlite::Row) -> anyhow::Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        subject: row.get(4)?,
        message: row.get(5)?,
        is_read: row.get(6)?,
        replied: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn insert_contact_message(
    conn: &Connection,
    name: &str,
    email: &str,
    phone: Option<&str>,
    subject: &str,
    message: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO contact_messages (name, email, phone, subject, message) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, email, phone, subject, message],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_contact_messages(
    conn: &Connection,
    is_read: Option<bool>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<ContactMessage>, i64)> {
    let mut where_sql = String::new();
    let mut query_params: BoxedParams = vec![];
    if let Some(is_read) = is_read {
        where_sql.push_str("WHERE is_read = ?");
        query_params.push(Box::new(is_read));
    }

    let count_sql = format!("SELECT COUNT(*) FROM contact_messages {where_sql}");
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, params_refs.as_slice(), |row| row.get(0))?;

    let sql = format!(
        "SELECT {MESSAGE_COLS} FROM contact_messages {where_sql}
         ORDER BY created_at DESC LIMIT ? OFFSET ?"
    );
    query_params.push(Box::new(limit));
    query_params.push(Box::new(offset));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_message_row(row)))?;
    let mut messages = vec![];
    for row in rows {
        messages.push(row??);
    }
    Ok((messages, total))
}

pub fn get_contact_message(conn: &Connection, id: i64) -> anyhow::Result<Option<ContactMessage>> {
    let sql = format!("SELECT {MESSAGE_COLS} FROM contact_messages WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], |row| Ok(parse_message_row(row)));
    match result {
        Ok(message) => Ok(Some(message?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn mark_message_read(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE contact_messages SET is_read = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

/// Replying implies the message was read.
pub fn mark_message_replied(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE contact_messages SET replied = 1, is_read = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn delete_contact_message(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM contact_messages WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn contact_stats(conn: &Connection) -> anyhow::Result<ContactStats> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN replied = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN date(created_at) = date('now') THEN 1 ELSE 0 END), 0)
         FROM contact_messages",
        [],
        |row| {
            Ok(ContactStats {
                total_messages: row.get(0)?,
                unread_messages: row.get(1)?,
                replied_messages: row.get(2)?,
                today_messages: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

pub fn recent_contact_messages(
    conn: &Connection,
    limit: i64,
) -> anyhow::Result<Vec<ContactMessage>> {
    let sql =
        format!("SELECT {MESSAGE_COLS} FROM contact_messages ORDER BY created_at DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_message_row(row)))?;
    let mut messages = vec![];
    for row in rows {
        messages.push(row??);
    }
    Ok(messages)
}

// ── Expenses & dashboard ──

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub total_revenue: i64,
    pub monthly_revenue: i64,
    pub pending_bookings: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyPnl {
    pub month: String,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
}

fn parse_expense_row(row: &rusqlite::Row) -> anyhow::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn list_expenses(conn: &Connection) -> anyhow::Result<(Vec<Expense>, f64)> {
    let mut stmt = conn.prepare(
        "SELECT id, date, description, amount, category, created_at
         FROM expenses ORDER BY date DESC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_expense_row(row)))?;
    let mut expenses = vec![];
    for row in rows {
        expenses.push(row??);
    }
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses",
        [],
        |row| row.get(0),
    )?;
    Ok((expenses, total))
}

pub fn insert_expense(
    conn: &Connection,
    date: &str,
    description: &str,
    amount: f64,
    category: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO expenses (date, description, amount, category) VALUES (?1, ?2, ?3, ?4)",
        params![date, description, amount, category],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Snapshot for the admin dashboard. Unlike the analytics view this counts
/// fully paid bookings only.
pub fn dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN payment_status = 'paid' THEN total_amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN payment_status = 'paid'
                              AND strftime('%Y-%m', created_at) = strftime('%Y-%m', 'now')
                              THEN total_amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN payment_status = 'pending' THEN 1 ELSE 0 END), 0)
         FROM bookings",
        [],
        |row| {
            Ok(DashboardStats {
                total_bookings: row.get(0)?,
                total_revenue: row.get(1)?,
                monthly_revenue: row.get(2)?,
                pending_bookings: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

pub fn monthly_pnl(conn: &Connection, months: i64) -> anyhow::Result<Vec<MonthlyPnl>> {
    let modifier = format!("-{months} months");

    let mut by_month: std::collections::BTreeMap<String, (f64, f64)> = Default::default();

    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', created_at) AS month, SUM(total_amount)
         FROM bookings WHERE payment_status = 'paid' AND created_at >= date('now', ?1)
         GROUP BY month",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    for row in rows {
        let (month, revenue) = row?;
        by_month.entry(month).or_insert((0.0, 0.0)).0 = revenue;
    }

    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', date) AS month, SUM(amount)
         FROM expenses WHERE date >= date('now', ?1)
         GROUP BY month",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    for row in rows {
        let (month, spent) = row?;
        by_month.entry(month).or_insert((0.0, 0.0)).1 = spent;
    }

    Ok(by_month
        .into_iter()
        .map(|(month, (revenue, expenses))| MonthlyPnl {
            month,
            revenue,
            expenses,
            profit: revenue - expenses,
        })
        .collect())
}

// ── Reports ──

#[derive(Debug, Serialize)]
pub struct GstRow {
    pub id: i64,
    pub customer_name: String,
    pub event_date: String,
    pub total_amount: i64,
    pub taxable_amount: f64,
    pub gst_amount: f64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerRow {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub total_bookings: i64,
    pub total_spent: i64,
    pub avg_booking_value: f64,
    pub first_booking: String,
    pub last_booking: String,
}

#[derive(Debug, Serialize)]
pub struct ServicePerfRow {
    pub service_name: String,
    pub bookings_count: i64,
    pub total_revenue: i64,
    pub avg_price: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReportRow {
    pub month: String,
    pub total_bookings: i64,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

pub fn gst_rows(conn: &Connection, start: &str, end: &str) -> anyhow::Result<Vec<GstRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_name, event_date, total_amount, created_at
         FROM bookings
         WHERE payment_status = 'paid' AND date(created_at) BETWEEN date(?1) AND date(?2)
         ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![start, end], |row| {
        let total_amount: i64 = row.get(3)?;
        let gst_amount = total_amount as f64 * 0.18;
        Ok(GstRow {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            event_date: row.get(2)?,
            total_amount,
            taxable_amount: total_amount as f64 - gst_amount,
            gst_amount,
            created_at: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn paid_revenue_between(conn: &Connection, start: &str, end: &str) -> anyhow::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(total_amount), 0) FROM bookings
         WHERE payment_status = 'paid' AND date(created_at) BETWEEN date(?1) AND date(?2)",
        params![start, end],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn expenses_between(conn: &Connection, start: &str, end: &str) -> anyhow::Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses
         WHERE date(date) BETWEEN date(?1) AND date(?2)",
        params![start, end],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn customer_report(conn: &Connection) -> anyhow::Result<Vec<CustomerRow>> {
    let mut stmt = conn.prepare(
        "SELECT customer_name, customer_phone, customer_email, COUNT(*),
                COALESCE(SUM(CASE WHEN payment_status = 'paid' THEN total_amount ELSE 0 END), 0),
                ROUND(AVG(total_amount), 2),
                MIN(created_at), MAX(created_at)
         FROM bookings
         GROUP BY customer_name, customer_phone
         ORDER BY 5 DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CustomerRow {
            customer_name: row.get(0)?,
            customer_phone: row.get(1)?,
            customer_email: row.get(2)?,
            total_bookings: row.get(3)?,
            total_spent: row.get(4)?,
            avg_booking_value: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
            first_booking: row.get(6)?,
            last_booking: row.get(7)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn service_performance(conn: &Connection) -> anyhow::Result<Vec<ServicePerfRow>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(s.display_name, s.name), COUNT(b.id),
                COALESCE(SUM(CASE WHEN b.payment_status = 'paid' THEN b.total_amount ELSE 0 END), 0),
                ROUND(AVG(b.total_amount), 2),
                ROUND(SUM(CASE WHEN b.payment_status = 'paid' THEN 1 ELSE 0 END) * 100.0 / COUNT(b.id), 1)
         FROM services s LEFT JOIN bookings b ON b.service_id = s.id
         GROUP BY s.id
         ORDER BY 3 DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ServicePerfRow {
            service_name: row.get(0)?,
            bookings_count: row.get(1)?,
            total_revenue: row.get(2)?,
            avg_price: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            conversion_rate: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn monthly_report(conn: &Connection, months: i64) -> anyhow::Result<Vec<MonthlyReportRow>> {
    let modifier = format!("-{months} months");

    let mut by_month: std::collections::BTreeMap<String, (i64, f64, f64)> = Default::default();

    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*),
                COALESCE(SUM(CASE WHEN payment_status = 'paid' THEN total_amount ELSE 0 END), 0)
         FROM bookings WHERE created_at >= date('now', ?1)
         GROUP BY month",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;
    for row in rows {
        let (month, bookings, revenue) = row?;
        let entry = by_month.entry(month).or_insert((0, 0.0, 0.0));
        entry.0 = bookings;
        entry.1 = revenue;
    }

    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', date) AS month, SUM(amount)
         FROM expenses WHERE date >= date('now', ?1)
         GROUP BY month",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    for row in rows {
        let (month, spent) = row?;
        by_month.entry(month).or_insert((0, 0.0, 0.0)).2 = spent;
    }

    Ok(by_month
        .into_iter()
        .map(|(month, (total_bookings, revenue, expenses))| {
            let profit = revenue - expenses;
            let profit_margin = if revenue > 0.0 {
                (profit * 1000.0 / revenue).round() / 10.0
            } else {
                0.0
            };
            MonthlyReportRow {
                month,
                total_bookings,
                revenue,
                expenses,
                profit,
                profit_margin,
            }
        })
        .collect())
}

// ── Leads ──

#[derive(Debug, Serialize)]
pub struct FunnelStage {
    pub status: String,
    pub count: i64,
    pub avg_budget: f64,
}

#[derive(Debug, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub total_leads: i64,
    pub converted: i64,
    pub conversion_rate: f64,
    pub avg_budget: f64,
}

#[derive(Debug, Serialize)]
pub struct LeadMetrics {
    pub total_leads: i64,
    pub won_leads: i64,
    pub lost_leads: i64,
    pub overall_conversion_rate: f64,
    pub avg_deal_size: f64,
    pub total_pipeline_value: f64,
}

/// A lead with the action scheduled for today attached.
#[derive(Debug, Serialize)]
pub struct FollowUp {
    #[serde(flatten)]
    pub lead: Lead,
    pub next_action: Option<String>,
    pub next_action_date: Option<String>,
}

fn parse_lead_row(row: &rusqlite::Row) -> anyhow::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        service_interest: row.get(4)?,
        event_date: row.get(5)?,
        budget: row.get(6)?,
        source: row.get(7)?,
        notes: row.get(8)?,
        priority: row.get(9)?,
        status: row.get(10)?,
        follow_up_date: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub fn list_leads(conn: &Connection) -> anyhow::Result<Vec<Lead>> {
    let sql = format!("SELECT {LEAD_COLS} FROM leads l ORDER BY l.created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_lead_row(row)))?;
    let mut leads = vec![];
    for row in rows {
        leads.push(row??);
    }
    Ok(leads)
}

pub fn get_lead(conn: &Connection, id: i64) -> anyhow::Result<Option<Lead>> {
    let sql = format!("SELECT {LEAD_COLS} FROM leads l WHERE l.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], |row| Ok(parse_lead_row(row)));
    match result {
        Ok(lead) => Ok(Some(lead?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub struct NewLead<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: Option<&'a str>,
    pub service_interest: Option<&'a str>,
    pub event_date: Option<&'a str>,
    pub budget: Option<f64>,
    pub source: &'a str,
    pub notes: Option<&'a str>,
    pub priority: &'a str,
    pub follow_up_date: Option<&'a str>,
}

pub fn insert_lead(conn: &Connection, lead: &NewLead) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO leads (name, phone, email, service_interest, event_date, budget, source,
             notes, priority, status, follow_up_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'new', ?10)",
        params![
            lead.name,
            lead.phone,
            lead.email,
            lead.service_interest,
            lead.event_date,
            lead.budget,
            lead.source,
            lead.notes,
            lead.priority,
            lead.follow_up_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_lead(
    conn: &Connection,
    id: i64,
    status: Option<&str>,
    notes: Option<&str>,
    follow_up_date: Option<&str>,
) -> anyhow::Result<bool> {
    let mut sets: Vec<&str> = vec!["updated_at = CURRENT_TIMESTAMP"];
    let mut query_params: BoxedParams = vec![];

    if let Some(status) = status {
        sets.push("status = ?");
        query_params.push(Box::new(status.to_string()));
    }
    if let Some(notes) = notes {
        sets.push("notes = ?");
        query_params.push(Box::new(notes.to_string()));
    }
    if let Some(date) = follow_up_date {
        sets.push("follow_up_date = ?");
        query_params.push(Box::new(date.to_string()));
    }
    query_params.push(Box::new(id));

    let sql = format!("UPDATE leads SET {} WHERE id = ?", sets.join(", "));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let count = conn.execute(&sql, params_refs.as_slice())?;
    Ok(count > 0)
}

pub fn insert_lead_activity(
    conn: &Connection,
    lead_id: i64,
    activity_type: &str,
    description: &str,
    next_action: Option<&str>,
    next_action_date: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO lead_activities (lead_id, activity_type, description, next_action, next_action_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![lead_id, activity_type, description, next_action, next_action_date],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_lead_activities(conn: &Connection, lead_id: i64) -> anyhow::Result<Vec<LeadActivity>> {
    let mut stmt = conn.prepare(
        "SELECT id, lead_id, activity_type, description, next_action, next_action_date, created_at
         FROM lead_activities WHERE lead_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![lead_id], |row| {
        Ok(LeadActivity {
            id: row.get(0)?,
            lead_id: row.get(1)?,
            activity_type: row.get(2)?,
            description: row.get(3)?,
            next_action: row.get(4)?,
            next_action_date: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn lead_funnel(conn: &Connection) -> anyhow::Result<Vec<FunnelStage>> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*), COALESCE(ROUND(AVG(budget), 2), 0)
         FROM leads GROUP BY status
         ORDER BY CASE status
             WHEN 'new' THEN 1 WHEN 'contacted' THEN 2 WHEN 'qualified' THEN 3
             WHEN 'proposal_sent' THEN 4 WHEN 'negotiating' THEN 5
             WHEN 'won' THEN 6 WHEN 'lost' THEN 7 ELSE 8 END",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(FunnelStage {
            status: row.get(0)?,
            count: row.get(1)?,
            avg_budget: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn lead_sources(conn: &Connection) -> anyhow::Result<Vec<SourceStats>> {
    let mut stmt = conn.prepare(
        "SELECT source, COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'won' THEN 1 ELSE 0 END), 0),
                ROUND(SUM(CASE WHEN status = 'won' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 1),
                COALESCE(ROUND(AVG(budget), 2), 0)
         FROM leads GROUP BY source
         ORDER BY 4 DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SourceStats {
            source: row.get(0)?,
            total_leads: row.get(1)?,
            converted: row.get(2)?,
            conversion_rate: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            avg_budget: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn todays_follow_ups(conn: &Connection) -> anyhow::Result<Vec<FollowUp>> {
    let sql = format!(
        "SELECT {LEAD_COLS}, a.next_action, a.next_action_date
         FROM leads l JOIN lead_activities a ON a.lead_id = l.id
         WHERE date(a.next_action_date) = date('now') AND l.status NOT IN ('won', 'lost')
         ORDER BY a.next_action_date ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            parse_lead_row(row),
            row.get::<_, Option<String>>(14)?,
            row.get::<_, Option<String>>(15)?,
        ))
    })?;
    let mut follow_ups = vec![];
    for row in rows {
        let (lead, next_action, next_action_date) = row?;
        follow_ups.push(FollowUp {
            lead: lead?,
            next_action,
            next_action_date,
        });
    }
    Ok(follow_ups)
}

pub fn lead_metrics(conn: &Connection) -> anyhow::Result<LeadMetrics> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'won' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'lost' THEN 1 ELSE 0 END), 0),
                ROUND(SUM(CASE WHEN status = 'won' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 1),
                COALESCE(ROUND(AVG(CASE WHEN status = 'won' THEN budget END), 2), 0),
                COALESCE(SUM(CASE WHEN status = 'won' THEN budget ELSE 0 END), 0)
         FROM leads",
        [],
        |row| {
            Ok(LeadMetrics {
                total_leads: row.get(0)?,
                won_leads: row.get(1)?,
                lost_leads: row.get(2)?,
                overall_conversion_rate: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                avg_deal_size: row.get(4)?,
                total_pipeline_value: row.get(5)?,
            })
        },
    )
    .map_err(Into::into)
}

// ── Equipment ──

const EQUIPMENT_COLS: &str = "id, name, category, brand, model, purchase_date, purchase_price, \
     current_value, condition_status, location, notes, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct DepreciationRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub purchase_date: Option<String>,
    pub purchase_price: f64,
    pub current_value: f64,
    pub depreciated_amount: f64,
    pub depreciation_percentage: f64,
    pub age_years: f64,
}

fn parse_equipment_row(row: &rusqlite::Row) -> anyhow::Result<Equipment> {
    Ok(Equipment {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        brand: row.get(3)?,
        model: row.get(4)?,
        purchase_date: row.get(5)?,
        purchase_price: row.get(6)?,
        current_value: row.get(7)?,
        condition_status: row.get(8)?,
        location: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

pub fn list_equipment(conn: &Connection) -> anyhow::Result<Vec<Equipment>> {
    let sql = format!("SELECT {EQUIPMENT_COLS} FROM equipment ORDER BY category, name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_equipment_row(row)))?;
    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}

pub fn get_equipment(conn: &Connection, id: i64) -> anyhow::Result<Option<Equipment>> {
    let sql = format!("SELECT {EQUIPMENT_COLS} FROM equipment WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], |row| Ok(parse_equipment_row(row)));
    match result {
        Ok(item) => Ok(Some(item?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub struct NewEquipment<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub brand: Option<&'a str>,
    pub model: Option<&'a str>,
    pub purchase_date: Option<&'a str>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub condition_status: &'a str,
    pub location: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn insert_equipment(conn: &Connection, item: &NewEquipment) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO equipment (name, category, brand, model, purchase_date, purchase_price,
             current_value, condition_status, location, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            item.name,
            item.category,
            item.brand,
            item.model,
            item.purchase_date,
            item.purchase_price,
            item.current_value,
            item.condition_status,
            item.location,
            item.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub struct EquipmentUpdate<'a> {
    pub name: Option<&'a str>,
    pub category: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub model: Option<&'a str>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub condition_status: Option<&'a str>,
    pub location: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn update_equipment(
    conn: &Connection,
    id: i64,
    update: &EquipmentUpdate,
) -> anyhow::Result<bool> {
    let mut sets: Vec<&str> = vec!["updated_at = CURRENT_TIMESTAMP"];
    let mut query_params: BoxedParams = vec![];

    if let Some(v) = update.name {
        sets.push("name = ?");
        query_params.push(Box::new(v.to_string()));
    }
    if let Some(v) = update.category {
        sets.push("category = ?");
        query_params.push(Box::new(v.to_string()));
    }
    if let Some(v) = update.brand {
        sets.push("brand = ?");
        query_params.push(Box::new(v.to_string()));
    }
    if let Some(v) = update.model {
        sets.push("model = ?");
        query_params.push(Box::new(v.to_string()));
    }
    if let Some(v) = update.purchase_price {
        sets.push("purchase_price = ?");
        query_params.push(Box::new(v));
    }
    if let Some(v) = update.current_value {
        sets.push("current_value = ?");
        query_params.push(Box::new(v));
    }
    if let Some(v) = update.condition_status {
        sets.push("condition_status = ?");
        query_params.push(Box::new(v.to_string()));
    }
    if let Some(v) = update.location {
        sets.push("location = ?");
        query_params.push(Box::new(v.to_string()));
    }
    if let Some(v) = update.notes {
        sets.push("notes = ?");
        query_params.push(Box::new(v.to_string()));
    }
    query_params.push(Box::new(id));

    let sql = format!("UPDATE equipment SET {} WHERE id = ?", sets.join(", "));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        query_params.iter().map(|p| p.as_ref()).collect();
    let count = conn.execute(&sql, params_refs.as_slice())?;
    Ok(count > 0)
}

pub fn list_maintenance(
    conn: &Connection,
    equipment_id: i64,
) -> anyhow::Result<Vec<MaintenanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, equipment_id, maintenance_date, description, cost, performed_by, next_due_date, created_at
         FROM equipment_maintenance WHERE equipment_id = ?1 ORDER BY maintenance_date DESC",
    )?;
    let rows = stmt.query_map(params![equipment_id], |row| {
        Ok(MaintenanceRecord {
            id: row.get(0)?,
            equipment_id: row.get(1)?,
            maintenance_date: row.get(2)?,
            description: row.get(3)?,
            cost: row.get(4)?,
            performed_by: row.get(5)?,
            next_due_date: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn insert_maintenance(
    conn: &Connection,
    equipment_id: i64,
    maintenance_date: &str,
    description: &str,
    cost: Option<f64>,
    performed_by: Option<&str>,
    next_due_date: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO equipment_maintenance (equipment_id, maintenance_date, description, cost, performed_by, next_due_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![equipment_id, maintenance_date, description, cost, performed_by, next_due_date],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_usage(
    conn: &Connection,
    equipment_id: i64,
    booking_id: Option<i64>,
    usage_date: &str,
    hours_used: Option<f64>,
    condition_after: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO equipment_usage (equipment_id, booking_id, usage_date, hours_used, condition_after)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![equipment_id, booking_id, usage_date, hours_used, condition_after],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn depreciation_report(conn: &Connection) -> anyhow::Result<Vec<DepreciationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, purchase_date, purchase_price,
                COALESCE(current_value, purchase_price),
                ROUND(purchase_price - COALESCE(current_value, purchase_price), 2),
                ROUND((purchase_price - COALESCE(current_value, purchase_price)) * 100.0 / purchase_price, 1),
                ROUND((julianday('now') - julianday(purchase_date)) / 365.25, 1)
         FROM equipment WHERE purchase_price > 0
         ORDER BY 8 DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DepreciationRow {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            purchase_date: row.get(3)?,
            purchase_price: row.get(4)?,
            current_value: row.get(5)?,
            depreciated_amount: row.get(6)?,
            depreciation_percentage: row.get(7)?,
            age_years: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Notifications ──

const NOTIFICATION_COLS: &str = "id, type, title, message, recipient_email, related_booking_id, \
     is_read, read_at, created_at";

fn parse_notification_row(row: &rusqlite::Row) -> anyhow::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        kind: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        recipient_email: row.get(4)?,
        related_booking_id: row.get(5)?,
        is_read: row.get(6)?,
        read_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn list_notifications(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Notification>> {
    let sql =
        format!("SELECT {NOTIFICATION_COLS} FROM notifications ORDER BY created_at DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_notification_row(row)))?;
    let mut notifications = vec![];
    for row in rows {
        notifications.push(row??);
    }
    Ok(notifications)
}

pub fn mark_notification_read(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE notifications SET is_read = 1, read_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn unread_notification_count(conn: &Connection) -> anyhow::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE is_read = 0",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn insert_notification(
    conn: &Connection,
    kind: &str,
    title: &str,
    message: &str,
    recipient_email: Option<&str>,
    related_booking_id: Option<i64>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO notifications (type, title, message, recipient_email, related_booking_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![kind, title, message, recipient_email, related_booking_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Skips the insert while an unread notification for the same subject is
/// still sitting in the list, so repeated generator runs do not pile up
/// duplicates.
pub fn insert_notification_if_absent(
    conn: &Connection,
    kind: &str,
    title: &str,
    message: &str,
    related_booking_id: Option<i64>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT INTO notifications (type, title, message, related_booking_id)
         SELECT ?1, ?2, ?3, ?4
         WHERE NOT EXISTS (
             SELECT 1 FROM notifications
             WHERE type = ?1 AND title = ?2 AND related_booking_id IS ?4 AND is_read = 0
         )",
        params![kind, title, message, related_booking_id],
    )?;
    Ok(count > 0)
}

#[derive(Debug)]
pub struct UpcomingEvent {
    pub id: i64,
    pub customer_name: String,
    pub event_date: String,
    pub service_name: String,
}

#[derive(Debug)]
pub struct StalePending {
    pub id: i64,
    pub customer_name: String,
    pub total_amount: i64,
}

#[derive(Debug)]
pub struct MaintenanceDue {
    pub equipment_name: String,
    pub next_due_date: String,
}

#[derive(Debug)]
pub struct ReminderBooking {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub event_date: String,
    pub event_time: String,
    pub event_location: String,
    pub service_name: String,
}

pub fn upcoming_paid_bookings(conn: &Connection, days: i64) -> anyhow::Result<Vec<UpcomingEvent>> {
    let modifier = format!("+{days} days");
    let mut stmt = conn.prepare(
        "SELECT b.id, b.customer_name, b.event_date, COALESCE(s.display_name, s.name)
         FROM bookings b JOIN services s ON b.service_id = s.id
         WHERE b.payment_status = 'paid'
           AND date(b.event_date) BETWEEN date('now') AND date('now', ?1)
         ORDER BY b.event_date ASC",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok(UpcomingEvent {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            event_date: row.get(2)?,
            service_name: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn stale_pending_bookings(conn: &Connection, hours: i64) -> anyhow::Result<Vec<StalePending>> {
    let modifier = format!("-{hours} hours");
    let mut stmt = conn.prepare(
        "SELECT id, customer_name, total_amount FROM bookings
         WHERE payment_status = 'pending' AND booking_status != 'cancelled'
           AND created_at < datetime('now', ?1)",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok(StalePending {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            total_amount: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn maintenance_due(conn: &Connection, days: i64) -> anyhow::Result<Vec<MaintenanceDue>> {
    let modifier = format!("+{days} days");
    let mut stmt = conn.prepare(
        "SELECT e.name, m.next_due_date
         FROM equipment_maintenance m JOIN equipment e ON m.equipment_id = e.id
         WHERE m.next_due_date IS NOT NULL AND date(m.next_due_date) <= date('now', ?1)",
    )?;
    let rows = stmt.query_map(params![modifier], |row| {
        Ok(MaintenanceDue {
            equipment_name: row.get(0)?,
            next_due_date: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Paid bookings whose event is one or two days out and that have an email
/// address to remind.
pub fn bookings_needing_reminder(conn: &Connection) -> anyhow::Result<Vec<ReminderBooking>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.customer_name, b.customer_email, b.event_date, b.event_time,
                b.event_location, COALESCE(s.display_name, s.name)
         FROM bookings b JOIN services s ON b.service_id = s.id
         WHERE b.payment_status = 'paid' AND b.customer_email != ''
           AND date(b.event_date) BETWEEN date('now', '+1 day') AND date('now', '+2 days')
         ORDER BY b.event_date ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ReminderBooking {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            customer_email: row.get(2)?,
            event_date: row.get(3)?,
            event_time: row.get(4)?,
            event_location: row.get(5)?,
            service_name: row.get(6)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}
