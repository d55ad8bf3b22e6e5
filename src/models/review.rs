use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: i64,
    pub booking_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub rating: i64,
    pub review_text: String,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: String,
}
