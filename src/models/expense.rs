use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub created_at: String,
}
