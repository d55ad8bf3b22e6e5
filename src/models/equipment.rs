use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Equipment {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub condition_status: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceRecord {
    pub id: i64,
    pub equipment_id: i64,
    pub maintenance_date: String,
    pub description: String,
    pub cost: Option<f64>,
    pub performed_by: Option<String>,
    pub next_due_date: Option<String>,
    pub created_at: String,
}
