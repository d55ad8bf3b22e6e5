use serde::Serialize;

/// Pipeline stages a lead moves through, in funnel order.
pub const LEAD_STATUSES: [&str; 7] = [
    "new",
    "contacted",
    "qualified",
    "proposal_sent",
    "negotiating",
    "won",
    "lost",
];

#[derive(Debug, Clone, Serialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub service_interest: Option<String>,
    pub event_date: Option<String>,
    pub budget: Option<f64>,
    pub source: String,
    pub notes: Option<String>,
    pub priority: String,
    pub status: String,
    pub follow_up_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadActivity {
    pub id: i64,
    pub lead_id: i64,
    pub activity_type: String,
    pub description: String,
    pub next_action: Option<String>,
    pub next_action_date: Option<String>,
    pub created_at: String,
}
