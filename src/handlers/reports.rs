use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, CustomerRow, GstRow, MonthlyReportRow, ServicePerfRow};
use crate::errors::{AppError, FieldError};
use crate::services::validation;
use crate::state::AppState;

// GET /api/reports/gst
#[derive(Deserialize)]
pub struct GstQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GstReport {
    start_date: String,
    end_date: String,
    gst_rate: &'static str,
    total_sales: i64,
    total_taxable: f64,
    total_gst: f64,
    transactions: Vec<GstRow>,
}

pub async fn gst(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<GstQuery>,
) -> Result<Json<GstReport>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let (start, end) = match (q.start_date, q.end_date) {
        (Some(start), Some(end))
            if validation::is_iso_date(&start) && validation::is_iso_date(&end) =>
        {
            (start, end)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Valid start and end dates required (YYYY-MM-DD)",
            ))
        }
    };

    let transactions = {
        let db = state.db.lock().unwrap();
        queries::gst_rows(&db, &start, &end)?
    };
    let total_sales: i64 = transactions.iter().map(|t| t.total_amount).sum();
    let total_taxable: f64 = transactions.iter().map(|t| t.taxable_amount).sum();
    let total_gst: f64 = transactions.iter().map(|t| t.gst_amount).sum();

    Ok(Json(GstReport {
        start_date: start,
        end_date: end,
        gst_rate: "18%",
        total_sales,
        total_taxable,
        total_gst,
        transactions,
    }))
}

// GET /api/reports/income-tax
#[derive(Deserialize)]
pub struct IncomeTaxQuery {
    #[serde(rename = "financialYear")]
    pub financial_year: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTaxReport {
    financial_year: String,
    start_date: String,
    end_date: String,
    gross_revenue: i64,
    total_expenses: f64,
    taxable_income: f64,
    estimated_tax: f64,
    net_income: f64,
}

/// Indian financial years run April through March and are written as
/// `2024-25`.
fn parse_financial_year(fy: &str) -> Option<(String, String)> {
    let (start, end) = fy.trim().split_once('-')?;
    if start.len() != 4 || end.len() != 2 {
        return None;
    }
    let start_year: i32 = start.parse().ok()?;
    let end_two: i32 = end.parse().ok()?;
    if (start_year + 1) % 100 != end_two {
        return None;
    }
    Some((
        format!("{start_year}-04-01"),
        format!("{}-03-31", start_year + 1),
    ))
}

/// Old-regime individual slabs: nothing up to 2.5L, 5% to 5L, 20% to 10L,
/// 30% beyond, rounded to the rupee.
fn calculate_income_tax(taxable: f64) -> f64 {
    let tax = if taxable <= 250_000.0 {
        0.0
    } else if taxable <= 500_000.0 {
        (taxable - 250_000.0) * 0.05
    } else if taxable <= 1_000_000.0 {
        12_500.0 + (taxable - 500_000.0) * 0.20
    } else {
        112_500.0 + (taxable - 1_000_000.0) * 0.30
    };
    tax.round()
}

pub async fn income_tax(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<IncomeTaxQuery>,
) -> Result<Json<IncomeTaxReport>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let financial_year = q.financial_year.unwrap_or_default();
    let Some((start, end)) = parse_financial_year(&financial_year) else {
        return Err(AppError::Validation(vec![FieldError {
            field: "financialYear",
            message: "Valid financial year required (e.g. 2024-25)",
        }]));
    };

    let (gross_revenue, total_expenses) = {
        let db = state.db.lock().unwrap();
        (
            queries::paid_revenue_between(&db, &start, &end)?,
            queries::expenses_between(&db, &start, &end)?,
        )
    };

    let taxable_income = (gross_revenue as f64 - total_expenses).max(0.0);
    let estimated_tax = calculate_income_tax(taxable_income);

    Ok(Json(IncomeTaxReport {
        financial_year: financial_year.trim().to_string(),
        start_date: start,
        end_date: end,
        gross_revenue,
        total_expenses,
        taxable_income,
        estimated_tax,
        net_income: taxable_income - estimated_tax,
    }))
}

// GET /api/reports/customers
pub async fn customers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CustomerRow>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::customer_report(&db)?))
}

// GET /api/reports/services
pub async fn services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ServicePerfRow>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::service_performance(&db)?))
}

// GET /api/reports/monthly
#[derive(Deserialize)]
pub struct MonthlyQuery {
    pub months: Option<i64>,
}

pub async fn monthly(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyReportRow>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::monthly_report(&db, q.months.unwrap_or(12).max(1))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn financial_year_parses_to_april_march_window() {
        assert_eq!(
            parse_financial_year("2024-25"),
            Some(("2024-04-01".to_string(), "2025-03-31".to_string()))
        );
        assert_eq!(
            parse_financial_year("1999-00"),
            Some(("1999-04-01".to_string(), "2000-03-31".to_string()))
        );
    }

    #[test]
    fn financial_year_rejects_malformed_input() {
        assert_eq!(parse_financial_year(""), None);
        assert_eq!(parse_financial_year("2024"), None);
        assert_eq!(parse_financial_year("2024-26"), None);
        assert_eq!(parse_financial_year("24-25"), None);
        assert_eq!(parse_financial_year("2024-2025"), None);
        assert_eq!(parse_financial_year("abcd-ef"), None);
    }

    #[test]
    fn tax_slabs_compute_at_boundaries() {
        assert_eq!(calculate_income_tax(0.0), 0.0);
        assert_eq!(calculate_income_tax(250_000.0), 0.0);
        assert_eq!(calculate_income_tax(300_000.0), 2_500.0);
        assert_eq!(calculate_income_tax(500_000.0), 12_500.0);
        assert_eq!(calculate_income_tax(750_000.0), 62_500.0);
        assert_eq!(calculate_income_tax(1_000_000.0), 112_500.0);
        assert_eq!(calculate_income_tax(1_500_000.0), 262_500.0);
    }
}
