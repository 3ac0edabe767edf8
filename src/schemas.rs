use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::parse_csv;
use crate::error::AppError;
use crate::models::{TenantStatus, TransactionType};
use crate::services::expense_analytics::ExpenseFilters;

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

pub fn clamp_limit_in_range(limit: i64, minimum: i64, maximum: i64) -> i64 {
    limit.clamp(minimum, maximum)
}

fn default_page() -> i64 {
    1
}
fn default_limit_100() -> i64 {
    100
}
fn default_limit_1000() -> i64 {
    1000
}
fn default_false() -> bool {
    false
}

// ---------- auth ----------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, max = 255))]
    pub password: String,
}

// ---------- rent ledger ----------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YearPath {
    pub year: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopDuesPath {
    pub year: String,
    pub shop_no: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonthPath {
    pub year: String,
    pub shop_no: String,
    pub month: String,
}

/// Rent entry form. `month` is either `YYYY-MM` or a month name paired with `year`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentInput {
    #[serde(alias = "shop_no")]
    #[validate(length(min = 1, max = 32))]
    pub shop_number: String,
    #[validate(length(min = 3, max = 16))]
    pub month: String,
    pub year: Option<i32>,
    #[validate(range(min = 0.0))]
    pub paid_amount: f64,
    #[serde(default = "default_false")]
    pub use_advance: bool,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub advance_deduction: f64,
    pub payment_date: Option<String>,
    pub payment_mode: Option<String>,
    pub remarks: Option<String>,
}

// ---------- tenants ----------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantPath {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantsQuery {
    pub status: Option<TenantStatus>,
    pub shop_no: Option<String>,
    pub tenant_name: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit_100")]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateTenantInput {
    #[validate(length(min = 1, max = 32))]
    pub shop_no: String,
    #[validate(length(min = 1, max = 255))]
    pub tenant_name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub mobile_number: String,
    #[validate(range(min = 0.0))]
    pub monthly_rent: f64,
    #[serde(default)]
    pub status: TenantStatus,
    pub agreement_status: Option<String>,
    pub agreement_date: Option<String>,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 0.0))]
    pub advance_paid: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct PatchTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub tenant_name: Option<String>,
    #[validate(length(max = 20))]
    pub mobile_number: Option<String>,
    #[validate(range(min = 0.0))]
    pub monthly_rent: Option<f64>,
    pub status: Option<TenantStatus>,
    pub agreement_status: Option<String>,
    pub agreement_date: Option<String>,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 0.0))]
    pub advance_paid: Option<f64>,
    pub comment: Option<String>,
}

// ---------- advance tracker ----------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopPath {
    pub shop_no: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdvanceTrackerQuery {
    pub shop_no: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit_1000")]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateAdvanceInput {
    #[validate(length(min = 1, max = 32))]
    pub shop_no: String,
    pub tenant_name: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    #[serde(alias = "date")]
    pub txn_date: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BulkAdvanceInput {
    #[validate(length(min = 1, max = 500))]
    #[validate(nested)]
    pub transactions: Vec<CreateAdvanceInput>,
}

// ---------- expenses ----------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpensesQuery {
    pub year: Option<i32>,
    #[serde(default = "default_limit_1000")]
    pub limit: i64,
}

/// Query-string form of the expense filters; list values are comma separated.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExpenseFilterQuery {
    pub year: Option<i32>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub categories: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub payment_methods: Option<String>,
}

impl ExpenseFilterQuery {
    pub fn filters(&self) -> ExpenseFilters {
        let (start_date, end_date) = match self.year {
            Some(year) => (
                self.start_date.clone().or_else(|| Some(format!("{year}-01-01"))),
                self.end_date.clone().or_else(|| Some(format!("{year}-12-31"))),
            ),
            None => (self.start_date.clone(), self.end_date.clone()),
        };
        ExpenseFilters {
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            categories: self.categories.as_deref().map(parse_csv).unwrap_or_default(),
            start_date,
            end_date,
            search: self.search.clone(),
            payment_methods: self
                .payment_methods
                .as_deref()
                .map(parse_csv)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateExpenseInput {
    #[serde(alias = "date")]
    #[validate(length(min = 10, max = 32))]
    pub txn_date: String,
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 120))]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ---------- dashboard & reports ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DashboardQuery {
    #[serde(default = "default_false")]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MonthlyReportQuery {
    pub month: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TenantHistoryQuery {
    pub year: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: usize, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        Self {
            total,
            page: page.max(1),
            limit,
            total_pages: (total as i64 + limit - 1) / limit,
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) * self.limit) as usize
    }
}

/// Four-digit year path segment.
pub fn parse_year(raw: &str) -> Result<i32, AppError> {
    let trimmed = raw.trim();
    if trimmed.len() != 4 {
        return Err(AppError::BadRequest(format!("Invalid year '{trimmed}'.")));
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| AppError::BadRequest(format!("Invalid year '{trimmed}'.")))
}

#[cfg(test)]
mod tests {
    use super::{
        parse_year, validate_input, BulkAdvanceInput, CreateAdvanceInput, ExpenseFilterQuery,
        Pagination, RecordPaymentInput,
    };
    use crate::models::TransactionType;
    use serde_json::json;

    #[test]
    fn payment_input_accepts_camel_case_form() {
        let input: RecordPaymentInput = serde_json::from_value(json!({
            "shopNumber": "1",
            "month": "2024-06",
            "paidAmount": 10200,
            "useAdvance": true,
            "advanceDeduction": 500
        }))
        .unwrap();
        assert!(input.use_advance);
        assert!(validate_input(&input).is_ok());

        let negative = RecordPaymentInput {
            paid_amount: -1.0,
            ..input
        };
        assert!(validate_input(&negative).is_err());
    }

    #[test]
    fn bulk_advances_validate_each_row() {
        let row = CreateAdvanceInput {
            shop_no: "1".to_string(),
            tenant_name: None,
            transaction_type: TransactionType::Deposit,
            amount: 0.0,
            txn_date: None,
            description: None,
            status: None,
            remarks: None,
        };
        let bulk = BulkAdvanceInput {
            transactions: vec![row],
        };
        assert!(validate_input(&bulk).is_err());
        assert!(validate_input(&BulkAdvanceInput {
            transactions: Vec::new()
        })
        .is_err());
    }

    #[test]
    fn filter_query_splits_lists_and_bounds_year() {
        let query = ExpenseFilterQuery {
            year: Some(2024),
            categories: Some("Food, Travel".to_string()),
            ..ExpenseFilterQuery::default()
        };
        let filters = query.filters();
        assert_eq!(filters.categories, vec!["Food", "Travel"]);
        assert_eq!(filters.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(filters.end_date.as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn pagination_and_year_parsing() {
        let pagination = Pagination::new(11, 2, 5);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.offset(), 5);
        assert_eq!(Pagination::new(0, 0, 0).total_pages, 0);
        assert_eq!(parse_year("2024").unwrap(), 2024);
        assert!(parse_year("24").is_err());
        assert!(parse_year("20x4").is_err());
    }
}
