use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{Expense, Month, RentLedgerData},
    schemas::{
        clamp_limit_in_range, validate_input, CreateExpenseInput, ExpenseFilterQuery,
        ExpensesQuery,
    },
    services::expense_analytics::{
        categories, detect_anomalies, expense_date, filter_expenses, group_by_year_month,
        monthly_summaries, payment_methods, summary_stats, yearly_summaries,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/expenses",
            axum::routing::get(list_expenses).post(create_expense),
        )
        .route("/expenses/summary", axum::routing::get(expense_summary))
        .route("/expenses/anomalies", axum::routing::get(expense_anomalies))
}

/// Rent collected across all shops for one month.
fn rent_collected(ledger: &RentLedgerData, year: i32, month: Month) -> f64 {
    ledger
        .years
        .get(&year.to_string())
        .map(|year_data| {
            year_data
                .shops
                .values()
                .filter_map(|shop| shop.monthly_data.get(&month))
                .map(|entry| entry.paid)
                .sum::<f64>()
        })
        .unwrap_or_default()
}

async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpensesQuery>,
) -> AppResult<Json<Value>> {
    let limit = clamp_limit_in_range(query.limit, 1, 5000) as usize;
    let store = state.store.read().await;

    let mut rows = store
        .expenses
        .iter()
        .filter(|expense| {
            query.year.map_or(true, |year| {
                expense_date(expense).is_some_and(|date| date.year() == year)
            })
        })
        .cloned()
        .collect::<Vec<_>>();
    rows.sort_by(|left, right| right.date.cmp(&left.date));
    rows.truncate(limit);

    let grouped = group_by_year_month(&rows, |year, month| {
        rent_collected(&store.ledger, year, month)
    });
    Ok(Json(json!({ "success": true, "data": grouped })))
}

async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<CreateExpenseInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let expense = Expense {
        id: None,
        date: payload.txn_date.trim().to_string(),
        amount: payload.amount,
        category: payload.category.trim().to_string(),
        description: payload.description.trim().to_string(),
        sub_category: payload.sub_category.trim().to_string(),
        payment_method: payload.payment_method.trim().to_string(),
        tags: payload.tags,
    };
    if expense_date(&expense).is_none() {
        return Err(AppError::BadRequest(format!(
            "Invalid expense date '{}'. Use YYYY-MM-DD.",
            expense.date
        )));
    }

    let expense = state.store.write().await.add_expense(expense);
    state.persist().await?;

    tracing::info!(category = %expense.category, amount = expense.amount, "Recorded expense");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Expense recorded",
            "data": expense,
        })),
    ))
}

async fn expense_summary(
    State(state): State<AppState>,
    Query(query): Query<ExpenseFilterQuery>,
) -> AppResult<Json<Value>> {
    let store = state.store.read().await;
    let filtered = filter_expenses(&store.expenses, &query.filters());

    Ok(Json(json!({
        "success": true,
        "data": {
            "summary": summary_stats(&filtered),
            "monthly": monthly_summaries(&filtered),
            "yearly": yearly_summaries(&filtered),
            "categories": categories(&store.expenses),
            "paymentMethods": payment_methods(&store.expenses),
        },
    })))
}

async fn expense_anomalies(
    State(state): State<AppState>,
    Query(query): Query<ExpenseFilterQuery>,
) -> AppResult<Json<Value>> {
    let multiplier = state.config.anomaly_multiplier();
    let store = state.store.read().await;
    let filtered = filter_expenses(&store.expenses, &query.filters());
    let anomalies = detect_anomalies(&filtered, multiplier);

    Ok(Json(json!({
        "success": true,
        "data": anomalies,
        "multiplier": multiplier,
    })))
}
