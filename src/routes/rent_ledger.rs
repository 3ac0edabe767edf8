use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::{Month, MonthlyData},
    schemas::{parse_year, validate_input, MonthPath, RecordPaymentInput, ShopDuesPath, YearPath},
    services::{
        advance::advance_balance,
        allocation::{allocate_payment, AllocationError, RentPayment},
        dues::get_dues_info,
        reports::parse_report_month,
        year_loader::ensure_year_loaded,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/rent-ledger/years", axum::routing::get(list_years))
        .route("/rent-ledger/year/{year}", axum::routing::get(get_year))
        .route("/rent-ledger/payments", axum::routing::post(record_payment))
        .route(
            "/rent-ledger/dues/{year}/{shop_no}",
            axum::routing::get(get_shop_dues),
        )
        .route(
            "/rent-ledger/year/{year}/shops/{shop_no}/months/{month}",
            axum::routing::put(update_month),
        )
}

async fn list_years(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let store = state.store.read().await;
    let years = store
        .ledger
        .sorted_years()
        .into_iter()
        .map(|(_, key)| key)
        .collect::<Vec<_>>();
    Ok(Json(json!({ "success": true, "data": years })))
}

async fn get_year(
    State(state): State<AppState>,
    Path(path): Path<YearPath>,
) -> AppResult<Json<Value>> {
    let year = parse_year(&path.year)?.to_string();
    if !ensure_year_loaded(&state, &year).await? {
        return Err(AppError::NotFound(format!("No data found for year {year}")));
    }

    let store = state.store.read().await;
    let year_data = store
        .ledger
        .years
        .get(&year)
        .ok_or_else(|| AppError::NotFound(format!("No data found for year {year}")))?;
    let mut data = Map::new();
    data.insert(year.clone(), json!(year_data));
    Ok(Json(json!({
        "success": true,
        "message": format!("Data for year {year}"),
        "data": data,
    })))
}

/// `YYYY-MM`, or a month name with an explicit or current year.
fn resolve_period(input: &RecordPaymentInput, current_year: i32) -> AppResult<(i32, Month)> {
    if let Some(period) = parse_report_month(&input.month) {
        return Ok(period);
    }
    let month = input
        .month
        .parse::<Month>()
        .map_err(|error| AppError::BadRequest(format!("Invalid month: {error}")))?;
    Ok((input.year.unwrap_or(current_year), month))
}

fn allocation_error(error: AllocationError) -> AppError {
    match error {
        AllocationError::ShopNotFound { .. } => AppError::NotFound(error.to_string()),
        AllocationError::EmptyPayment => AppError::BadRequest(error.to_string()),
    }
}

async fn record_payment(
    State(state): State<AppState>,
    Json(payload): Json<RecordPaymentInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    if payload.paid_amount <= 0.0 {
        return Err(AppError::BadRequest(
            "Paid amount must be greater than zero.".to_string(),
        ));
    }
    let shop_number = payload.shop_number.trim().to_string();
    let (year, month) = resolve_period(&payload, state.current_year())?;
    ensure_year_loaded(&state, &year.to_string()).await?;

    let payment = RentPayment {
        shop_number,
        year,
        month,
        paid_amount: payload.paid_amount,
        use_advance: payload.use_advance,
        advance_deduction: payload.advance_deduction,
        payment_date: payload
            .payment_date
            .clone()
            .filter(|date| !date.trim().is_empty())
            .unwrap_or_else(|| state.today().format("%Y-%m-%d").to_string()),
    };

    let report = {
        let mut store = state.store.write().await;
        if store.shop(&year.to_string(), &payment.shop_number).is_none() {
            return Err(allocation_error(AllocationError::ShopNotFound {
                shop_number: payment.shop_number.clone(),
                year,
            }));
        }
        if payment.use_advance && payment.advance_deduction > 0.0 {
            let available =
                advance_balance(store.ledger.advance_transactions_for(&payment.shop_number));
            if payment.advance_deduction > available {
                return Err(AppError::BadRequest(format!(
                    "Advance deduction exceeds the available advance balance of {available:.2}."
                )));
            }
        }
        allocate_payment(&mut store.ledger, &payment).map_err(allocation_error)?
    };
    state.persist().await?;

    tracing::info!(
        shop_number = %payment.shop_number,
        year,
        month = %month,
        amount = report.total_allocated,
        mode = payload.payment_mode.as_deref().unwrap_or("-"),
        "Recorded rent payment"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Payment recorded",
        "data": report,
    })))
}

async fn get_shop_dues(
    State(state): State<AppState>,
    Path(path): Path<ShopDuesPath>,
) -> AppResult<Json<Value>> {
    let year = parse_year(&path.year)?.to_string();
    ensure_year_loaded(&state, &year).await?;

    let store = state.store.read().await;
    let summary = get_dues_info(path.shop_no.trim(), &store.ledger, &year);
    Ok(Json(json!({ "success": true, "data": summary })))
}

async fn update_month(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
    Json(entry): Json<MonthlyData>,
) -> AppResult<Json<Value>> {
    let year = parse_year(&path.year)?.to_string();
    let month = path
        .month
        .parse::<Month>()
        .map_err(|error| AppError::BadRequest(format!("Invalid month: {error}")))?;
    if entry.rent < 0.0 || entry.paid < 0.0 || entry.advance_used < 0.0 {
        return Err(AppError::BadRequest(
            "Amounts cannot be negative.".to_string(),
        ));
    }
    ensure_year_loaded(&state, &year).await?;

    let updated = state
        .store
        .write()
        .await
        .update_monthly_data(&year, path.shop_no.trim(), month, entry.clone());
    if !updated {
        return Err(AppError::NotFound(format!(
            "Shop {} not found for year {year}.",
            path.shop_no.trim()
        )));
    }
    state.persist().await?;

    Ok(Json(json!({ "success": true, "data": entry })))
}
