use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Datelike;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::Month,
    schemas::{parse_year, MonthlyReportQuery, ShopPath, TenantHistoryQuery, YearPath},
    services::{
        reports::{monthly_report, parse_report_month, yearly_stats},
        tenant_history::{
            advance_snapshot, all_years_history, history_shops, pending_by_year, yearly_history,
        },
        year_loader::ensure_year_loaded,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/reports/{year}/monthly", axum::routing::get(get_monthly_report))
        .route("/reports/{year}/yearly", axum::routing::get(get_yearly_report))
        .route("/reports/tenant-history", axum::routing::get(list_history_shops))
        .route(
            "/reports/tenant-history/{shop_no}",
            axum::routing::get(get_tenant_history),
        )
}

async fn require_year(state: &AppState, raw: &str) -> AppResult<(i32, String)> {
    let year = parse_year(raw)?;
    let key = year.to_string();
    if !ensure_year_loaded(state, &key).await? {
        return Err(AppError::NotFound(format!("No data found for year {key}")));
    }
    Ok((year, key))
}

/// Month to report on: the query's `YYYY-MM`, else the current month for the
/// current year and December for any other.
fn report_month(query: &MonthlyReportQuery, year: i32, state: &AppState) -> AppResult<Month> {
    if let Some(raw) = query.month.as_deref().filter(|raw| !raw.trim().is_empty()) {
        let (month_year, month) = parse_report_month(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid month '{}'. Use YYYY-MM.", raw.trim()))
        })?;
        if month_year != year {
            return Err(AppError::BadRequest(format!(
                "Month {raw} is outside year {year}."
            )));
        }
        return Ok(month);
    }
    let today = state.today();
    if today.year() == year {
        Month::from_number(today.month())
            .ok_or_else(|| AppError::Internal("Invalid calendar month.".to_string()))
    } else {
        Ok(Month::December)
    }
}

async fn get_monthly_report(
    State(state): State<AppState>,
    Path(path): Path<YearPath>,
    Query(query): Query<MonthlyReportQuery>,
) -> AppResult<Json<Value>> {
    let (year, key) = require_year(&state, &path.year).await?;
    let month = report_month(&query, year, &state)?;
    let cache_key = format!("monthly:{key}:{}", month.number());
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let store = state.store.read().await;
    let year_data = store.ledger.years.get(&key).cloned().unwrap_or_default();
    let body = json!({
        "success": true,
        "data": monthly_report(&year_data, year, month),
    });
    state.report_cache.insert(cache_key, body.clone()).await;
    drop(store);

    Ok(Json(body))
}

async fn get_yearly_report(
    State(state): State<AppState>,
    Path(path): Path<YearPath>,
) -> AppResult<Json<Value>> {
    let (year, key) = require_year(&state, &path.year).await?;
    let cache_key = format!("yearly:{key}");
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let store = state.store.read().await;
    let year_data = store.ledger.years.get(&key).cloned().unwrap_or_default();
    let body = json!({
        "success": true,
        "data": yearly_stats(&year_data, year, state.today()),
    });
    state.report_cache.insert(cache_key, body.clone()).await;
    drop(store);

    Ok(Json(body))
}

async fn list_history_shops(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let store = state.store.read().await;
    Ok(Json(json!({
        "success": true,
        "data": history_shops(&store.ledger),
    })))
}

async fn get_tenant_history(
    State(state): State<AppState>,
    Path(path): Path<ShopPath>,
    Query(query): Query<TenantHistoryQuery>,
) -> AppResult<Json<Value>> {
    let shop_no = path.shop_no.trim();
    let selected = query
        .year
        .as_deref()
        .map(str::trim)
        .filter(|year| !year.is_empty() && !year.eq_ignore_ascii_case("all"));

    if let Some(raw) = selected {
        let (_, key) = require_year(&state, raw).await?;
        let store = state.store.read().await;
        let history = yearly_history(&store.ledger, shop_no, &key).ok_or_else(|| {
            AppError::NotFound(format!("Shop {shop_no} not found for year {key}."))
        })?;
        return Ok(Json(json!({
            "success": true,
            "data": {
                "shopNo": shop_no,
                "year": key,
                "history": history,
                "advance": advance_snapshot(&store.ledger, shop_no),
            },
        })));
    }

    let store = state.store.read().await;
    let history = all_years_history(&store.ledger, shop_no);
    if history.year_sections.is_empty() {
        return Err(AppError::NotFound(format!("Shop {shop_no} not found.")));
    }
    Ok(Json(json!({
        "success": true,
        "data": {
            "shopNo": shop_no,
            "year": "all",
            "history": history,
            "pending": pending_by_year(&store.ledger, shop_no),
            "advance": advance_snapshot(&store.ledger, shop_no),
        },
    })))
}
