use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    schemas::{parse_year, DashboardQuery, YearPath},
    services::{
        dashboard::{collection_graphs, dashboard_stats, overdue_shops},
        year_loader::ensure_year_loaded,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/dashboard/{year}", axum::routing::get(get_dashboard))
        .route(
            "/dashboard/{year}/collections",
            axum::routing::get(get_collections),
        )
}

async fn loaded_year(state: &AppState, raw: &str) -> AppResult<(i32, String)> {
    let year = parse_year(raw)?;
    let key = year.to_string();
    if !ensure_year_loaded(state, &key).await? {
        return Err(AppError::NotFound(format!("No data found for year {key}")));
    }
    Ok((year, key))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(path): Path<YearPath>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<Value>> {
    let (_, key) = loaded_year(&state, &path.year).await?;
    let cache_key = format!("dashboard:{key}:{}", query.include_inactive);
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let store = state.store.read().await;
    let year_data = store.ledger.years.get(&key).cloned().unwrap_or_default();
    let body = json!({
        "success": true,
        "data": {
            "year": key,
            "stats": dashboard_stats(&year_data),
            "overdueShops": overdue_shops(&year_data, query.include_inactive),
        },
    });
    // Insert before releasing the read lock so a concurrent mutation's
    // invalidation always lands after this entry.
    state.report_cache.insert(cache_key, body.clone()).await;
    drop(store);

    Ok(Json(body))
}

async fn get_collections(
    State(state): State<AppState>,
    Path(path): Path<YearPath>,
) -> AppResult<Json<Value>> {
    let (year, key) = loaded_year(&state, &path.year).await?;
    let cache_key = format!("collections:{key}");
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let store = state.store.read().await;
    let year_data = store.ledger.years.get(&key).cloned().unwrap_or_default();
    let body = json!({
        "success": true,
        "data": collection_graphs(&year_data, year, state.today()),
    });
    state.report_cache.insert(cache_key, body.clone()).await;
    drop(store);

    Ok(Json(body))
}
