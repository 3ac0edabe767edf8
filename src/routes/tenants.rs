use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{AdvanceTransaction, Tenant, TenantRecord, TransactionType},
    schemas::{
        clamp_limit_in_range, validate_input, CreateTenantInput, Pagination, PatchTenantInput,
        TenantPath, TenantsQuery,
    },
    services::{shop_numbers::compare_shop_numbers, year_loader::ensure_year_loaded},
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/tenants",
            axum::routing::get(list_tenants).post(create_tenant),
        )
        .route(
            "/tenants/{id}",
            axum::routing::get(get_tenant)
                .put(replace_tenant)
                .patch(patch_tenant)
                .delete(delete_tenant),
        )
}

fn tenant_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Tenant {id} not found."))
}

fn optional_text(value: Option<String>) -> String {
    value.map(|text| text.trim().to_string()).unwrap_or_default()
}

fn record_from_input(id: String, input: CreateTenantInput, created_at: String) -> TenantRecord {
    let now = Utc::now().to_rfc3339();
    TenantRecord {
        id,
        shop_no: input.shop_no.trim().to_string(),
        tenant: Tenant {
            name: input.tenant_name.trim().to_string(),
            phone_number: input.mobile_number.trim().to_string(),
            email: optional_text(input.email),
            address: optional_text(input.address),
            status: input.status,
            agreement_date: optional_text(input.agreement_date),
        },
        monthly_rent: input.monthly_rent,
        advance_amount: input.advance_paid.unwrap_or_default(),
        agreement_status: input.agreement_status,
        comment: input.comment,
        created_at,
        updated_at: now,
    }
}

fn apply_patch(record: &mut TenantRecord, patch: PatchTenantInput) {
    if let Some(name) = patch.tenant_name {
        record.tenant.name = name.trim().to_string();
    }
    if let Some(mobile) = patch.mobile_number {
        record.tenant.phone_number = mobile.trim().to_string();
    }
    if let Some(rent) = patch.monthly_rent {
        record.monthly_rent = rent;
    }
    if let Some(status) = patch.status {
        record.tenant.status = status;
    }
    if let Some(email) = patch.email {
        record.tenant.email = email.trim().to_string();
    }
    if let Some(address) = patch.address {
        record.tenant.address = address.trim().to_string();
    }
    if let Some(date) = patch.agreement_date {
        record.tenant.agreement_date = date.trim().to_string();
    }
    if let Some(advance) = patch.advance_paid {
        record.advance_amount = advance;
    }
    if patch.agreement_status.is_some() {
        record.agreement_status = patch.agreement_status;
    }
    if patch.comment.is_some() {
        record.comment = patch.comment;
    }
    record.updated_at = Utc::now().to_rfc3339();
}

async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<TenantsQuery>,
) -> AppResult<Json<Value>> {
    let store = state.store.read().await;
    let name_filter = query
        .tenant_name
        .as_deref()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty());

    let mut rows = store
        .tenants
        .iter()
        .filter(|record| {
            query
                .status
                .map_or(true, |status| record.tenant.status == status)
        })
        .filter(|record| {
            query
                .shop_no
                .as_deref()
                .map_or(true, |shop_no| record.shop_no == shop_no.trim())
        })
        .filter(|record| {
            name_filter
                .as_deref()
                .map_or(true, |needle| record.tenant.name.to_lowercase().contains(needle))
        })
        .collect::<Vec<_>>();
    rows.sort_by(|left, right| compare_shop_numbers(&left.shop_no, &right.shop_no));

    let pagination = Pagination::new(
        rows.len(),
        query.page,
        clamp_limit_in_range(query.limit, 1, 1000),
    );
    let page = rows
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit as usize)
        .collect::<Vec<_>>();

    Ok(Json(json!({
        "success": true,
        "data": page,
        "pagination": pagination,
    })))
}

async fn get_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<Value>> {
    let store = state.store.read().await;
    let record = store
        .find_tenant(&path.id)
        .ok_or_else(|| tenant_not_found(&path.id))?;
    Ok(Json(json!({ "success": true, "data": record })))
}

async fn create_tenant(
    State(state): State<AppState>,
    Json(payload): Json<CreateTenantInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let year = state.current_year().to_string();
    ensure_year_loaded(&state, &year).await?;

    let now = Utc::now().to_rfc3339();
    let record = record_from_input(uuid::Uuid::new_v4().to_string(), payload, now.clone());
    {
        let mut store = state.store.write().await;
        if store.tenant_for_shop(&record.shop_no).is_some() {
            return Err(AppError::Conflict(format!(
                "Shop {} already has a tenant.",
                record.shop_no
            )));
        }
        store.insert_tenant(record.clone());
        store.apply_tenant_to_year(&record, &year);
        if record.advance_amount > 0.0
            && store.ledger.advance_transactions_for(&record.shop_no).is_empty()
        {
            let mut deposit = AdvanceTransaction::new(
                TransactionType::Deposit,
                record.advance_amount,
                now.get(..10).unwrap_or_default(),
                "Initial advance deposit",
            );
            deposit.name = Some(record.tenant.name.clone());
            store.add_advance_transaction(&record.shop_no, deposit);
        }
    }
    state.persist().await?;

    tracing::info!(shop_no = %record.shop_no, tenant_id = %record.id, "Created tenant");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": record })),
    ))
}

async fn replace_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<CreateTenantInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let year = state.current_year().to_string();
    ensure_year_loaded(&state, &year).await?;

    let record = {
        let mut store = state.store.write().await;
        let existing = store
            .find_tenant(&path.id)
            .cloned()
            .ok_or_else(|| tenant_not_found(&path.id))?;
        let record = record_from_input(existing.id.clone(), payload, existing.created_at.clone());
        if record.shop_no != existing.shop_no {
            if store.tenant_for_shop(&record.shop_no).is_some() {
                return Err(AppError::Conflict(format!(
                    "Shop {} already has a tenant.",
                    record.shop_no
                )));
            }
            store.delete_shop(&year, &existing.shop_no);
        }
        store.replace_tenant(record.clone());
        store.apply_tenant_to_year(&record, &year);
        record
    };
    state.persist().await?;

    Ok(Json(json!({ "success": true, "data": record })))
}

async fn patch_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<PatchTenantInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let year = state.current_year().to_string();
    ensure_year_loaded(&state, &year).await?;

    let record = {
        let mut store = state.store.write().await;
        let mut record = store
            .find_tenant(&path.id)
            .cloned()
            .ok_or_else(|| tenant_not_found(&path.id))?;
        apply_patch(&mut record, payload);
        store.replace_tenant(record.clone());
        store.apply_tenant_to_year(&record, &year);
        record
    };
    state.persist().await?;

    Ok(Json(json!({ "success": true, "data": record })))
}

async fn delete_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<Value>> {
    let year = state.current_year().to_string();
    let removed = {
        let mut store = state.store.write().await;
        let removed = store
            .remove_tenant(&path.id)
            .ok_or_else(|| tenant_not_found(&path.id))?;
        store.delete_shop(&year, &removed.shop_no);
        removed
    };
    state.persist().await?;

    tracing::info!(shop_no = %removed.shop_no, tenant_id = %removed.id, "Deleted tenant");
    Ok(Json(json!({
        "success": true,
        "message": format!("Tenant for shop {} deleted", removed.shop_no),
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::{app, test_support::call};
    use crate::state::AppState;

    #[tokio::test]
    async fn lists_with_filters_and_pagination() {
        let app = app(AppState::for_tests());

        let (status, body) = call(&app, Method::GET, "/api/v1/tenants?limit=2&page=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 5);
        assert_eq!(body["pagination"]["totalPages"], 3);
        assert_eq!(body["data"][0]["shop_no"], "3");

        let (_, body) = call(&app, Method::GET, "/api/v1/tenants?tenant_name=priya", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["tenant"]["name"], "Priya Singh");

        let (_, body) = call(&app, Method::GET, "/api/v1/tenants?status=Inactive", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_patch_and_delete_round_trip() {
        let state = AppState::for_tests();
        let year = state.current_year().to_string();
        let app = app(state.clone());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/tenants",
            Some(json!({
                "shop_no": "6-A",
                "tenant_name": "Neha Verma",
                "mobile_number": "9000000000",
                "monthly_rent": 2800,
                "advance_paid": 5000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["_id"].as_str().unwrap().to_string();
        {
            let store = state.store.read().await;
            assert_eq!(store.shop(&year, "6-A").unwrap().rent_amount, 2800.0);
            assert_eq!(store.ledger.advance_transactions_for("6-A").len(), 1);
        }

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/tenants",
            Some(json!({ "shop_no": "6-A", "tenant_name": "Someone", "monthly_rent": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/tenants/{id}"),
            Some(json!({ "monthly_rent": 3100, "status": "Inactive" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["monthly_rent"], 3100.0);
        assert_eq!(body["data"]["tenant"]["name"], "Neha Verma");
        assert!(!state.store.read().await.shop(&year, "6-A").unwrap().is_active());

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/tenants/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.store.read().await.shop(&year, "6-A").is_none());

        let (status, body) = call(&app, Method::GET, &format!("/api/v1/tenants/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let app = app(AppState::for_tests());
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/tenants",
            Some(json!({
                "shop_no": "7",
                "tenant_name": "Test",
                "monthly_rent": 1000,
                "email": "not-an-email"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
