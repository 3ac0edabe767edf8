use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::AdvanceTransaction,
    repository::ledger_store::LedgerStore,
    schemas::{
        clamp_limit_in_range, validate_input, AdvanceTrackerQuery, BulkAdvanceInput,
        CreateAdvanceInput, Pagination, ShopPath,
    },
    services::{
        advance::{advance_balance, summarize},
        shop_numbers::compare_shop_numbers,
        tenant_history::advance_snapshot,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/advance-tracker",
            axum::routing::get(list_advances).post(create_advance),
        )
        .route("/advance-tracker/bulk", axum::routing::post(create_advances_bulk))
        .route(
            "/advance-tracker/{shop_no}/balance",
            axum::routing::get(get_balance),
        )
}

fn to_transaction(input: &CreateAdvanceInput, today: &str) -> AdvanceTransaction {
    let description = match (input.description.as_deref(), input.remarks.as_deref()) {
        (Some(description), _) if !description.trim().is_empty() => description.trim().to_string(),
        (_, Some(remarks)) => remarks.trim().to_string(),
        _ => String::new(),
    };
    let mut transaction = AdvanceTransaction::new(
        input.transaction_type,
        input.amount,
        input
            .txn_date
            .clone()
            .filter(|date| !date.trim().is_empty())
            .unwrap_or_else(|| today.to_string()),
        description,
    );
    transaction.name = input.tenant_name.clone();
    transaction.status = input.status.clone();
    transaction
}

/// Record one transaction. Deductions may not take the balance below zero.
fn record_transaction(
    store: &mut LedgerStore,
    input: &CreateAdvanceInput,
    today: &str,
) -> AppResult<AdvanceTransaction> {
    let shop_no = input.shop_no.trim();
    let transaction = to_transaction(input, today);
    if transaction.transaction_type.is_deduction() {
        let available = advance_balance(store.ledger.advance_transactions_for(shop_no));
        if transaction.amount > available {
            return Err(AppError::BadRequest(format!(
                "Deduction of {:.2} exceeds the advance balance of {available:.2} for shop {shop_no}.",
                transaction.amount
            )));
        }
    }
    store.add_advance_transaction(shop_no, transaction.clone());
    Ok(transaction)
}

async fn list_advances(
    State(state): State<AppState>,
    Query(query): Query<AdvanceTrackerQuery>,
) -> AppResult<Json<Value>> {
    let store = state.store.read().await;
    let mut shops = store
        .ledger
        .advance_transactions
        .keys()
        .filter(|shop_no| {
            query
                .shop_no
                .as_deref()
                .map_or(true, |wanted| shop_no.as_str() == wanted.trim())
        })
        .collect::<Vec<_>>();
    shops.sort_by(|left, right| compare_shop_numbers(left, right));

    let pagination = Pagination::new(
        shops.len(),
        query.page,
        clamp_limit_in_range(query.limit, 1, 1000),
    );
    let mut data = Map::new();
    for shop_no in shops
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit as usize)
    {
        data.insert(
            shop_no.clone(),
            json!(store.ledger.advance_transactions_for(shop_no)),
        );
    }

    Ok(Json(json!({
        "success": true,
        "data": data,
        "pagination": pagination,
    })))
}

async fn create_advance(
    State(state): State<AppState>,
    Json(payload): Json<CreateAdvanceInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let today = state.today().format("%Y-%m-%d").to_string();

    let transaction = {
        let mut store = state.store.write().await;
        record_transaction(&mut store, &payload, &today)?
    };
    state.persist().await?;

    tracing::info!(
        shop_no = %payload.shop_no,
        amount = transaction.amount,
        "Recorded advance transaction"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Advance transaction recorded",
            "data": transaction,
        })),
    ))
}

/// All rows or none: a failing row leaves the store as it was.
async fn create_advances_bulk(
    State(state): State<AppState>,
    Json(payload): Json<BulkAdvanceInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let today = state.today().format("%Y-%m-%d").to_string();

    let created = {
        let mut store = state.store.write().await;
        let mut staged = store.clone();
        let mut created = Vec::with_capacity(payload.transactions.len());
        for (index, input) in payload.transactions.iter().enumerate() {
            let transaction = record_transaction(&mut staged, input, &today).map_err(|error| {
                AppError::BadRequest(format!("Row {}: {error}", index + 1))
            })?;
            created.push(transaction);
        }
        store.ledger.advance_transactions = staged.ledger.advance_transactions;
        created
    };
    state.persist().await?;

    tracing::info!(count = created.len(), "Recorded advance transactions in bulk");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("{} advance transactions recorded", created.len()),
            "data": created,
        })),
    ))
}

async fn get_balance(
    State(state): State<AppState>,
    Path(path): Path<ShopPath>,
) -> AppResult<Json<Value>> {
    let shop_no = path.shop_no.trim();
    let store = state.store.read().await;
    let transactions = store.ledger.advance_transactions_for(shop_no);
    let snapshot = advance_snapshot(&store.ledger, shop_no);
    if transactions.is_empty() && snapshot.is_none() {
        return Err(AppError::NotFound(format!("Shop {shop_no} not found.")));
    }

    Ok(Json(json!({
        "success": true,
        "data": {
            "shopNo": shop_no,
            "summary": summarize(transactions),
            "advanceDeposit": snapshot.as_ref().map(|s| s.advance_deposit),
            "advanceRemaining": snapshot.as_ref().map(|s| s.advance_remaining),
        },
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::{app, test_support::call};
    use crate::state::AppState;

    #[tokio::test]
    async fn lists_transactions_grouped_by_shop() {
        let app = app(AppState::for_tests());
        let (status, body) = call(&app, Method::GET, "/api/v1/advance-tracker", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 5);
        assert_eq!(body["data"]["1"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["1"][0]["type"], "Deposit");

        let (_, body) = call(&app, Method::GET, "/api/v1/advance-tracker?shop_no=3", None).await;
        assert_eq!(body["data"].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deduction_cannot_exceed_balance() {
        let app = app(AppState::for_tests());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/advance-tracker",
            Some(json!({ "shop_no": "1", "type": "Deduction", "amount": 15000 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/advance-tracker",
            Some(json!({
                "shop_no": "1",
                "type": "Deduction",
                "amount": 4000,
                "txn_date": "2024-05-01",
                "remarks": "Repairs"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["description"], "Repairs");

        let (_, body) = call(&app, Method::GET, "/api/v1/advance-tracker/1/balance", None).await;
        assert_eq!(body["data"]["summary"]["balance"], 6000.0);
        assert_eq!(body["data"]["advanceDeposit"], 20000.0);
    }

    #[tokio::test]
    async fn bulk_insert_is_all_or_nothing() {
        let state = AppState::for_tests();
        let app = app(state.clone());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/advance-tracker/bulk",
            Some(json!({ "transactions": [
                { "shop_no": "5", "type": "Deposit", "amount": 1000 },
                { "shop_no": "5", "type": "Deduction", "amount": 50000 }
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Row 2:"));
        assert_eq!(
            state.store.read().await.ledger.advance_transactions_for("5").len(),
            2
        );

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/advance-tracker/bulk",
            Some(json!({ "transactions": [
                { "shop_no": "5", "type": "Deposit", "amount": 1000 },
                { "shop_no": "9", "type": "Deposit", "amount": 500, "tenant_name": "New" }
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let store = state.store.read().await;
        assert_eq!(store.ledger.advance_transactions_for("5").len(), 3);
        assert_eq!(store.ledger.advance_transactions_for("9").len(), 1);
    }

    #[tokio::test]
    async fn balance_for_unknown_shop_is_404() {
        let app = app(AppState::for_tests());
        let (status, _) = call(&app, Method::GET, "/api/v1/advance-tracker/404/balance", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
