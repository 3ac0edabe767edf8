use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({
        "status": "ok",
        "now": Utc::now().to_rfc3339(),
        "years": store.ledger.years.len(),
        "upstream": state.upstream.is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::{app, test_support::call};
    use crate::state::AppState;

    #[tokio::test]
    async fn reports_ok_with_loaded_years() {
        let app = app(AppState::for_tests());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["years"], 2);
        assert_eq!(body["upstream"], false);
    }
}
