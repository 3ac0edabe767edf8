use axum::{routing::get, Router};

use crate::state::AppState;

pub mod advance_tracker;
pub mod auth;
pub mod dashboard;
pub mod expenses;
pub mod health;
pub mod reports;
pub mod rent_ledger;
pub mod tenants;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(auth::router())
        .merge(rent_ledger::router())
        .merge(tenants::router())
        .merge(advance_tracker::router())
        .merge(expenses::router())
        .merge(dashboard::router())
        .merge(reports::router())
}

/// The versioned API mounted under the configured prefix, without the
/// middleware stack that `main` adds.
pub fn app(state: AppState) -> Router {
    let prefix = state.config.api_prefix.clone();
    Router::new().nest(&prefix, v1_router()).with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
