use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::models::{AdvanceTransaction, Expense, TenantRecord, YearData};
use crate::services::expense_analytics::{flatten_expenses, GroupedExpenses};

const SESSION_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-2xx answer from the ledger API.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Client-side authentication flag with a fixed expiry. There is no token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub authenticated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn starting_at(authenticated_at: DateTime<Utc>) -> Self {
        Self {
            authenticated_at,
            expires_at: authenticated_at + Duration::hours(SESSION_HOURS),
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Typed wrapper over the ledger REST API. No retries and no caching.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: Client,
    base_url: Url,
}

impl LedgerClient {
    /// `base_url` includes the API prefix, e.g. `https://host/api/v1`.
    pub fn new(http: Client, base_url: &str) -> ClientResult<Self> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Self {
            http,
            base_url: Url::parse(&raw)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::debug!(method = %method, path, status = response.status().as_u16(), "Ledger API call");
        Self::handle_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request::<T, Value>(Method::GET, path, None).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|error| ClientError::InvalidResponse(error.to_string()))
    }

    pub async fn get_year(&self, year: &str) -> ClientResult<YearData> {
        let envelope = self
            .get::<Envelope<BTreeMap<String, YearData>>>(&format!("rent-ledger/year/{year}"))
            .await?;
        envelope
            .data
            .and_then(|mut years| years.remove(year))
            .ok_or_else(|| ClientError::InvalidResponse(format!("Missing data for year {year}")))
    }

    pub async fn list_tenants(&self) -> ClientResult<Vec<TenantRecord>> {
        let envelope = self.get::<Envelope<Vec<TenantRecord>>>("tenants").await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn get_tenant(&self, id: &str) -> ClientResult<TenantRecord> {
        required(self.get::<Envelope<TenantRecord>>(&format!("tenants/{id}")).await?)
    }

    pub async fn create_tenant<B: Serialize + ?Sized>(&self, body: &B) -> ClientResult<TenantRecord> {
        required(
            self.request::<Envelope<TenantRecord>, B>(Method::POST, "tenants", Some(body))
                .await?,
        )
    }

    /// `PUT` replaces the record, `PATCH` merges the given fields.
    pub async fn update_tenant<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
        partial: bool,
    ) -> ClientResult<TenantRecord> {
        let method = if partial { Method::PATCH } else { Method::PUT };
        required(
            self.request::<Envelope<TenantRecord>, B>(method, &format!("tenants/{id}"), Some(body))
                .await?,
        )
    }

    pub async fn delete_tenant(&self, id: &str) -> ClientResult<()> {
        self.request::<Value, Value>(Method::DELETE, &format!("tenants/{id}"), None)
            .await?;
        Ok(())
    }

    pub async fn get_advances(&self) -> ClientResult<Value> {
        self.get::<Value>("advance-tracker").await
    }

    pub async fn create_advance(
        &self,
        shop_no: &str,
        transaction: &AdvanceTransaction,
    ) -> ClientResult<Value> {
        let mut body = serde_json::to_value(transaction)
            .map_err(|error| ClientError::InvalidResponse(error.to_string()))?;
        if let Some(object) = body.as_object_mut() {
            object.insert("shop_no".to_string(), Value::String(shop_no.to_string()));
        }
        self.request::<Value, Value>(Method::POST, "advance-tracker", Some(&body))
            .await
    }

    pub async fn get_expenses(&self, year: Option<i32>) -> ClientResult<GroupedExpenses> {
        let path = match year {
            Some(year) => format!("expenses?limit=1000&year={year}"),
            None => "expenses?limit=1000".to_string(),
        };
        let envelope = self.get::<Envelope<GroupedExpenses>>(&path).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn fetch_flat_expenses(&self, year: Option<i32>) -> ClientResult<Vec<Expense>> {
        Ok(flatten_expenses(&self.get_expenses(year).await?))
    }

    pub async fn create_expense<B: Serialize + ?Sized>(&self, body: &B) -> ClientResult<Value> {
        self.request::<Value, B>(Method::POST, "expenses", Some(body))
            .await
    }

    pub async fn login(&self, password: &str) -> ClientResult<AuthSession> {
        let body = serde_json::json!({ "password": password });
        let reply = self
            .request::<LoginReply, Value>(Method::POST, "auth/login", Some(&body))
            .await?;
        if !reply.success {
            return Err(ClientError::Api {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: reply.message,
            });
        }
        let mut session = AuthSession::starting_at(Utc::now());
        if let Some(expires_at) = reply.expires_at {
            session.expires_at = expires_at;
        }
        Ok(session)
    }
}

fn required<T>(envelope: Envelope<T>) -> ClientResult<T> {
    envelope
        .data
        .ok_or_else(|| ClientError::InvalidResponse("Missing data".to_string()))
}

/// The body's `message`, or `API error <status>` when there is none.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("API error {}", status.as_u16()))
}
