use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use moka::future::Cache;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    repository::{
        ledger_store::LedgerStore,
        snapshot::{load_snapshot, save_snapshot},
    },
    services::ledger_client::LedgerClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<RwLock<LedgerStore>>,
    pub upstream: Option<LedgerClient>,
    pub report_cache: Cache<String, Value>,
    /// Held across snapshot clone and write so saves land in mutation order.
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_seconds.max(1)))
            .build()
            .map_err(|error| AppError::Internal(format!("Could not build HTTP client: {error}")))?;

        let upstream = match config.upstream_api_url.as_deref() {
            Some(base_url) => Some(
                LedgerClient::new(http_client, base_url)
                    .map_err(|error| AppError::Internal(format!("UPSTREAM_API_URL: {error}")))?,
            ),
            None => None,
        };

        let today = Utc::now().with_timezone(&config.timezone()).date_naive();
        let store = initial_store(&config, today).await?;

        Ok(Self::assemble(config, store, upstream))
    }

    fn assemble(config: AppConfig, store: LedgerStore, upstream: Option<LedgerClient>) -> Self {
        let report_cache = Cache::builder()
            .max_capacity(config.report_response_cache_max_entries.max(1))
            .time_to_live(Duration::from_secs(
                config.report_response_cache_ttl_seconds.max(1),
            ))
            .build();

        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
            upstream,
            report_cache,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Today in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now()
            .with_timezone(&self.config.timezone())
            .date_naive()
    }

    pub fn current_year(&self) -> i32 {
        self.today().year()
    }

    fn snapshot_path(&self) -> Option<PathBuf> {
        self.config.ledger_data_file.as_deref().map(PathBuf::from)
    }

    /// Drop cached report bodies and write the snapshot, if one is configured.
    /// Call after every mutation, with the write lock released.
    pub async fn persist(&self) -> AppResult<()> {
        self.report_cache.invalidate_all();
        let Some(path) = self.snapshot_path() else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.store.read().await.clone();
        save_snapshot(&path, &snapshot).await
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        let mut config = AppConfig::from_env();
        config.admin_passkey = Some("letmein".to_string());
        config.ledger_data_file = None;
        config.upstream_api_url = None;
        config.api_prefix = "/api/v1".to_string();
        let store = LedgerStore::seeded(&[2023, 2024], "2024-01-01T00:00:00Z");
        Self::assemble(config, store, None)
    }
}

async fn initial_store(config: &AppConfig, today: NaiveDate) -> AppResult<LedgerStore> {
    if let Some(path) = config.ledger_data_file.as_deref() {
        if let Some(store) = load_snapshot(PathBuf::from(path).as_path()).await? {
            tracing::info!(path, years = store.ledger.years.len(), "Loaded ledger snapshot");
            return Ok(store);
        }
    }

    if config.seed_sample_data {
        let year = today.year();
        let years = [year - 2, year - 1, year];
        tracing::info!(first_year = years[0], last_year = year, "Seeding sample ledger data");
        return Ok(LedgerStore::seeded(&years, &Utc::now().to_rfc3339()));
    }

    Ok(LedgerStore::default())
}
