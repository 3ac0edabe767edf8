#![allow(dead_code)]

use std::env;

use chrono_tz::Tz;

const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
    pub request_timeout_seconds: u64,
    pub admin_passkey: Option<String>,
    pub auth_session_hours: i64,
    pub ledger_data_file: Option<String>,
    pub seed_sample_data: bool,
    pub upstream_api_url: Option<String>,
    pub upstream_timeout_seconds: u64,
    pub report_response_cache_ttl_seconds: u64,
    pub report_response_cache_max_entries: u64,
    pub app_timezone: String,
    pub expense_anomaly_multiplier: f64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "Rent Ledger API"),
            environment: env_or("ENVIRONMENT", "development"),
            api_prefix: normalize_prefix(&env_or("API_PREFIX", "/api/v1")),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 5000),
            cors_origins: parse_csv(&env_or("CORS_ORIGINS", "http://localhost:3000")),
            rate_limit_per_second: env_parse_or("RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst_size: env_parse_or("RATE_LIMIT_BURST_SIZE", 100),
            request_timeout_seconds: env_parse_or("REQUEST_TIMEOUT_SECONDS", 30),
            admin_passkey: env_opt("ADMIN_PASSKEY"),
            auth_session_hours: env_parse_or("AUTH_SESSION_HOURS", 24),
            ledger_data_file: env_opt("LEDGER_DATA_FILE"),
            seed_sample_data: env_parse_bool_or("SEED_SAMPLE_DATA", true),
            upstream_api_url: env_opt("UPSTREAM_API_URL"),
            upstream_timeout_seconds: env_parse_or("UPSTREAM_TIMEOUT_SECONDS", 15),
            report_response_cache_ttl_seconds: env_parse_or(
                "REPORT_RESPONSE_CACHE_TTL_SECONDS",
                20,
            ),
            report_response_cache_max_entries: env_parse_or(
                "REPORT_RESPONSE_CACHE_MAX_ENTRIES",
                500,
            ),
            app_timezone: env_or("APP_TIMEZONE", DEFAULT_TIMEZONE.name()),
            expense_anomaly_multiplier: env_parse_or("EXPENSE_ANOMALY_MULTIPLIER", 3.0),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    /// Timezone used to decide "today" for current-year views.
    pub fn timezone(&self) -> Tz {
        self.app_timezone
            .trim()
            .parse::<Tz>()
            .unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn anomaly_multiplier(&self) -> f64 {
        if self.expense_anomaly_multiplier.is_finite() && self.expense_anomaly_multiplier > 0.0 {
            self.expense_anomaly_multiplier
        } else {
            3.0
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_parse_bool_or(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase) {
        Some(value) if value == "1" || value == "true" || value == "yes" || value == "on" => true,
        Some(value) if value == "0" || value == "false" || value == "no" || value == "off" => false,
        Some(_) => default,
        None => default,
    }
}

pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn normalize_prefix(raw: &str) -> String {
    let mut prefix = raw.trim().to_string();
    if prefix.is_empty() {
        return "/api/v1".to_string();
    }
    if !prefix.starts_with('/') {
        prefix.insert(0, '/');
    }
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix
}
