use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub api_base_url: String,
    pub page_size: i64,
    pub newer_poll_interval_secs: u64,
    pub refresh_policy: RefreshPolicy,
    pub ad_every: usize,
    pub environment: Environment,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// What a full reload does to rows already in the cache: drop them outright
/// or keep them around hidden.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    Purge,
    Retain,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://postfeed.db?mode=rwc".to_string()),
            api_base_url: env::var("API_BASE_URL")?,
            page_size: env::var("PAGE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            newer_poll_interval_secs: env::var("NEWER_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            refresh_policy: env::var("REFRESH_POLICY")
                .unwrap_or_else(|_| "purge".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "retain" => RefreshPolicy::Retain,
                    _ => RefreshPolicy::Purge,
                })?,
            ad_every: env::var("AD_EVERY")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
