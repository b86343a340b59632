use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Default Gemini `generateContent` endpoint; the API key is appended as `?key=`.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent";

/// Upstream call budget for the proxy.
pub const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 15;

/// Values shipped in sample `.env` files that must never be sent upstream.
const PLACEHOLDER_API_KEYS: &[&str] = &["YOUR_API_KEY_HERE", "YOUR_GEMINI_API_KEY"];

#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub debug: bool,
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub owner_name: String,
    pub static_dir: String,
    /// Raw `ALLOWED_HOSTS` entries; see `service_core::middleware::AllowedHosts`.
    pub allowed_hosts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    /// Address that receives contact form notifications.
    pub recipient: String,
    /// STARTTLS on a plain connection.
    pub use_tls: bool,
    /// Implicit TLS from the first byte (usually port 465). Wins over `use_tls`.
    pub use_ssl: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub api_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// The key, unless it is missing, blank, or a sample placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        let key = self.api_key.as_ref()?.expose_secret().trim();
        if key.is_empty() || PLACEHOLDER_API_KEYS.contains(&key) {
            None
        } else {
            Some(key)
        }
    }
}

impl PortfolioConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let debug = get_bool("DEBUG", false);

        let smtp_user = get_env("SMTP_USER", Some(""), is_prod)?;
        let from_email = env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| smtp_user.clone());

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "portfolio-service".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| if debug { "debug" } else { "info" }.to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            debug,
            site: SiteConfig {
                owner_name: env::var("SITE_OWNER_NAME")
                    .unwrap_or_else(|_| "Portfolio".to_string()),
                static_dir: env::var("STATIC_DIR")
                    .unwrap_or_else(|_| "portfolio-service/static".to_string()),
                allowed_hosts: split_list(
                    &env::var("ALLOWED_HOSTS").unwrap_or_else(|_| "127.0.0.1,localhost".into()),
                ),
            },
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_parsed("DATABASE_MAX_CONNECTIONS", 5),
                min_connections: get_parsed("DATABASE_MIN_CONNECTIONS", 1),
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: get_parsed("SMTP_PORT", 587),
                password: Secret::new(get_env("SMTP_PASSWORD", Some(""), is_prod)?),
                recipient: env::var("CONTACT_RECIPIENT").unwrap_or_else(|_| from_email.clone()),
                from_email,
                from_name: env::var("SMTP_FROM_NAME")
                    .unwrap_or_else(|_| "Portfolio Contact Form".to_string()),
                user: smtp_user,
                use_tls: get_bool("SMTP_USE_TLS", true),
                use_ssl: get_bool("SMTP_USE_SSL", false),
                enabled: get_bool("SMTP_ENABLED", false),
            },
            gemini: GeminiConfig {
                api_key: env::var("GEMINI_API_KEY").ok().map(Secret::new),
                api_url: env::var("GEMINI_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
                timeout: Duration::from_secs(get_parsed(
                    "GEMINI_TIMEOUT_SECS",
                    DEFAULT_GEMINI_TIMEOUT_SECS,
                )),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn get_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
