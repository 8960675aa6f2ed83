//! Application configuration
//!
//! Loaded from a TOML file (`~/.config/waypark/config.toml` by default,
//! overridden with `WAYPARK_CONFIG`). Every field has a default, so a partial
//! file (or none at all) yields a working configuration.
//!
//! ```toml
//! [server]
//! api_port = 8080
//!
//! [booking]
//! check_in_grace_minutes = 15
//!
//! [payments]
//! provider_timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ScheduleWindows;
use crate::domain::BookingPolicy;
use crate::infrastructure::DatabaseConfig;

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "WAYPARK_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub booking: BookingSection,
    pub payments: PaymentsSection,
    pub codes: CodesSection,
    pub scheduler: SchedulerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Full connection URL; takes precedence over `path`
    pub url: Option<String>,
    /// SQLite file used when no URL is given
    pub path: String,
    pub max_connections: u32,
    /// Insert a demo location with a few slots into an empty database
    pub seed_demo_data: bool,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            path: "./waypark.db".to_string(),
            max_connections: 10,
            seed_demo_data: true,
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path),
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
            max_connections: self.max_connections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "waypark=debug,tower_http=info"
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSection {
    pub check_in_grace_minutes: i64,
    pub full_refund_lead_minutes: i64,
    pub partial_refund_lead_minutes: i64,
    pub partial_refund_percent: i64,
}

impl Default for BookingSection {
    fn default() -> Self {
        let policy = BookingPolicy::default();
        Self {
            check_in_grace_minutes: policy.check_in_grace.num_minutes(),
            full_refund_lead_minutes: policy.full_refund_lead.num_minutes(),
            partial_refund_lead_minutes: policy.partial_refund_lead.num_minutes(),
            partial_refund_percent: policy.partial_refund_percent,
        }
    }
}

impl BookingSection {
    pub fn policy(&self) -> BookingPolicy {
        BookingPolicy {
            check_in_grace: chrono::Duration::minutes(self.check_in_grace_minutes),
            full_refund_lead: chrono::Duration::minutes(self.full_refund_lead_minutes),
            partial_refund_lead: chrono::Duration::minutes(self.partial_refund_lead_minutes),
            partial_refund_percent: self.partial_refund_percent,
        }
    }
}

/// Simulated provider behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedProvider {
    pub success_rate: f64,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsSection {
    pub provider_timeout_secs: u64,
    pub telebirr: SimulatedProvider,
    pub cbe: SimulatedProvider,
    pub chapa: SimulatedProvider,
}

impl Default for PaymentsSection {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 30,
            telebirr: SimulatedProvider {
                success_rate: 0.85,
                latency_ms: 1000,
            },
            cbe: SimulatedProvider {
                success_rate: 0.90,
                latency_ms: 1200,
            },
            chapa: SimulatedProvider {
                success_rate: 1.0,
                latency_ms: 800,
            },
        }
    }
}

impl PaymentsSection {
    pub fn provider_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesSection {
    /// Secret mixed into QR payload hashes
    pub qr_secret: String,
}

impl Default for CodesSection {
    fn default() -> Self {
        Self {
            qr_secret: "waypark-dev-secret-change-me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub enabled: bool,
    pub interval_secs: u64,
    pub reminder_lead_minutes: i64,
    pub urgent_reminder_lead_minutes: i64,
    pub expiry_warning_lead_minutes: i64,
    pub payment_reminder_after_minutes: i64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let windows = ScheduleWindows::default();
        Self {
            enabled: true,
            interval_secs: 300,
            reminder_lead_minutes: windows.reminder_lead.num_minutes(),
            urgent_reminder_lead_minutes: windows.urgent_reminder_lead.num_minutes(),
            expiry_warning_lead_minutes: windows.expiry_warning_lead.num_minutes(),
            payment_reminder_after_minutes: windows.payment_reminder_after.num_minutes(),
        }
    }
}

impl SchedulerSection {
    pub fn windows(&self) -> ScheduleWindows {
        ScheduleWindows {
            reminder_lead: chrono::Duration::minutes(self.reminder_lead_minutes),
            urgent_reminder_lead: chrono::Duration::minutes(self.urgent_reminder_lead_minutes),
            expiry_warning_lead: chrono::Duration::minutes(self.expiry_warning_lead_minutes),
            payment_reminder_after: chrono::Duration::minutes(self.payment_reminder_after_minutes),
        }
    }
}

impl AppConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.booking;
        if b.check_in_grace_minutes < 0 {
            return Err(ConfigError::Invalid(
                "booking.check_in_grace_minutes must not be negative".to_string(),
            ));
        }
        if b.partial_refund_lead_minutes > b.full_refund_lead_minutes {
            return Err(ConfigError::Invalid(
                "booking.partial_refund_lead_minutes must not exceed full_refund_lead_minutes"
                    .to_string(),
            ));
        }
        if !(0..=100).contains(&b.partial_refund_percent) {
            return Err(ConfigError::Invalid(
                "booking.partial_refund_percent must be between 0 and 100".to_string(),
            ));
        }
        for (name, p) in [
            ("telebirr", &self.payments.telebirr),
            ("cbe", &self.payments.cbe),
            ("chapa", &self.payments.chapa),
        ] {
            if !(0.0..=1.0).contains(&p.success_rate) {
                return Err(ConfigError::Invalid(format!(
                    "payments.{name}.success_rate must be between 0.0 and 1.0"
                )));
            }
        }
        if self.payments.provider_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "payments.provider_timeout_secs must be positive".to_string(),
            ));
        }
        if self.codes.qr_secret.is_empty() {
            return Err(ConfigError::Invalid("codes.qr_secret must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Config file location: `WAYPARK_CONFIG` if set, else the user config dir
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waypark")
        .join("config.toml")
}
