use std::path::PathBuf;

use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// How the overview's "pending" card is computed.
///
/// `Legacy` reproduces the dashboard's historical figure, the invoice count
/// minus the paid sum. `PendingSum` sums the amounts of pending invoices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PendingTotal {
    #[default]
    Legacy,
    PendingSum,
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Artificial delay before revenue is returned, in milliseconds
    #[serde(default)]
    pub revenue_delay_ms: u64,

    #[serde(default)]
    pub pending_total: PendingTotal,

    /// Where the terminal dashboard writes its log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            revenue_delay_ms: 0,
            pending_total: PendingTotal::default(),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are loaded first if one exists.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();

        assert_eq!(config.database_url(), None);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.revenue_delay_ms, 0);
        assert_eq!(config.pending_total, PendingTotal::Legacy);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn reads_every_variable() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/invoices"),
            ("MAX_CONNECTIONS", "12"),
            ("REVENUE_DELAY_MS", "3000"),
            ("PENDING_TOTAL", "pending-sum"),
            ("LOG_DIR", "/tmp/dashboard"),
        ]))
        .unwrap();

        assert_eq!(config.database_url(), Some("postgres://localhost/invoices"));
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.revenue_delay_ms, 3000);
        assert_eq!(config.pending_total, PendingTotal::PendingSum);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/dashboard"));
    }

    #[test]
    fn rejects_unknown_pending_mode() {
        let result = envy::from_iter::<_, Config>(vars(&[("PENDING_TOTAL", "whatever")]));
        assert!(result.is_err());
    }
}
