use std::{env, time::Duration};

use log::*;
use loyalty_common::helpers::{parse_boolean_flag, parse_seconds};

use crate::errors::ServerError;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://localhost:8080";
const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SUBMISSION_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_RECONCILIATION_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// The base URL of the accrual service, e.g. `http://localhost:8080`. Requests go to `{base}/api/orders`.
    pub accrual_address: String,
    /// The request timeout for calls to the accrual service. A timed-out call is retried on the next pass.
    pub accrual_timeout: Duration,
    /// The time between passes of the submission worker.
    pub submission_interval: Duration,
    /// The time between passes of the reconciliation worker.
    pub reconciliation_interval: Duration,
    /// If true, database migrations are run at startup.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            accrual_address: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            accrual_timeout: DEFAULT_ACCRUAL_TIMEOUT,
            submission_interval: DEFAULT_SUBMISSION_INTERVAL,
            reconciliation_interval: DEFAULT_RECONCILIATION_INTERVAL,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("LP_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ LP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_connections = env::var("LP_DATABASE_MAX_CONNECTIONS")
            .map(|s| {
                s.parse::<u32>().ok().filter(|n| *n > 0).unwrap_or_else(|| {
                    error!(
                        "🪛️ {s} is not a valid value for LP_DATABASE_MAX_CONNECTIONS. Using the default, \
                         {DEFAULT_MAX_CONNECTIONS}, instead."
                    );
                    DEFAULT_MAX_CONNECTIONS
                })
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let accrual_address = env::var("LP_ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| {
            warn!("🪛️ LP_ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}.");
            DEFAULT_ACCRUAL_SYSTEM_ADDRESS.into()
        });
        let accrual_timeout = configure_period("LP_ACCRUAL_TIMEOUT", DEFAULT_ACCRUAL_TIMEOUT);
        let submission_interval = configure_period("LP_SUBMISSION_INTERVAL", DEFAULT_SUBMISSION_INTERVAL);
        let reconciliation_interval = configure_period("LP_RECONCILIATION_INTERVAL", DEFAULT_RECONCILIATION_INTERVAL);
        let run_migrations = parse_boolean_flag(env::var("LP_RUN_MIGRATIONS").ok(), true);
        Self {
            database_url,
            max_connections,
            accrual_address,
            accrual_timeout,
            submission_interval,
            reconciliation_interval,
            run_migrations,
        }
    }

    /// Catches configurations that cannot possibly work, before anything is started.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.database_url.trim().is_empty() {
            return Err(ServerError::ConfigurationError("The database URL is empty".into()));
        }
        let address = self.accrual_address.trim();
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(ServerError::ConfigurationError(format!(
                "The accrual service address must be an http(s) URL. Got '{address}'"
            )));
        }
        Ok(())
    }
}

/// Reads a whole number of seconds from the environment variable `name`.
fn configure_period(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(s) => parse_seconds(&s).unwrap_or_else(|| {
            warn!("🪛️ Invalid configuration value for {name}: '{s}'. Using the default of {}s.", default.as_secs());
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {}s.", default.as_secs());
            default
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // All the environment manipulation happens in one test, since tests run in parallel threads
    #[test]
    fn config_from_env() {
        let vars = [
            "LP_DATABASE_URL",
            "LP_DATABASE_MAX_CONNECTIONS",
            "LP_ACCRUAL_SYSTEM_ADDRESS",
            "LP_ACCRUAL_TIMEOUT",
            "LP_SUBMISSION_INTERVAL",
            "LP_RECONCILIATION_INTERVAL",
            "LP_RUN_MIGRATIONS",
        ];
        vars.iter().for_each(|v| env::remove_var(v));
        let config = ServerConfig::from_env_or_default();
        assert_eq!(config.database_url, "sqlite://data/loyalty.db");
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.accrual_address, "http://localhost:8080");
        assert_eq!(config.accrual_timeout, Duration::from_secs(10));
        assert_eq!(config.submission_interval, Duration::from_secs(3));
        assert_eq!(config.reconciliation_interval, Duration::from_secs(5));
        assert!(config.run_migrations);
        assert!(config.validate().is_ok());

        env::set_var("LP_DATABASE_URL", "sqlite://tmp/test.db");
        env::set_var("LP_DATABASE_MAX_CONNECTIONS", "5");
        env::set_var("LP_ACCRUAL_SYSTEM_ADDRESS", "http://accrual:9000/");
        env::set_var("LP_SUBMISSION_INTERVAL", "1");
        env::set_var("LP_RECONCILIATION_INTERVAL", "0");
        env::set_var("LP_ACCRUAL_TIMEOUT", "soon");
        env::set_var("LP_RUN_MIGRATIONS", "false");
        let config = ServerConfig::from_env_or_default();
        assert_eq!(config.database_url, "sqlite://tmp/test.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.accrual_address, "http://accrual:9000/");
        assert_eq!(config.submission_interval, Duration::from_secs(1));
        // Invalid values fall back to the defaults
        assert_eq!(config.reconciliation_interval, Duration::from_secs(5));
        assert_eq!(config.accrual_timeout, Duration::from_secs(10));
        assert!(!config.run_migrations);

        env::set_var("LP_DATABASE_MAX_CONNECTIONS", "0");
        assert_eq!(ServerConfig::from_env_or_default().max_connections, 25);
        vars.iter().for_each(|v| env::remove_var(v));
    }

    #[test]
    fn validation() {
        let config = ServerConfig { accrual_address: "localhost:8080".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ServerError::ConfigurationError(_))));
        let config = ServerConfig { database_url: " ".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ServerError::ConfigurationError(_))));
        assert!(ServerConfig::default().validate().is_ok());
    }
}
