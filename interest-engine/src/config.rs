//! Configuration for the interest accrual engine

use crate::schedule::ScheduleConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Accrual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Ledger the engine credits into
    pub ledger: bank_ledger::Config,

    /// Monthly cycle schedule
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config {
            ledger: bank_ledger::Config::from_env()?,
            schedule: ScheduleConfig::default(),
        };

        if let Ok(day) = std::env::var("INTEREST_ENGINE_DAY_OF_MONTH") {
            config.schedule.day_of_month = day
                .parse()
                .map_err(|e| Error::Config(format!("Invalid day of month: {}", e)))?;
        }

        if let Ok(time) = std::env::var("INTEREST_ENGINE_TIME_UTC") {
            config.schedule.time_utc = time;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schedule.day_of_month, 1);
        assert_eq!(config.schedule.time_utc, "02:00");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.schedule.day_of_month, 1);
        assert_eq!(parsed.ledger.service_name, config.ledger.service_name);
    }
}
