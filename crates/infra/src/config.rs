//! Configuration loading and representation.
//!
//! All settings come from environment variables:
//!
//! | variable | default |
//! |---|---|
//! | `PORT` | `3000` |
//! | `USE_PERSISTENT_STORES` | `false` |
//! | `DATABASE_URL` | required when persistent stores are enabled |
//! | `PAYMENT_DELAY_MS` | `2000` |
//! | `ORDER_TRANSITIONS` | `permissive` (`permissive` \| `strict`) |
//! | `STOCK_ON_FAILURE` | `keep` (`keep` \| `restore`) |

use std::time::Duration;

use thiserror::Error;

use orderdesk_orders::TransitionPolicy;

use crate::workflow::StockPolicy;
use crate::workflow::payment::DEFAULT_PAYMENT_DELAY;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set when USE_PERSISTENT_STORES=true")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// `Some` selects the Postgres stores.
    pub database_url: Option<String>,
    pub payment_delay: Duration,
    pub transition_policy: TransitionPolicy,
    pub stock_policy: StockPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            payment_delay: DEFAULT_PAYMENT_DELAY,
            transition_policy: TransitionPolicy::default(),
            stock_policy: StockPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source (the process environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(raw) = lookup("PORT") {
            config.port = parse("PORT", &raw, |s| s.parse::<u16>().map_err(|e| e.to_string()))?;
        }

        let persistent = match lookup("USE_PERSISTENT_STORES") {
            Some(raw) => parse("USE_PERSISTENT_STORES", &raw, parse_bool)?,
            None => false,
        };
        if persistent {
            let url = lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing {
                    var: "DATABASE_URL",
                })?;
            config.database_url = Some(url);
        }

        if let Some(raw) = lookup("PAYMENT_DELAY_MS") {
            let millis = parse("PAYMENT_DELAY_MS", &raw, |s| {
                s.parse::<u64>().map_err(|e| e.to_string())
            })?;
            config.payment_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("ORDER_TRANSITIONS") {
            config.transition_policy = parse("ORDER_TRANSITIONS", &raw, |s| {
                s.parse::<TransitionPolicy>().map_err(|e| e.to_string())
            })?;
        }

        if let Some(raw) = lookup("STOCK_ON_FAILURE") {
            config.stock_policy = parse("STOCK_ON_FAILURE", &raw, |s| {
                s.parse::<StockPolicy>().map_err(|e| e.to_string())
            })?;
        }

        Ok(config)
    }

    pub fn use_persistent_stores(&self) -> bool {
        self.database_url.is_some()
    }
}

fn parse<T>(
    var: &'static str,
    raw: &str,
    f: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    f(raw.trim()).map_err(|reason| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason,
    })
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}
