use crate::adapters::dynamodb::MAX_TRANSACT_ITEMS;
use crate::runtime::contract::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PARTICIPANTS};
use crate::runtime::entry::DEFAULT_ENTRY_PATH_PREFIX;
use crate::runtime::orchestrator::DrawSettings;

pub const ENTRIES_TABLE_VAR: &str = "ENTRIES_TABLE";
pub const MAX_PARTICIPANTS_VAR: &str = "MAX_PARTICIPANTS";
pub const MAX_DRAW_ATTEMPTS_VAR: &str = "MAX_DRAW_ATTEMPTS";
pub const ENTRY_PATH_PREFIX_VAR: &str = "ENTRY_PATH_PREFIX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub entries_table: String,
    pub draw: DrawSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let entries_table = lookup(ENTRIES_TABLE_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing(ENTRIES_TABLE_VAR))?;

        let max_participants =
            positive_or_default(&lookup, MAX_PARTICIPANTS_VAR, DEFAULT_MAX_PARTICIPANTS)?;
        // A draw is persisted in one transaction.
        if max_participants > MAX_TRANSACT_ITEMS {
            return Err(ConfigError::Invalid {
                key: MAX_PARTICIPANTS_VAR,
                value: max_participants.to_string(),
                reason: "cannot exceed the 100 item transaction limit",
            });
        }
        let max_attempts =
            positive_or_default(&lookup, MAX_DRAW_ATTEMPTS_VAR, DEFAULT_MAX_ATTEMPTS)?;
        let entry_path_prefix = lookup(ENTRY_PATH_PREFIX_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENTRY_PATH_PREFIX.to_string());

        Ok(Self {
            entries_table,
            draw: DrawSettings {
                max_participants,
                max_attempts,
                entry_path_prefix,
            },
        })
    }
}

fn positive_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "must be a positive integer",
        }),
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "must be an unsigned integer",
        }),
    }
}
