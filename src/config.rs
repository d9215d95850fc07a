use std::path::PathBuf;
use std::time::Duration;

use chatgpt::config::ChatGPTEngine;

use crate::store::{LEADERBOARD_FILE, SAVED_QUESTIONS_FILE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

pub struct Config {
    pub chatgpt_api_key: String,
    pub chatgpt_engine: ChatGPTEngine,
    pub data_dir: PathBuf,
    pub dialogue_db: String,
    pub provider_timeout: Duration,
}

impl Config {
    const DEFAULT_TIMEOUT_SECS: u64 = 90;

    /// Reads the configuration from the environment, `.env` included.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let chatgpt_api_key = lookup("CHATGPT_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("CHATGPT_API_KEY"))?;

        let chatgpt_engine = match lookup("CHATGPT_ENGINE").as_deref() {
            None | Some("") | Some("gpt-3.5-turbo") => ChatGPTEngine::Gpt35Turbo,
            Some("gpt-4") => ChatGPTEngine::Gpt4,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "CHATGPT_ENGINE",
                    value: other.to_string(),
                })
            }
        };

        let provider_timeout = match lookup("PROVIDER_TIMEOUT_SECS") {
            None => Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "PROVIDER_TIMEOUT_SECS",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            chatgpt_api_key,
            chatgpt_engine,
            data_dir: lookup("QUIZ_DATA_DIR").unwrap_or_else(|| "data".to_string()).into(),
            dialogue_db: lookup("DIALOGUE_DB").unwrap_or_else(|| "db.sqlite".to_string()),
            provider_timeout,
        })
    }

    pub fn saved_questions_path(&self) -> PathBuf {
        self.data_dir.join(SAVED_QUESTIONS_FILE)
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.data_dir.join(LEADERBOARD_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("CHATGPT_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.provider_timeout, Duration::from_secs(90));
        assert_eq!(config.dialogue_db, "db.sqlite");
        assert_eq!(
            config.saved_questions_path(),
            PathBuf::from("data").join(SAVED_QUESTIONS_FILE)
        );
    }

    #[test]
    fn api_key_is_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::Missing("CHATGPT_API_KEY"))
        ));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config_from(&[("CHATGPT_API_KEY", "k"), ("PROVIDER_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { var: "PROVIDER_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            config_from(&[("CHATGPT_API_KEY", "k"), ("CHATGPT_ENGINE", "gpt-2")]),
            Err(ConfigError::Invalid { var: "CHATGPT_ENGINE", .. })
        ));
        let config = config_from(&[
            ("CHATGPT_API_KEY", "k"),
            ("PROVIDER_TIMEOUT_SECS", "15"),
            ("QUIZ_DATA_DIR", "/var/lib/quiz"),
        ])
        .unwrap();
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
        assert_eq!(config.leaderboard_path(), PathBuf::from("/var/lib/quiz").join(LEADERBOARD_FILE));
    }
}
