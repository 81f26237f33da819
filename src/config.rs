use crate::domain::Money;
use crate::engine::score::ChileanRules;
use crate::engine::ScoreRules;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub default_rate_per_minute: Money,
    pub shift_policy: ShiftPolicy,
    pub score_rules: ScoreRules,
    pub bootstrap_admin: String,
}

/// Whether sales may be recorded while no shift is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftPolicy {
    #[default]
    Required,
    Optional,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let default_rate_per_minute = env_map
            .get("DEFAULT_RATE_PER_MINUTE")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<Money>()
            .ok()
            .filter(|rate| !rate.is_negative())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DEFAULT_RATE_PER_MINUTE".to_string(),
                    "must be a non-negative decimal".to_string(),
                )
            })?;

        let shift_policy = match env_map
            .get("SHIFT_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("required")
        {
            "required" => ShiftPolicy::Required,
            "optional" => ShiftPolicy::Optional,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SHIFT_POLICY".to_string(),
                    format!("must be required or optional, got {}", other),
                ))
            }
        };

        let defaults = ChileanRules::default();
        let total_points = parse_u32(&env_map, "CHILEAN_TOTAL_POINTS", defaults.total_points)?;
        let early_win_threshold =
            parse_u32(&env_map, "CHILEAN_WIN_THRESHOLD", defaults.early_win_threshold)?;
        if early_win_threshold >= total_points {
            return Err(ConfigError::InvalidValue(
                "CHILEAN_WIN_THRESHOLD".to_string(),
                format!("must be below CHILEAN_TOTAL_POINTS ({})", total_points),
            ));
        }

        let strict = match env_map.get("CHILEAN_WIN_STRICT").map(|s| s.trim()) {
            None => defaults.strict,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "CHILEAN_WIN_STRICT".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let bootstrap_admin = env_map
            .get("BOOTSTRAP_ADMIN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "admin".to_string());

        Ok(Config {
            port,
            database_path,
            default_rate_per_minute,
            shift_policy,
            score_rules: ScoreRules {
                chilean: ChileanRules {
                    total_points,
                    early_win_threshold,
                    strict,
                },
            },
            bootstrap_admin,
        })
    }
}

fn parse_u32(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u32,
) -> Result<u32, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a valid u32".to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_rate_per_minute, Money::ZERO);
        assert_eq!(config.shift_policy, ShiftPolicy::Required);
        assert_eq!(config.score_rules.chilean.total_points, 120);
        assert_eq!(config.score_rules.chilean.early_win_threshold, 60);
        assert!(config.score_rules.chilean.strict);
        assert_eq!(config.bootstrap_admin, "admin");
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("DEFAULT_RATE_PER_MINUTE".to_string(), "-1".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DEFAULT_RATE_PER_MINUTE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_optional_shift_policy() {
        let mut env_map = setup_required_env();
        env_map.insert("SHIFT_POLICY".to_string(), "optional".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.shift_policy, ShiftPolicy::Optional);
    }

    #[test]
    fn test_invalid_shift_policy() {
        let mut env_map = setup_required_env();
        env_map.insert("SHIFT_POLICY".to_string(), "sometimes".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SHIFT_POLICY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_threshold_must_be_below_total() {
        let mut env_map = setup_required_env();
        env_map.insert("CHILEAN_WIN_THRESHOLD".to_string(), "120".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CHILEAN_WIN_THRESHOLD"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_win_strictness() {
        let mut env_map = setup_required_env();
        env_map.insert("CHILEAN_WIN_STRICT".to_string(), "false".to_string());
        let config = Config::from_env_map(env_map.clone()).unwrap();
        assert!(!config.score_rules.chilean.strict);

        env_map.insert("CHILEAN_WIN_STRICT".to_string(), "maybe".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CHILEAN_WIN_STRICT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
