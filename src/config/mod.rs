//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;

use crate::game::personality::{PersonalityPool, PersonalityPoolLoadError};
use crate::game::{DuelSettings, GoWindow, MatchTarget};
use crate::util::time::SIMULATION_TPS;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runner configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// RNG seed; random when unset
    pub seed: Option<u64>,
    /// Start on the practice range
    pub practice: bool,
    /// Opponent scheduler enabled
    pub enemy_ai: bool,
    pub match_target: MatchTarget,

    /// Simulation ticks per second
    pub tick_rate: u32,
    /// JSON personality pool (built-in archetypes when unset)
    pub personality_file: Option<PathBuf>,
    /// Scripted human reaction after the go signal
    pub autopilot_reaction_ms: u64,
    /// Stop after this many rounds (endless matches never conclude)
    pub max_rounds: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_format = match env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Ok(v) if v.eq_ignore_ascii_case("pretty") || v.is_empty() => LogFormat::Pretty,
            Ok(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
            Err(_) => LogFormat::Pretty,
        };

        let match_target = match env::var("DUEL_MATCH_TARGET") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("DUEL_MATCH_TARGET"))?,
            Err(_) => MatchTarget::default(),
        };

        let tick_rate = parse_or("DUEL_TICK_RATE", SIMULATION_TPS)?;
        if tick_rate == 0 {
            return Err(ConfigError::Invalid("DUEL_TICK_RATE"));
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,

            seed: match env::var("DUEL_SEED") {
                Ok(v) => Some(v.parse().map_err(|_| ConfigError::Invalid("DUEL_SEED"))?),
                Err(_) => None,
            },
            practice: parse_flag("DUEL_PRACTICE", false)?,
            enemy_ai: parse_flag("DUEL_ENEMY_AI", true)?,
            match_target,

            tick_rate,
            personality_file: env::var("DUEL_PERSONALITY_FILE").ok().map(PathBuf::from),
            autopilot_reaction_ms: parse_or("DUEL_AUTOPILOT_REACTION_MS", 220)?,
            max_rounds: parse_or("DUEL_MAX_ROUNDS", 25)?,
        })
    }

    /// Simulation settings for a duel, using `fallback_seed` when none was configured
    pub fn duel_settings(&self, fallback_seed: u64) -> DuelSettings {
        DuelSettings {
            practice: self.practice,
            enemy_ai: self.enemy_ai,
            match_target: self.match_target,
            seed: self.seed.unwrap_or(fallback_seed),
            go_window: GoWindow::default(),
        }
    }

    /// Read and validate the personality pool
    pub fn load_personality_pool(&self) -> Result<PersonalityPool, ConfigError> {
        let Some(path) = &self.personality_file else {
            return Ok(PersonalityPool::default());
        };
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::PersonalityFile {
            path: path.clone(),
            source,
        })?;
        Ok(PersonalityPool::from_json(&json)?)
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Cannot read personality file {path:?}: {source}")]
    PersonalityFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Personality(#[from] PersonalityPoolLoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test touches the process environment so nothing races on it
    #[test]
    fn test_from_env_defaults_and_overrides() {
        let keys = [
            "LOG_FORMAT",
            "DUEL_MATCH_TARGET",
            "DUEL_TICK_RATE",
            "DUEL_SEED",
            "DUEL_PRACTICE",
            "DUEL_ENEMY_AI",
            "DUEL_PERSONALITY_FILE",
            "DUEL_AUTOPILOT_REACTION_MS",
            "DUEL_MAX_ROUNDS",
        ];
        for k in keys {
            env::remove_var(k);
        }

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.match_target, MatchTarget::FirstTo(3));
        assert_eq!(cfg.tick_rate, 60);
        assert!(cfg.seed.is_none());
        assert!(!cfg.practice);
        assert!(cfg.enemy_ai);
        assert_eq!(cfg.autopilot_reaction_ms, 220);
        assert_eq!(cfg.max_rounds, 25);
        assert_eq!(cfg.duel_settings(77).seed, 77);

        env::set_var("LOG_FORMAT", "json");
        env::set_var("DUEL_MATCH_TARGET", "endless");
        env::set_var("DUEL_SEED", "42");
        env::set_var("DUEL_PRACTICE", "yes");
        env::set_var("DUEL_ENEMY_AI", "0");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.match_target, MatchTarget::Endless);
        assert_eq!(cfg.duel_settings(77).seed, 42);
        assert!(cfg.practice);
        assert!(!cfg.enemy_ai);

        env::set_var("DUEL_TICK_RATE", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("DUEL_TICK_RATE"))
        ));
        env::set_var("DUEL_TICK_RATE", "60");

        env::set_var("DUEL_PRACTICE", "maybe");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("DUEL_PRACTICE"))
        ));

        for k in keys {
            env::remove_var(k);
        }
    }

    #[test]
    fn test_missing_personality_file() {
        let cfg = Config {
            log_level: "info".into(),
            log_format: LogFormat::Pretty,
            seed: None,
            practice: false,
            enemy_ai: true,
            match_target: MatchTarget::default(),
            tick_rate: 60,
            personality_file: Some(PathBuf::from("/nonexistent/personalities.json")),
            autopilot_reaction_ms: 220,
            max_rounds: 25,
        };
        assert!(matches!(
            cfg.load_personality_pool(),
            Err(ConfigError::PersonalityFile { .. })
        ));

        let builtin = Config {
            personality_file: None,
            ..cfg
        };
        assert_eq!(builtin.load_personality_pool().unwrap().entries().len(), 5);
    }
}
