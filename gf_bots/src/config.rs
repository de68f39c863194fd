//! Match configuration.
//!
//! Flags take precedence over environment variables, which take precedence
//! over the defaults below.

use go_fish::{SessionConfig, constants::MAX_PLAYERS};
use pico_args::Arguments;

/// Everything needed to run a batch of headless matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotsConfig {
    /// Simulated human participants per match
    pub humans: usize,
    /// Automated participants per match
    pub bots: usize,
    /// Matches to play back to back
    pub games: usize,
    /// Seed for every random choice, for reproducible runs
    pub seed: Option<u64>,
    /// Base thinking pause for everyone, in milliseconds
    pub think_ms: u64,
    /// Print every game log line
    pub verbose: bool,
}

impl Default for BotsConfig {
    fn default() -> Self {
        Self {
            humans: 1,
            bots: 2,
            games: 1,
            seed: None,
            think_ms: 300,
            verbose: false,
        }
    }
}

impl BotsConfig {
    /// Load configuration from CLI flags and environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a flag value doesn't parse or the result is invalid
    pub fn from_args(pargs: &mut Arguments) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            humans: flag_or_env(pargs, "--humans", "GF_HUMANS")?.unwrap_or(defaults.humans),
            bots: flag_or_env(pargs, "--bots", "GF_BOTS")?.unwrap_or(defaults.bots),
            games: flag_or_env(pargs, "--games", "GF_GAMES")?.unwrap_or(defaults.games),
            seed: flag_or_env(pargs, "--seed", "GF_SEED")?,
            think_ms: flag_or_env(pargs, "--think-ms", "GF_THINK_MS")?
                .unwrap_or(defaults.think_ms),
            verbose: pargs.contains(["-v", "--verbose"]),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.humans == 0 {
            return Err(ConfigError::Invalid {
                var: "GF_HUMANS".to_string(),
                reason: "A match needs at least one human to host it".to_string(),
            });
        }

        let players = self.humans + self.bots;
        if !(2..=MAX_PLAYERS).contains(&players) {
            return Err(ConfigError::Invalid {
                var: "GF_BOTS".to_string(),
                reason: format!("Need 2-{MAX_PLAYERS} players in total, got {players}"),
            });
        }

        if self.games == 0 {
            return Err(ConfigError::Invalid {
                var: "GF_GAMES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Per-session configuration derived from these settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            bot_think_time_ms: self.think_ms,
            bot_think_variance_ms: self.think_ms / 2,
            book_celebration_ms: self.think_ms * 2,
            ..SessionConfig::default()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {flag}: {reason}")]
    BadFlag { flag: String, reason: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn flag_or_env<T>(pargs: &mut Arguments, flag: &'static str, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let from_flag = pargs
        .opt_value_from_str::<_, T>(flag)
        .map_err(|e| ConfigError::BadFlag {
            flag: flag.to_string(),
            reason: e.to_string(),
        })?;
    Ok(from_flag.or_else(|| parse_env(var)))
}

/// Helper to parse an environment variable, ignoring unparseable values
fn parse_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
