//! Application-level configuration loading, including the game rules and seed rosters.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CONTACT_REFEREE_CONFIG_PATH";

/// Tunable constants that drive arbitration, reminders and output throttling.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    /// Time a clue may stay unconfirmed after a new letter before its setter is reminded.
    pub schroedinger_timeout: Duration,
    /// Time a guess may stay unanswered before its clue setter is reminded.
    pub guess_timeout: Duration,
    /// Age after which a wave no longer counts toward the ping threshold.
    pub wave_horizon: Duration,
    /// Number of live waves that must be exceeded before the pinglist is pinged.
    pub waves_for_ping: usize,
    /// Active clue count at which the ceiling advisory is sent.
    pub max_clues: usize,
    /// Total contacts across active clues at which passing is suggested.
    pub contact_threshold: usize,
    /// Default `!shutup` duration.
    pub default_mute: Duration,
    /// Identical outbound text is dropped when repeated within this window.
    pub dedup_window: Duration,
    /// Messages longer than this are dropped when the length check applies.
    pub max_message_len: usize,
    /// Character that starts a bot command.
    pub command_prefix: char,
    /// Minimum interval between pin toggles.
    pub pin_cooldown: Duration,
    /// Minimum interval between pinglist broadcasts.
    pub ping_cooldown: Duration,
    /// Minimum interval between roster listings.
    pub list_cooldown: Duration,
    /// Names mentioned per ping message.
    pub ping_batch: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            schroedinger_timeout: Duration::from_secs(90),
            guess_timeout: Duration::from_secs(30),
            wave_horizon: Duration::from_secs(1800),
            waves_for_ping: 3,
            max_clues: 10,
            contact_threshold: 5,
            default_mute: Duration::from_secs(600),
            dedup_window: Duration::from_secs(5),
            max_message_len: 500,
            command_prefix: '!',
            pin_cooldown: Duration::from_secs(1),
            ping_cooldown: Duration::from_secs(10),
            list_cooldown: Duration::from_secs(10),
            ping_batch: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Game rules handed to the referee.
    pub rules: Rules,
    /// User ids trusted to command the bot before any roster is persisted.
    pub whitelist: Vec<u64>,
    /// Names pinged before any roster is persisted.
    pub pinglist: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the built-in rules.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        whitelist = app_config.whitelist.len(),
                        pinglist = app_config.pinglist.len(),
                        "loaded referee config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    rules: RawRules,
    whitelist: Vec<u64>,
    pinglist: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// Rule overrides; anything left out keeps its built-in value.
struct RawRules {
    schroedinger_timeout_secs: Option<u64>,
    guess_timeout_secs: Option<u64>,
    wave_horizon_secs: Option<u64>,
    waves_for_ping: Option<usize>,
    max_clues: Option<usize>,
    contact_threshold: Option<usize>,
    default_mute_secs: Option<u64>,
    dedup_window_secs: Option<u64>,
    max_message_len: Option<usize>,
    command_prefix: Option<char>,
    ping_batch: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            rules: value.rules.into(),
            whitelist: value.whitelist,
            pinglist: value.pinglist,
        }
    }
}

impl From<RawRules> for Rules {
    fn from(raw: RawRules) -> Self {
        let defaults = Rules::default();
        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };
        Self {
            schroedinger_timeout: secs(raw.schroedinger_timeout_secs, defaults.schroedinger_timeout),
            guess_timeout: secs(raw.guess_timeout_secs, defaults.guess_timeout),
            wave_horizon: secs(raw.wave_horizon_secs, defaults.wave_horizon),
            waves_for_ping: raw.waves_for_ping.unwrap_or(defaults.waves_for_ping),
            max_clues: raw.max_clues.unwrap_or(defaults.max_clues),
            contact_threshold: raw.contact_threshold.unwrap_or(defaults.contact_threshold),
            default_mute: secs(raw.default_mute_secs, defaults.default_mute),
            dedup_window: secs(raw.dedup_window_secs, defaults.dedup_window),
            max_message_len: raw.max_message_len.unwrap_or(defaults.max_message_len),
            command_prefix: raw.command_prefix.unwrap_or(defaults.command_prefix),
            ping_batch: raw.ping_batch.unwrap_or(defaults.ping_batch).max(1),
            ..defaults
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_rules_keep_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"rules": {"max_clues": 4}, "pinglist": ["alice"]}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.rules.max_clues, 4);
        assert_eq!(config.rules.guess_timeout, Duration::from_secs(30));
        assert_eq!(config.pinglist, vec!["alice".to_string()]);
        assert!(config.whitelist.is_empty());
    }
}
