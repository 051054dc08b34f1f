use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{GameRule, TimeControl};
use crate::error::AppError;

/// Process-wide settings, read once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub board_rows: usize,
    pub board_columns: usize,
    pub default_rule: GameRule,
    pub default_time_control: TimeControl,
    /// How long a disconnected seat may take to reclaim its slot.
    pub disconnect_grace: Duration,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    /// Bound on each connection's outbound queue.
    pub outbound_capacity: usize,
    pub default_rating: i32,
    pub reaper_interval: Duration,
    /// `None` selects the in-memory store.
    pub users_db: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub allow_anonymous: bool,
    /// JSON log lines (default) or human-readable output.
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            board_rows: 15,
            board_columns: 15,
            default_rule: GameRule::Standard,
            default_time_control: TimeControl::new(
                Duration::from_secs(600),
                Duration::ZERO,
                Duration::from_secs(60),
            ),
            disconnect_grace: Duration::from_secs(120),
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(60),
            outbound_capacity: 256,
            default_rating: 1200,
            reaper_interval: Duration::from_secs(60),
            users_db: None,
            jwt_secret: None,
            allow_anonymous: true,
            log_json: true,
        }
    }
}

impl ServerConfig {
    /// Reads `CARO_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let tc = defaults.default_time_control;

        let jwt_secret = lookup("CARO_JWT_SECRET").filter(|s| !s.is_empty());
        let allow_anonymous = match lookup("CARO_ALLOW_ANONYMOUS") {
            Some(raw) => parse_bool("CARO_ALLOW_ANONYMOUS", &raw)?,
            None => jwt_secret.is_none(),
        };

        let config = Self {
            host: lookup("CARO_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "CARO_PORT", defaults.port)?,
            board_rows: parsed(&lookup, "CARO_BOARD_ROWS", defaults.board_rows)?,
            board_columns: parsed(&lookup, "CARO_BOARD_COLUMNS", defaults.board_columns)?,
            default_rule: match lookup("CARO_DEFAULT_RULE") {
                Some(raw) => raw.parse().map_err(AppError::config)?,
                None => defaults.default_rule,
            },
            default_time_control: TimeControl::new(
                secs(&lookup, "CARO_TOTAL_TIME_SECS", tc.total)?,
                secs(&lookup, "CARO_INCREMENT_SECS", tc.increment)?,
                secs(&lookup, "CARO_MOVE_TIME_LIMIT_SECS", tc.move_limit)?,
            ),
            disconnect_grace: secs(&lookup, "CARO_DISCONNECT_GRACE_SECS", defaults.disconnect_grace)?,
            ping_interval: secs(&lookup, "CARO_PING_INTERVAL_SECS", defaults.ping_interval)?,
            ping_timeout: secs(&lookup, "CARO_PING_TIMEOUT_SECS", defaults.ping_timeout)?,
            outbound_capacity: parsed(&lookup, "CARO_OUTBOUND_CAPACITY", defaults.outbound_capacity)?,
            default_rating: parsed(&lookup, "CARO_DEFAULT_RATING", defaults.default_rating)?,
            reaper_interval: secs(&lookup, "CARO_REAPER_INTERVAL_SECS", defaults.reaper_interval)?,
            users_db: lookup("CARO_USERS_DB")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            jwt_secret,
            allow_anonymous,
            log_json: match lookup("CARO_LOG_FORMAT") {
                Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                    "json" => true,
                    "pretty" | "text" => false,
                    _ => {
                        return Err(AppError::config(format!(
                            "CARO_LOG_FORMAT has an invalid value: '{raw}'"
                        )))
                    }
                },
                None => defaults.log_json,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.board_rows == 0 || self.board_columns == 0 {
            return Err(AppError::config("board dimensions must be non-zero"));
        }
        if self.ping_interval.is_zero() || self.reaper_interval.is_zero() {
            return Err(AppError::config(
                "CARO_PING_INTERVAL_SECS and CARO_REAPER_INTERVAL_SECS must be non-zero",
            ));
        }
        if self.outbound_capacity == 0 {
            return Err(AppError::config("CARO_OUTBOUND_CAPACITY must be non-zero"));
        }
        if self.ping_timeout <= self.ping_interval {
            return Err(AppError::config(
                "CARO_PING_TIMEOUT_SECS must exceed CARO_PING_INTERVAL_SECS",
            ));
        }
        if !self.allow_anonymous && self.jwt_secret.is_none() {
            return Err(AppError::config(
                "CARO_JWT_SECRET is required when anonymous access is disabled",
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}

fn secs<F>(lookup: &F, name: &str, default: Duration) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    parsed(lookup, name, default.as_secs()).map(Duration::from_secs)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::config(format!("{name} has an invalid value: '{raw}'"))),
    }
}
