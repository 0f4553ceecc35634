use crate::ingest::CoercionPolicy;
use crate::models::DayWindow;
use std::{env, path::PathBuf};
use thiserror::Error;

const DEFAULT_DATA_PATH: &str = "data/spend.json";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    pub day_window: DayWindow,
    pub coercion: CoercionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{variable}: {message}")]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_path = lookup("SPEND_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let day_window = match lookup("SPEND_AS_OF_DAY") {
            Some(value) => parse_day_window(&value).map_err(|message| ConfigError {
                variable: "SPEND_AS_OF_DAY",
                message,
            })?,
            None => DayWindow::All,
        };

        let coercion = match lookup("SPEND_COERCION") {
            Some(value) => value.parse::<CoercionPolicy>().map_err(|message| ConfigError {
                variable: "SPEND_COERCION",
                message,
            })?,
            None => CoercionPolicy::default(),
        };

        Ok(Self {
            data_path,
            port,
            day_window,
            coercion,
        })
    }
}

/// `all`, or the last elapsed day (1-based).
pub fn parse_day_window(value: &str) -> Result<DayWindow, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return Ok(DayWindow::All);
    }
    match value.parse::<u32>() {
        Ok(day) if day >= 1 => Ok(DayWindow::UpTo(day)),
        _ => Err(format!("expected 'all' or a day number >= 1, got '{value}'")),
    }
}
