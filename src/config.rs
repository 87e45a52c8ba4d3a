use std::env;

use crate::error::FleetError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, FleetError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 5000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 64)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, FleetError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| FleetError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
