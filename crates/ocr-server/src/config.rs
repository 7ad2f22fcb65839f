//! Environment-driven process configuration.
//!
//! Only one profile, `local`, is recognized today — `PROFILE` unset or
//! empty defaults to it; anything else is a fatal configuration error at
//! startup, mirroring `mustGetProperProfile` in the original coordinator's
//! config loader. A second profile (e.g. `prod`, with TLS and pool-size
//! overrides) is the natural next step but is not implemented; keeping the
//! check in place now means adding one later is a match arm, not a new
//! validation path.

use std::net::SocketAddr;

use ocr_http::config::DEFAULT_PORT;
use ocr_workers::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_POOL_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Local,
}

impl Profile {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" | "local" => Some(Profile::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: Profile,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub ocr_pool_size: usize,
    pub deleter_pool_size: usize,
    pub channel_capacity: usize,
}

/// Error constructing a [`Config`] from the environment. Every variant here
/// is treated as fatal by `main` — there is no recovery path for a process
/// that cannot determine its own configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PROFILE={0:?} is not a recognized profile")]
    UnrecognizedProfile(String),

    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_profile = std::env::var("PROFILE").unwrap_or_default();
        let profile = Profile::parse(&raw_profile)
            .ok_or_else(|| ConfigError::UnrecognizedProfile(raw_profile.clone()))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let ocr_pool_size = std::env::var("OCR_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);
        let deleter_pool_size = std::env::var("DELETER_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);
        let channel_capacity = std::env::var("WORKER_CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);

        Ok(Self {
            profile,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            database_url,
            ocr_pool_size,
            deleter_pool_size,
            channel_capacity,
        })
    }
}

/// Redacts the password component of a Postgres connection string before
/// it is logged.
pub fn mask_db_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        let (prefix, suffix) = url.split_at(at_pos);
        if let Some(colon_pos) = prefix.rfind(':') {
            format!("{}:***{}", &prefix[..colon_pos], suffix)
        } else {
            url.to_string()
        }
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_defaults_to_local() {
        assert_eq!(Profile::parse(""), Some(Profile::Local));
    }

    #[test]
    fn local_profile_is_recognized() {
        assert_eq!(Profile::parse("local"), Some(Profile::Local));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert_eq!(Profile::parse("prod"), None);
    }
}
