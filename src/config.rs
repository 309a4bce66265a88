//! Environment configuration

use crate::state_machine::{ConvContext, FollowUpPolicy};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Settings read once at start-up
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// URL the agent client posts to
    pub agent_endpoint: String,
    pub request_timeout: Duration,
    pub result_timeout: Duration,
    pub asking_timeout: Duration,
    pub follow_up: FollowUpPolicy,
    /// JSON file with calendar events; empty calendar when unset
    pub calendar_events_path: Option<PathBuf>,
    pub calendar_window_days: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let agent_endpoint = lookup("AGENT_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("AGENT_ENDPOINT"))?;

        let follow_up = match lookup("FOLLOW_UP_POLICY").as_deref() {
            None | Some("suggestions_ask") => FollowUpPolicy::SuggestionsAsk,
            Some("always_result") => FollowUpPolicy::AlwaysResult,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "FOLLOW_UP_POLICY",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            port: parse_or(&lookup, "AGENT_SESSION_PORT", 8000)?,
            agent_endpoint,
            request_timeout: Duration::from_secs(parse_or(&lookup, "AGENT_REQUEST_TIMEOUT_SECS", 30)?),
            result_timeout: Duration::from_millis(parse_or(&lookup, "RESULT_TIMEOUT_MS", 5000)?),
            asking_timeout: Duration::from_millis(parse_or(&lookup, "ASKING_TIMEOUT_MS", 15000)?),
            follow_up,
            calendar_events_path: lookup("CALENDAR_EVENTS_PATH").map(PathBuf::from),
            calendar_window_days: parse_or(&lookup, "CALENDAR_WINDOW_DAYS", 7)?,
        })
    }

    /// State machine settings
    pub fn conv_context(&self) -> ConvContext {
        ConvContext {
            follow_up: self.follow_up,
            result_timeout: self.result_timeout,
            asking_timeout: self.asking_timeout,
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
