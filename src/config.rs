use crate::poller::DEFAULT_POLL_INTERVAL;
use anyhow::{Context, Result};
use std::time::Duration;

pub const DIGITRAFFIC_URL: &str = "https://rata.digitraffic.fi/api/v1/train-locations.geojson/latest/";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub feed_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            feed_url: DIGITRAFFIC_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("Invalid PORT: {}", v))?,
            None => defaults.port,
        };
        let feed_url = lookup("TRAIN_FEED_URL").unwrap_or(defaults.feed_url);
        let poll_interval = match lookup("POLL_INTERVAL_SECS") {
            Some(v) => parse_secs("POLL_INTERVAL_SECS", &v)?,
            None => defaults.poll_interval,
        };
        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(v) => parse_secs("HTTP_TIMEOUT_SECS", &v)?,
            None => defaults.http_timeout,
        };

        Ok(Self {
            port,
            feed_url,
            poll_interval,
            http_timeout,
        })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .parse()
        .with_context(|| format!("Invalid {}: {}", key, value))?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}
