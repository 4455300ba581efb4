//! TOML config file loading and validation for the dashboard.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Config file structure
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the watering backend.
    pub api_url: String,
    /// Background refresh interval in seconds; 0 disables auto-refresh.
    pub refresh_sec: u64,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_sec: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5000".to_string(),
            refresh_sec: 30,
            request_timeout_sec: 10,
        }
    }
}

/// Keep a runaway timeout from wedging the command loop for minutes.
const MAX_TIMEOUT_SEC: u64 = 300;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config values. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        let url = self.api_url.trim();
        if url.is_empty() {
            errors.push("api_url is empty".to_string());
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(format!(
                "api_url '{url}' must start with http:// or https://"
            ));
        } else if url == "http://" || url == "https://" {
            errors.push(format!("api_url '{url}' has no host"));
        }

        if self.request_timeout_sec == 0 {
            errors.push("request_timeout_sec must be positive".to_string());
        } else if self.request_timeout_sec > MAX_TIMEOUT_SEC {
            errors.push(format!(
                "request_timeout_sec {} exceeds maximum {MAX_TIMEOUT_SEC}",
                self.request_timeout_sec
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file. A missing file is not an
/// error: the defaults stand in for it.
pub fn load(path: &str) -> Result<Config> {
    let config = match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<Config>(&contents)
            .with_context(|| format!("failed to parse config: {path}"))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path, "no config file; using defaults");
            Config::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read config: {path}"));
        }
    };
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
