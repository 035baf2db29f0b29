//! Runtime configuration read from the environment.

use anyhow::{anyhow, Result};
use std::time::Duration;
use url::Url;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the prediction service
    pub api_base: String,
    /// Request timeout; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
    /// Minutes covered by one forecast interval
    pub interval_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            timeout_secs: None,
            interval_minutes: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("FLOWCAST_API_BASE").unwrap_or(defaults.api_base),
            timeout_secs: std::env::var("FLOWCAST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()),
            interval_minutes: std::env::var("FLOWCAST_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.interval_minutes),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base)
            .map_err(|e| anyhow!("invalid FLOWCAST_API_BASE {:?}: {}", self.api_base, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("FLOWCAST_API_BASE must be http or https, got {}", url.scheme()));
        }
        if self.interval_minutes == 0 {
            return Err(anyhow!("FLOWCAST_INTERVAL_MINUTES must be positive"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// Resolve an API path such as `/api/predict` under the base URL. A path
    /// prefix on the base is kept: `http://host/stgcn` + `/api/predict`
    /// gives `http://host/stgcn/api/predict`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = Url::parse(&self.api_base)?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.timeout().is_none());
        assert_eq!(cfg.interval_minutes, 5);
    }

    #[test]
    fn test_rejects_bad_base() {
        let cfg = Config {
            api_base: "ftp://example.com".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = Config {
            api_base: "not a url".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let cfg = Config {
            interval_minutes: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let cfg = Config {
            api_base: "http://127.0.0.1:8080".into(),
            ..Config::default()
        };
        assert_eq!(cfg.endpoint("/api/predict").unwrap().as_str(), "http://127.0.0.1:8080/api/predict");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        for base in ["http://host/stgcn", "http://host/stgcn/"] {
            let cfg = Config {
                api_base: base.into(),
                ..Config::default()
            };
            assert_eq!(cfg.endpoint("/api/predict").unwrap().as_str(), "http://host/stgcn/api/predict");
            assert_eq!(cfg.endpoint("/api/model/info").unwrap().as_str(), "http://host/stgcn/api/model/info");
        }
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let cfg = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(cfg.timeout().is_none());
    }
}
