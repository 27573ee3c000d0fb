//! Metrics config loader (strict parsing).
//!
//! Push credentials may be supplied through the environment so that secrets
//! stay out of the config file:
//! - `GAUGELINE_PUSH_URL`
//! - `GAUGELINE_PUSH_USER`
//! - `GAUGELINE_PUSH_API_KEY`

pub mod schema;

use std::fs;

use gaugeline_core::error::{GaugelineError, Result};

pub use schema::{HttpSection, MetricsConfig, PushConfig, PushEncoding, DEFAULT_BUCKETS};

pub const ENV_PUSH_URL: &str = "GAUGELINE_PUSH_URL";
pub const ENV_PUSH_USER: &str = "GAUGELINE_PUSH_USER";
pub const ENV_PUSH_API_KEY: &str = "GAUGELINE_PUSH_API_KEY";

/// Read, apply env overrides, validate.
pub fn load_from_file(path: &str) -> Result<MetricsConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GaugelineError::Config(format!("read config failed ({path}): {e}")))?;
    let mut cfg = parse(&s)?;
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    cfg.validate()?;
    Ok(cfg)
}

/// Parse and validate without consulting the environment.
pub fn load_from_str(s: &str) -> Result<MetricsConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse(s: &str) -> Result<MetricsConfig> {
    serde_yaml::from_str(s).map_err(|e| GaugelineError::Config(format!("invalid yaml: {e}")))
}

/// Overlay push settings from `lookup` (normally the process environment).
/// Empty values are ignored.
pub fn apply_env_overrides(cfg: &mut MetricsConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |k: &str| lookup(k).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_PUSH_URL) {
        cfg.push.url = Some(url);
    }
    if let Some(user) = get(ENV_PUSH_USER) {
        cfg.push.user = user;
    }
    if let Some(key) = get(ENV_PUSH_API_KEY) {
        cfg.push.api_key = Some(key);
    }
}
