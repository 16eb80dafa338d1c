use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const DEFAULT_MAX_BATCH: usize = 50;
pub const DEFAULT_PERMISSION_TTL_SECS: u64 = 300;
pub const DEFAULT_LISTING_TTL_SECS: u64 = 3_600;
pub const DEFAULT_VERSION_TTL_SECS: u64 = 7 * 24 * 3_600;
pub const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_AUTHORITY_TIMEOUT_SECS: u64 = 20;

// Engine configuration sourced from environment variables.
//
// Permission-decision TTLs stay in the minutes range so a missed invalidation
// self-heals quickly; listing caches may live longer; version counters are
// near-permanent and only expire to reclaim keys for retired roles.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub permission_ttl: Duration,
    pub listing_ttl: Duration,
    pub version_ttl: Duration,
    pub cache_timeout: Duration,
    pub authority_timeout: Duration,
    pub max_batch: usize,
}

#[derive(Debug, Deserialize)]
struct EngineConfigOverride {
    permission_ttl_secs: Option<u64>,
    listing_ttl_secs: Option<u64>,
    version_ttl_secs: Option<u64>,
    cache_timeout_secs: Option<u64>,
    authority_timeout_secs: Option<u64>,
    max_batch: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            permission_ttl: Duration::from_secs(DEFAULT_PERMISSION_TTL_SECS),
            listing_ttl: Duration::from_secs(DEFAULT_LISTING_TTL_SECS),
            version_ttl: Duration::from_secs(DEFAULT_VERSION_TTL_SECS),
            cache_timeout: Duration::from_secs(DEFAULT_CACHE_TIMEOUT_SECS),
            authority_timeout: Duration::from_secs(DEFAULT_AUTHORITY_TIMEOUT_SECS),
            max_batch: DEFAULT_MAX_BATCH,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(secs) = env_u64("VIGIL_PERMISSION_TTL_SECS")? {
            config.permission_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("VIGIL_LISTING_TTL_SECS")? {
            config.listing_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("VIGIL_VERSION_TTL_SECS")? {
            config.version_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("VIGIL_CACHE_TIMEOUT_SECS")? {
            config.cache_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("VIGIL_AUTHORITY_TIMEOUT_SECS")? {
            config.authority_timeout = Duration::from_secs(secs);
        }
        if let Ok(value) = std::env::var("VIGIL_MAX_BATCH") {
            config.max_batch = value.parse().with_context(|| "parse VIGIL_MAX_BATCH")?;
        }
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("VIGIL_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read VIGIL_CONFIG: {path}"))?;
            let override_cfg: EngineConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse engine config yaml")?;
            if let Some(secs) = override_cfg.permission_ttl_secs {
                config.permission_ttl = Duration::from_secs(secs);
            }
            if let Some(secs) = override_cfg.listing_ttl_secs {
                config.listing_ttl = Duration::from_secs(secs);
            }
            if let Some(secs) = override_cfg.version_ttl_secs {
                config.version_ttl = Duration::from_secs(secs);
            }
            if let Some(secs) = override_cfg.cache_timeout_secs {
                config.cache_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = override_cfg.authority_timeout_secs {
                config.authority_timeout = Duration::from_secs(secs);
            }
            if let Some(max_batch) = override_cfg.max_batch {
                config.max_batch = max_batch;
            }
        }
        Ok(config)
    }
}

fn env_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => {
            let parsed = value.parse().with_context(|| format!("parse {name}"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_when_env_is_empty() {
        let _g1 = EnvGuard::unset("VIGIL_PERMISSION_TTL_SECS");
        let _g2 = EnvGuard::unset("VIGIL_LISTING_TTL_SECS");
        let _g3 = EnvGuard::unset("VIGIL_VERSION_TTL_SECS");
        let _g4 = EnvGuard::unset("VIGIL_CACHE_TIMEOUT_SECS");
        let _g5 = EnvGuard::unset("VIGIL_AUTHORITY_TIMEOUT_SECS");
        let _g6 = EnvGuard::unset("VIGIL_MAX_BATCH");
        let _g7 = EnvGuard::unset("VIGIL_CONFIG");

        let config = EngineConfig::from_env().expect("config");
        assert_eq!(config.permission_ttl, Duration::from_secs(300));
        assert_eq!(config.version_ttl, Duration::from_secs(7 * 24 * 3_600));
        assert_eq!(config.max_batch, 50);
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        let _g1 = EnvGuard::set("VIGIL_PERMISSION_TTL_SECS", "60");
        let _g2 = EnvGuard::set("VIGIL_MAX_BATCH", "10");
        let _g3 = EnvGuard::unset("VIGIL_CONFIG");

        let config = EngineConfig::from_env().expect("config");
        assert_eq!(config.permission_ttl, Duration::from_secs(60));
        assert_eq!(config.max_batch, 10);
    }

    #[test]
    #[serial]
    fn malformed_env_is_an_error() {
        let _g1 = EnvGuard::set("VIGIL_CACHE_TIMEOUT_SECS", "soon");
        let err = EngineConfig::from_env().expect_err("parse failure");
        assert!(err.to_string().contains("VIGIL_CACHE_TIMEOUT_SECS"));
    }

    #[test]
    #[serial]
    fn yaml_override_wins_over_env() {
        let dir = std::env::temp_dir().join("vigil-config-test");
        std::fs::create_dir_all(&dir).expect("tmp dir");
        let path = dir.join("engine.yaml");
        std::fs::write(&path, "permission_ttl_secs: 120\nmax_batch: 25\n").expect("write yaml");

        let _g1 = EnvGuard::set("VIGIL_PERMISSION_TTL_SECS", "60");
        let _g2 = EnvGuard::set("VIGIL_CONFIG", path.to_str().expect("utf8 path"));

        let config = EngineConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.permission_ttl, Duration::from_secs(120));
        assert_eq!(config.max_batch, 25);
    }
}
