use anyhow::{Context, Result};
use health_score::{HealthScorer, ScoringPolicy};
use sector_benchmark::DEFAULT_TTL_SECS;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,                 // 0.0.0.0:3000
    pub sector_cache_ttl_secs: i64,        // 3600 (1 hour)
    pub policy_path: Option<String>,       // JSON scoring policy override
    pub json_logging: bool,                // RUST_LOG_FORMAT=json
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            sector_cache_ttl_secs: env::var("SECTOR_CACHE_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_TTL_SECS.to_string())
                .parse()
                .context("SECTOR_CACHE_TTL_SECS must be an integer number of seconds")?,
            policy_path: env::var("HEALTH_POLICY_PATH").ok().filter(|p| !p.trim().is_empty()),
            json_logging: env::var("RUST_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        if config.sector_cache_ttl_secs < 0 {
            anyhow::bail!("SECTOR_CACHE_TTL_SECS must not be negative");
        }

        Ok(config)
    }

    /// Build the scorer, loading and validating the policy override if one is configured.
    pub fn build_scorer(&self) -> Result<HealthScorer> {
        let policy = match &self.policy_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading scoring policy {}", path))?;
                let policy: ScoringPolicy = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing scoring policy {}", path))?;
                tracing::info!("Loaded scoring policy override from {}", path);
                policy
            }
            None => ScoringPolicy::standard(),
        };

        HealthScorer::new(policy).context("scoring policy failed validation")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            sector_cache_ttl_secs: DEFAULT_TTL_SECS,
            policy_path: None,
            json_logging: false,
        }
    }
}
