// crates/host/src/config.rs

//! Startup configuration: credentials, tunables, and the project file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Where the project file lives unless `--project-file` says otherwise.
pub const DEFAULT_PROJECT_FILE: &str = ".orgo/project.json";

/// Credentials that must be present before any pipeline logic runs.
pub const REQUIRED_CREDENTIALS: [&str; 2] = ["OPENAI_API_KEY", "ORGO_API_KEY"];

/// Forwarded to the automation service when set.
pub const OPTIONAL_CREDENTIALS: [&str; 1] = ["ANTHROPIC_API_KEY"];

/// On-disk record naming the remote desktop session to drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project_id: String,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                anyhow::bail!(
                    "Could not find {}. Run `calendar-agent setup <project_id>` to create it.",
                    path.display()
                );
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        let config: ProjectConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if config.project_id.trim().is_empty() {
            anyhow::bail!("{} has an empty project_id", path.display());
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
}

/// Tunables read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    /// Below this self-reported confidence the user is asked to clarify.
    pub confidence_threshold: f64,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub http_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            confidence_threshold: 0.8,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(300),
            http_timeout: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(model) = get("CALENDAR_AGENT_MODEL") {
            settings.model = model;
        }

        if let Some(raw) = get("CALENDAR_AGENT_CONFIDENCE") {
            let threshold: f64 = raw
                .parse()
                .with_context(|| format!("CALENDAR_AGENT_CONFIDENCE '{}' is not a number", raw))?;
            if !(0.0..=1.0).contains(&threshold) {
                anyhow::bail!("CALENDAR_AGENT_CONFIDENCE must be between 0 and 1, got {}", raw);
            }
            settings.confidence_threshold = threshold;
        }

        if let Some(raw) = get("CALENDAR_AGENT_MAX_RETRIES") {
            let retries: u32 = raw
                .parse()
                .with_context(|| format!("CALENDAR_AGENT_MAX_RETRIES '{}' is not a count", raw))?;
            if retries == 0 {
                anyhow::bail!("CALENDAR_AGENT_MAX_RETRIES must be at least 1");
            }
            settings.max_retries = retries;
        }

        if let Some(raw) = get("CALENDAR_AGENT_RETRY_BASE_MS") {
            let ms: u64 = raw.parse().with_context(|| {
                format!("CALENDAR_AGENT_RETRY_BASE_MS '{}' is not a number", raw)
            })?;
            settings.retry_base_delay = Duration::from_millis(ms);
        }

        if let Some(raw) = get("CALENDAR_AGENT_CACHE") {
            settings.cache_enabled = !matches!(
                raw.to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }

        if let Some(raw) = get("CALENDAR_AGENT_CACHE_TTL_SECS") {
            let secs: u64 = raw.parse().with_context(|| {
                format!("CALENDAR_AGENT_CACHE_TTL_SECS '{}' is not a number", raw)
            })?;
            settings.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(raw) = get("CALENDAR_AGENT_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().with_context(|| {
                format!("CALENDAR_AGENT_HTTP_TIMEOUT_SECS '{}' is not a number", raw)
            })?;
            settings.http_timeout = Some(Duration::from_secs(secs));
        }

        Ok(settings)
    }
}

/// Fail fast when a required credential is missing.
pub fn check_credentials<F>(lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for key in REQUIRED_CREDENTIALS {
        let present = lookup(key).map(|v| !v.trim().is_empty()).unwrap_or(false);
        if !present {
            anyhow::bail!(
                "{} not set. Add it to your environment or a .env file.",
                key
            );
        }
    }
    Ok(())
}

/// Show the first few characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let shown: String = secret.chars().take(6).collect();
    format!("{}...", shown)
}
