use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Process-wide configuration, built once in `main`
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment ("production" switches logs to JSON)
    pub environment: String,
    pub database_url: String,
    pub port: u16,
    /// Base URL of the image generation backend
    pub image_generator_url: String,
    /// Bearer token for the image generation backend
    pub image_generator_token: Option<String>,
    pub generation: GenerationSettings,
    pub rate_limit: RateLimitSettings,
}

/// Settings consumed by the story service when generating candidates
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Candidates requested when a scene does not ask for a count
    pub default_candidate_count: u32,
    /// Upper bound on candidates a scene may request
    pub max_candidate_count: u32,
    /// How long to wait on the backend before giving up
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_candidate_count: 4,
            max_candidate_count: 8,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Per-IP limits on the generation routes
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    pub per_second: u64,
    pub burst_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let generation = GenerationSettings {
            default_candidate_count: parse_or(&lookup, "DEFAULT_CANDIDATE_COUNT", 4)?,
            max_candidate_count: parse_or(&lookup, "MAX_CANDIDATE_COUNT", 8)?,
            timeout: Duration::from_secs(parse_or(&lookup, "GENERATION_TIMEOUT_SECS", 120)?),
        };

        if generation.max_candidate_count == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CANDIDATE_COUNT",
                value: "0".to_string(),
            });
        }
        if generation.default_candidate_count == 0
            || generation.default_candidate_count > generation.max_candidate_count
        {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_CANDIDATE_COUNT",
                value: generation.default_candidate_count.to_string(),
            });
        }

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            database_url: database_url(&lookup)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            image_generator_url: lookup("IMAGE_GENERATOR_URL")
                .unwrap_or_else(|| "http://localhost:7860".to_string()),
            image_generator_token: lookup("IMAGE_GENERATOR_TOKEN").filter(|t| !t.is_empty()),
            generation,
            rate_limit: RateLimitSettings {
                per_second: parse_or(&lookup, "GENERATION_RATE_PER_SECOND", 2)?,
                burst_size: parse_or(&lookup, "GENERATION_RATE_BURST", 5)?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// `DATABASE_URL` wins; otherwise every `DB_*` part must be present
fn database_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        return Ok(url);
    }

    let require = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
    let user = require("DB_USER")?;
    let password = require("DB_PASSWORD")?;
    let host = require("DB_HOST")?;
    let port: u16 = parse_required(lookup, "DB_PORT")?;
    let name = require("DB_NAME")?;

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, name
    ))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_required<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let value = lookup(key).ok_or(ConfigError::Missing(key))?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
