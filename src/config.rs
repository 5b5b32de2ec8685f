use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_PATH: &str = "gym-review.db";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Claude,
}

impl ProviderKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "openai" => Some(ProviderKind::OpenAi),
            "claude" => Some(ProviderKind::Claude),
            _ => None,
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Claude => "CLAUDE_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Claude => "claude-sonnet-4-20250514",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub generation: GenerationConfig,
    /// `None` means a random secret is generated per process.
    pub session_secret: Option<String>,
    pub session_ttl: Duration,
    pub admin_password: Option<String>,
}

impl AppConfig {
    /// Reads the process environment (after loading `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(
            "BIND_ADDR",
            var("BIND_ADDR").as_deref().unwrap_or(DEFAULT_BIND_ADDR),
        )?;
        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let provider = match var("GENERATION_PROVIDER") {
            Some(value) => ProviderKind::parse(&value).ok_or(ConfigError::Invalid {
                key: "GENERATION_PROVIDER",
                value,
            })?,
            None => ProviderKind::Gemini,
        };
        let api_key =
            var(provider.api_key_var()).ok_or(ConfigError::Missing(provider.api_key_var()))?;
        let model = var("GENERATION_MODEL").unwrap_or_else(|| provider.default_model().to_string());
        let timeout = Duration::from_secs(match var("GENERATION_TIMEOUT_SECS") {
            Some(value) => parse_or("GENERATION_TIMEOUT_SECS", &value)?,
            None => DEFAULT_TIMEOUT_SECS,
        });

        let session_ttl = Duration::from_secs(match var("SESSION_TTL_SECS") {
            Some(value) => parse_or("SESSION_TTL_SECS", &value)?,
            None => DEFAULT_SESSION_TTL_SECS,
        });

        Ok(Self {
            bind_addr,
            database_path,
            generation: GenerationConfig {
                provider,
                model,
                api_key,
                base_url: var("GENERATION_BASE_URL"),
                timeout,
            },
            session_secret: var("SESSION_SECRET"),
            session_ttl,
            admin_password: var("ADMIN_PASSWORD"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.generation.provider, ProviderKind::Gemini);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.generation.timeout, Duration::from_secs(60));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert!(config.session_secret.is_none());
        assert!(config.admin_password.is_none());
    }

    #[test]
    fn missing_provider_key_is_a_configuration_error() {
        let err = AppConfig::from_lookup(lookup(&[("GENERATION_PROVIDER", "claude")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLAUDE_API_KEY")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GEMINI_API_KEY")));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("GENERATION_PROVIDER", "bard")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "GENERATION_PROVIDER", .. }));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GENERATION_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GENERATION_MODEL", "gpt-4.1"),
            ("GENERATION_TIMEOUT_SECS", "15"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("SESSION_SECRET", "s3cret"),
            ("ADMIN_PASSWORD", "pass"),
        ]))
        .unwrap();
        assert_eq!(config.generation.provider, ProviderKind::OpenAi);
        assert_eq!(config.generation.model, "gpt-4.1");
        assert_eq!(config.generation.timeout, Duration::from_secs(15));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.session_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.admin_password.as_deref(), Some("pass"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g"),
            ("GENERATION_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "GENERATION_TIMEOUT_SECS", .. }));
    }
}
