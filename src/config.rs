use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

const HOST_VAR: &str = "LLMGQL_HOST";
const PORT_VAR: &str = "LLMGQL_PORT";
const ENVIRONMENT_VAR: &str = "ENVIRONMENT";
const DEEPSEEK_BASE_URL_VAR: &str = "DEEPSEEK_BASE_URL";
const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const DEEPSEEK_API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const KEYS: [&str; 7] = [
    "host",
    "port",
    "environment",
    "deepseek_base_url",
    "openai_base_url",
    "deepseek_api_key",
    "openai_api_key",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown config key '{0}', expected one of: {}", KEYS.join(", "))]
    UnknownKey(String),
    #[error("expected key=value, got '{0}'")]
    InvalidAssignment(String),
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{key} must use http or https, got '{scheme}'")]
    UnsupportedScheme { key: String, scheme: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LlmgqlConfig {
    #[serde(default = "default_host", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default = "default_port", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default = "default_environment", skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default = "default_deepseek_base_url", skip_serializing_if = "Option::is_none")]
    pub deepseek_base_url: Option<String>,
    #[serde(default = "default_openai_base_url", skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepseek_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

fn default_host() -> Option<String> {
    Some(DEFAULT_HOST.to_string())
}
fn default_port() -> Option<u16> {
    Some(DEFAULT_PORT)
}
fn default_environment() -> Option<String> {
    Some(DEFAULT_ENVIRONMENT.to_string())
}
fn default_deepseek_base_url() -> Option<String> {
    Some(DEFAULT_DEEPSEEK_BASE_URL.to_string())
}
fn default_openai_base_url() -> Option<String> {
    Some(DEFAULT_OPENAI_BASE_URL.to_string())
}

impl Default for LlmgqlConfig {
    fn default() -> Self {
        LlmgqlConfig {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            deepseek_base_url: default_deepseek_base_url(),
            openai_base_url: default_openai_base_url(),
            deepseek_api_key: None,
            openai_api_key: None,
        }
    }
}

impl LlmgqlConfig {
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "host" => self.host.clone(),
            "port" => self.port.map(|p| p.to_string()),
            "environment" => self.environment.clone(),
            "deepseek_base_url" => self.deepseek_base_url.clone(),
            "openai_base_url" => self.openai_base_url.clone(),
            "deepseek_api_key" => self.deepseek_api_key.clone(),
            "openai_api_key" => self.openai_api_key.clone(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim().to_string();
        match key {
            "host" => self.host = Some(value),
            "port" => {
                let port = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort(value.clone()))?;
                self.port = Some(port);
            }
            "environment" => self.environment = Some(value),
            "deepseek_base_url" => {
                validate_base_url(key, &value)?;
                self.deepseek_base_url = Some(value);
            }
            "openai_base_url" => {
                validate_base_url(key, &value)?;
                self.openai_base_url = Some(value);
            }
            "deepseek_api_key" => self.deepseek_api_key = Some(value),
            "openai_api_key" => self.openai_api_key = Some(value),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Applies a `key=value` assignment as given on the command line.
    pub fn assign(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidAssignment(assignment.to_string()))?;
        self.set(key.trim(), value)
    }
}

pub fn validate_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        key: key.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme {
            key: key.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

static CONFIG: OnceCell<LlmgqlConfig> = OnceCell::new();

pub fn get_config_path() -> PathBuf {
    let mut path = config_dir()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_default();
    path.push("llmgql");
    path.push("llmgql.toml");
    path
}

pub fn load_config_from(path: &Path) -> LlmgqlConfig {
    info!("Loading config from {}", path.display());
    if path.exists() {
        let content = fs::read_to_string(path).unwrap_or_default();
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring unreadable config {}: {}", path.display(), e);
                LlmgqlConfig::default()
            }
        }
    } else {
        let default = LlmgqlConfig::default();
        if let Err(e) = write_config_to(path, &default) {
            warn!("Could not write default config to {}: {}", path.display(), e);
        }
        default
    }
}

pub fn write_config_to(path: &Path, config: &LlmgqlConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(config)?;
    fs::write(path, toml_str)?;
    Ok(())
}

fn get_config() -> &'static LlmgqlConfig {
    CONFIG.get_or_init(|| load_config_from(&get_config_path()))
}

fn from_env_or(var: &str, configured: Option<&String>, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| configured.cloned())
        .unwrap_or_else(|| default.to_string())
}

pub fn get_host() -> String {
    from_env_or(HOST_VAR, get_config().host.as_ref(), DEFAULT_HOST)
}

pub fn get_port() -> u16 {
    env::var(PORT_VAR)
        .ok()
        .and_then(|v| v.parse().ok())
        .or(get_config().port)
        .unwrap_or(DEFAULT_PORT)
}

pub fn get_environment() -> String {
    from_env_or(
        ENVIRONMENT_VAR,
        get_config().environment.as_ref(),
        DEFAULT_ENVIRONMENT,
    )
}

pub fn get_deepseek_base_url() -> String {
    from_env_or(
        DEEPSEEK_BASE_URL_VAR,
        get_config().deepseek_base_url.as_ref(),
        DEFAULT_DEEPSEEK_BASE_URL,
    )
}

pub fn get_openai_base_url() -> String {
    from_env_or(
        OPENAI_BASE_URL_VAR,
        get_config().openai_base_url.as_ref(),
        DEFAULT_OPENAI_BASE_URL,
    )
}

pub fn get_deepseek_api_key() -> String {
    from_env_or(DEEPSEEK_API_KEY_VAR, get_config().deepseek_api_key.as_ref(), "")
}

pub fn get_openai_api_key() -> String {
    from_env_or(OPENAI_API_KEY_VAR, get_config().openai_api_key.as_ref(), "")
}

/// Effective value of a config key after environment overrides.
pub fn get_effective_value(key: &str) -> Result<String, ConfigError> {
    let value = match key {
        "host" => get_host(),
        "port" => get_port().to_string(),
        "environment" => get_environment(),
        "deepseek_base_url" => get_deepseek_base_url(),
        "openai_base_url" => get_openai_base_url(),
        "deepseek_api_key" => mask_secret(&get_deepseek_api_key()),
        "openai_api_key" => mask_secret(&get_openai_api_key()),
        other => return Err(ConfigError::UnknownKey(other.to_string())),
    };
    Ok(value)
}

pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        "(unset)".to_string()
    } else if count <= 8 {
        "*".repeat(count)
    } else {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}

/// Bindings every resolver sees for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct Env {
    pub deepseek_api_key: String,
    pub openai_api_key: String,
    pub environment: String,
    pub deepseek_base_url: String,
    pub openai_base_url: String,
}

impl Env {
    pub fn load() -> Result<Self, ConfigError> {
        let env = Env {
            deepseek_api_key: get_deepseek_api_key(),
            openai_api_key: get_openai_api_key(),
            environment: get_environment(),
            deepseek_base_url: get_deepseek_base_url(),
            openai_base_url: get_openai_base_url(),
        };
        validate_base_url("deepseek_base_url", &env.deepseek_base_url)?;
        validate_base_url("openai_base_url", &env.openai_base_url)?;

        if env.deepseek_api_key.is_empty() {
            warn!("{} is not set, deepseekChat calls will be rejected upstream", DEEPSEEK_API_KEY_VAR);
        }
        if env.openai_api_key.is_empty() {
            warn!("{} is not set, openaiResponse calls will be rejected upstream", OPENAI_API_KEY_VAR);
        }
        Ok(env)
    }
}
