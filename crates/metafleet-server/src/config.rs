use serde::Deserialize;
use std::path::Path;

use metafleet_core::mode::{AuthenticationMode, DeploymentMode};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub fleet: FleetConfig,
    pub log: LogConfig,
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthenticationMode,
    pub deployment: DeploymentMode,
    /// Claim consulted first when resolving an OIDC principal's username.
    pub preferred_username_attribute: String,
    /// Fallback claim when the preferred one is absent.
    pub email_attribute: String,
    /// Key for the password ciphertexts held by the system of record.
    /// Required in local mode; `generate-key` prints a fresh one.
    pub cipher_key: Option<String>,
    /// Captcha verification endpoint, consulted in hosted deployments.
    pub captcha_url: Option<String>,
    /// Shared secret sent along with each captcha verification.
    pub captcha_secret: Option<String>,
    /// Roles come from the principal's granted authorities instead of the
    /// cached user record.
    pub directory_authority: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Base URL under which peers reach this node.
    pub node_address: String,
    /// Base URLs of every node in the fleet, this one included.
    pub peers: Vec<String>,
    /// Path prefix the application is served under, if any.
    pub context_path: String,
    pub broadcast_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    pub sample_rate: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9097,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthenticationMode::default(),
            deployment: DeploymentMode::default(),
            preferred_username_attribute: "preferred_username".to_string(),
            email_attribute: "email".to_string(),
            cipher_key: None,
            captcha_url: None,
            captcha_secret: None,
            directory_authority: false,
        }
    }
}

impl AuthConfig {
    pub fn principal_attributes(&self) -> metafleet_core::principal::PrincipalAttributes {
        metafleet_core::principal::PrincipalAttributes {
            preferred_username_attribute: self.preferred_username_attribute.clone(),
            email_attribute: self.email_attribute.clone(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            node_address: "http://localhost:9097".to_string(),
            peers: Vec::new(),
            context_path: String::new(),
            broadcast_timeout_secs: 10,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "metafleet".to_string(),
            sample_rate: 1.0,
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e.to_string()))?;
            toml::from_str::<AppConfig>(&contents)
                .map_err(|e| ConfigError::ParseToml(e.to_string()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("METAFLEET_HTTP_HOST") {
            self.http.host = v;
        }
        if let Ok(v) = std::env::var("METAFLEET_HTTP_PORT")
            && let Ok(port) = v.parse()
        {
            self.http.port = port;
        }
        if let Ok(v) = std::env::var("METAFLEET_AUTH_MODE") {
            match v.as_str() {
                "local" => self.auth.mode = AuthenticationMode::Local,
                "directory" => self.auth.mode = AuthenticationMode::Directory,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("METAFLEET_AUTH_DEPLOYMENT") {
            match v.as_str() {
                "onpremise" => self.auth.deployment = DeploymentMode::OnPremise,
                "hosted" => self.auth.deployment = DeploymentMode::Hosted,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("METAFLEET_AUTH_CIPHER_KEY") {
            self.auth.cipher_key = Some(v);
        }
        if let Ok(v) = std::env::var("METAFLEET_FLEET_NODE_ADDRESS") {
            self.fleet.node_address = v;
        }
        if let Ok(v) = std::env::var("METAFLEET_FLEET_PEERS") {
            self.fleet.peers = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(v) = std::env::var("METAFLEET_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = std::env::var("METAFLEET_LOG_FORMAT") {
            match v.as_str() {
                "json" => self.log.format = LogFormat::Json,
                "pretty" => self.log.format = LogFormat::Pretty,
                _ => {}
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Validation(
                "http.port must be non-zero".to_string(),
            ));
        }
        if self.auth.mode == AuthenticationMode::Local && self.auth.cipher_key.is_none() {
            return Err(ConfigError::Validation(
                "auth.cipher_key is required in local mode (run generate-key)".to_string(),
            ));
        }
        if self.fleet.broadcast_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fleet.broadcast_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse TOML config: {0}")]
    ParseToml(String),

    #[error("config validation failed: {0}")]
    Validation(String),
}
