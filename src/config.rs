use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::{fmt, path::PathBuf};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub service_desk: ServiceDeskConfig,
}

/// Raw service desk settings as they come out of a file or the environment.
/// Every field may be missing here; [`ServiceDeskConfig::validate`] decides
/// whether they are usable.
#[derive(Deserialize, Clone, Default)]
pub struct ServiceDeskConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Validated credentials for the service desk import API.
#[derive(Clone)]
pub struct ServiceDeskCredentials {
    pub endpoint: Url,
    pub username: String,
    pub password: String,
    pub identifier: String,
}

impl fmt::Debug for ServiceDeskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDeskCredentials")
            .field("endpoint", &self.endpoint_for_logs())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("identifier", &self.identifier)
            .finish()
    }
}

impl ServiceDeskCredentials {
    /// Endpoint with any `user:pass@` part stripped.
    pub fn endpoint_for_logs(&self) -> String {
        let mut url = self.endpoint.clone();
        // only fails for URLs that cannot carry credentials in the first place
        let _ = url.set_password(None);
        let _ = url.set_username("");
        url.to_string()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cannot read credentials from {source_name}: {reason}")]
    Unreadable { source_name: String, reason: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid service desk endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl ServiceDeskConfig {
    pub fn validate(self) -> Result<ServiceDeskCredentials, ConfigError> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        let endpoint = present(self.endpoint);
        let username = present(self.username);
        let password = present(self.password);
        let identifier = present(self.identifier);

        let missing: Vec<&'static str> = [
            ("endpoint", endpoint.is_none()),
            ("username", username.is_none()),
            ("password", password.is_none()),
            ("identifier", identifier.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(endpoint), Some(username), Some(password), Some(identifier)) =
            (endpoint, username, password, identifier)
        else {
            return Err(ConfigError::MissingFields(missing));
        };

        let endpoint = Url::parse(&endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(ServiceDeskCredentials {
            endpoint,
            username,
            password,
            identifier,
        })
    }
}

/// Source of service desk credentials. The relay only sees the resolved
/// value; where it came from is up to the implementation.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Human readable name of the source, used in logs
    fn source(&self) -> String;

    async fn resolve(&self) -> Result<ServiceDeskCredentials, ConfigError>;
}

/// Reads a YAML file with a `service_desk:` section on every call, so a
/// rotated password is picked up without a restart.
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Config, ConfigError> {
        let unreadable = |reason: String| ConfigError::Unreadable {
            source_name: self.source(),
            reason,
        };

        let config_str = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| unreadable(e.to_string()))?;
        serde_yaml::from_str(&config_str).map_err(|e| unreadable(e.to_string()))
    }
}

#[async_trait]
impl CredentialResolver for FileCredentials {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    async fn resolve(&self) -> Result<ServiceDeskCredentials, ConfigError> {
        let config = self.load().await.inspect_err(|error| {
            error!(%error, "failed to load credentials file");
        })?;
        debug!(source = %self.source(), "credentials loaded from file");
        config.service_desk.validate()
    }
}

pub const ENV_ENDPOINT: &str = "SERVICE_DESK_ENDPOINT";
pub const ENV_USERNAME: &str = "SERVICE_DESK_USERNAME";
pub const ENV_PASSWORD: &str = "SERVICE_DESK_PASSWORD";
pub const ENV_IDENTIFIER: &str = "SERVICE_DESK_IDENTIFIER";

/// Reads `SERVICE_DESK_*` variables from the process environment.
pub struct EnvCredentials;

impl EnvCredentials {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServiceDeskConfig {
        ServiceDeskConfig {
            endpoint: lookup(ENV_ENDPOINT),
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            identifier: lookup(ENV_IDENTIFIER),
        }
    }
}

#[async_trait]
impl CredentialResolver for EnvCredentials {
    fn source(&self) -> String {
        "environment".to_string()
    }

    async fn resolve(&self) -> Result<ServiceDeskCredentials, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok()).validate()
    }
}

/// Fixed credentials, handy for wiring the relay in tests.
#[cfg(test)]
pub struct StaticCredentials(pub ServiceDeskConfig);

#[cfg(test)]
impl StaticCredentials {
    pub fn complete(endpoint: &str) -> Self {
        Self(ServiceDeskConfig {
            endpoint: Some(endpoint.to_string()),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            identifier: Some("teams2go".to_string()),
        })
    }
}

#[cfg(test)]
#[async_trait]
impl CredentialResolver for StaticCredentials {
    fn source(&self) -> String {
        "static".to_string()
    }

    async fn resolve(&self) -> Result<ServiceDeskCredentials, ConfigError> {
        self.0.clone().validate()
    }
}
