//! Configuration manager for Gatehouse.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;
use crate::account::PasswordPolicy;
use crate::guard::{RouteConfigError, RoutePaths};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_NAME: &str = "gatehouse";
const DEFAULT_URL: &str = "http://localhost:8080";
const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Upper bound of configured durations, a hundred years.
const MAX_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Routes(#[from] RouteConfigError),
    #[error("missing `{0}` environment variable")]
    MissingVariable(&'static str),
    #[error("`{0}` must be between one second and a hundred years")]
    Duration(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of current instance. Also the token issuer.
    pub url: String,
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Password length policy.
    pub password: PasswordPolicy,
    /// Session lifetime and renewal.
    pub session: Session,
    /// Paths the route guard works with.
    pub routes: RoutePaths,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Argon2,
    /// Related to PostgreSQL configuration. Accounts are kept in memory
    /// when absent.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            url: DEFAULT_URL.to_owned(),
            version: VERSION.to_owned(),
            path: PathBuf::new(),
            password: PasswordPolicy::default(),
            session: Session::default(),
            routes: RoutePaths::default(),
            argon2: Argon2::default(),
            postgres: None,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Seconds a session stays valid after it is issued.
    pub max_age: u64,
    /// Seconds after which claims are re-derived from the store on the next
    /// request.
    pub update_age: u64,
    /// Send the session cookie over HTTPS only.
    pub cookie_secure: bool,
}

impl Session {
    pub fn max_age(&self) -> Result<TimeDelta, ConfigError> {
        seconds("session.max_age", self.max_age)
    }

    pub fn update_age(&self) -> Result<TimeDelta, ConfigError> {
        seconds("session.update_age", self.update_age)
    }
}

fn seconds(field: &'static str, value: u64) -> Result<TimeDelta, ConfigError> {
    if value == 0 || value > MAX_SECONDS {
        return Err(ConfigError::Duration(field));
    }

    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or(ConfigError::Duration(field))
}

impl Default for Session {
    fn default() -> Self {
        Self {
            max_age: 30 * 24 * 60 * 60, // 30 days.
            update_age: 24 * 60 * 60,   // 1 day.
            cookie_secure: false,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing, in KiB.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
        }
    }
}

#[cfg(test)]
impl Argon2 {
    /// Cheapest parameters Argon2 accepts.
    pub fn fast() -> Self {
        Self {
            memory_cost: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        Ok(Url::parse(&url_with_scheme)?.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    ///
    /// A missing or malformed file is logged and replaced by defaults.
    pub fn read(self) -> Result<Arc<Self>, ConfigError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(&file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file)
            {
                Ok(config) => config,
                Err(err) => {
                    tracing::error!(error = %err, path = %file_path.display(), "invalid configuration file");
                    Self::default()
                },
            },
            Err(err) => {
                tracing::error!(error = %err, path = %file_path.display(), "configuration file not found");
                Self::default()
            },
        };

        config.version = VERSION.to_owned();
        config.path = file_path;
        config.url = Self::normalize_url(&config.url)?;
        config.routes.validate()?;
        config.session.max_age()?;
        config.session.update_age()?;

        Ok(Arc::new(config))
    }

    /// Running version.
    pub fn version(&self) -> &str {
        &self.version
    }
}
