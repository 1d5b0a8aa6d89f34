//! Library configuration with TOML parsing and environment variable overrides.
//!
//! Every field is optional. A library built from a configuration connects
//! right away only when both `server` and `port` are present.
//!
//! ```toml
//! server = "localhost"
//! port = 27017
//! user = "tester"
//! password = "secret"
//! database = "qa"
//! ```
//!
//! Environment variables `MONGO_LIBRARY_SERVER`, `MONGO_LIBRARY_PORT`,
//! `MONGO_LIBRARY_USER`, `MONGO_LIBRARY_PASSWORD` and `MONGO_LIBRARY_DATABASE`
//! override the corresponding fields.

use crate::client::ConnectionOptions;
use crate::error::{MongoLibraryError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Prefix of the environment variables read by [`LibraryConfig::apply_env_overrides`].
pub const ENV_PREFIX: &str = "MONGO_LIBRARY_";

/// Connection settings given to the library at construction.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Server host.
    #[serde(default)]
    pub server: Option<String>,
    /// Server port.
    #[serde(default)]
    pub port: Option<u16>,
    /// User name.
    #[serde(default)]
    pub user: Option<String>,
    /// Password, zeroized on drop.
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Database selected after connecting.
    #[serde(default)]
    pub database: Option<String>,
}

impl fmt::Debug for LibraryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .finish()
    }
}

impl LibraryConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| MongoLibraryError::configuration(format!("failed to parse TOML: {}", e)))
    }

    /// Load a configuration file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed, or
    /// `MONGO_LIBRARY_PORT` is not a valid port.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            MongoLibraryError::configuration(format!(
                "failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Build a configuration from environment variables only.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields from `MONGO_LIBRARY_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Override fields from a lookup of un-prefixed keys (`SERVER`, `PORT`, ...).
    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SERVER") {
            self.server = Some(val);
        }
        if let Some(val) = lookup("PORT") {
            let port = val.trim().parse().map_err(|_| {
                MongoLibraryError::configuration(format!(
                    "{}PORT must be a port number, got {:?}",
                    ENV_PREFIX, val
                ))
            })?;
            self.port = Some(port);
        }
        if let Some(val) = lookup("USER") {
            self.user = Some(val);
        }
        if let Some(val) = lookup("PASSWORD") {
            self.password = Some(SecretString::new(val));
        }
        if let Some(val) = lookup("DATABASE") {
            self.database = Some(val);
        }
        Ok(())
    }

    /// Connection options, when both server and a non-zero port are configured.
    pub fn connection_options(&self) -> Option<ConnectionOptions> {
        let server = self.server.as_deref().filter(|s| !s.trim().is_empty())?;
        let port = self.port.filter(|p| *p != 0)?;

        let mut builder = ConnectionOptions::builder().server(server).port(port);
        if let Some(user) = &self.user {
            builder = builder.user(user.as_str());
        }
        if let Some(password) = &self.password {
            builder = builder.password(password.expose_secret().as_str());
        }
        if let Some(database) = &self.database {
            builder = builder.database(database.as_str());
        }
        Some(builder.build())
    }
}
