//! Connection options and the client handle.

use crate::db::Database;
use crate::error::Result;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Default server host.
pub const DEFAULT_SERVER: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 27017;

/// Options for connecting to MongoDB.
pub struct ConnectionOptions {
    /// Server host.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// User name, embedded only together with a password.
    pub user: Option<String>,
    /// Password, embedded only together with a user name.
    pub password: Option<SecretString>,
    /// Database to select right after connecting.
    pub database: Option<String>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            database: None,
        }
    }
}

impl Clone for ConnectionOptions {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self
                .password
                .as_ref()
                .map(|p| SecretString::new(p.expose_secret().clone())),
            database: self.database.clone(),
        }
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionOptions {
    /// Create a new builder.
    pub fn builder() -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::default()
    }

    /// The trimmed credentials, if both are non-empty.
    fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.user.as_deref()?.trim();
        let password = self.password.as_ref()?.expose_secret().trim();
        if user.is_empty() || password.is_empty() {
            None
        } else {
            Some((user, password))
        }
    }

    /// The database to select after connecting, if non-empty.
    pub fn database_name(&self) -> Option<&str> {
        self.database
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Build the connection URI: `mongodb://[user:password@]server:port/`.
    ///
    /// The result contains the plain-text password; log
    /// [`redacted_uri`](Self::redacted_uri) instead.
    pub fn uri(&self) -> String {
        self.build_uri(false)
    }

    /// The connection URI with the password masked.
    pub fn redacted_uri(&self) -> String {
        self.build_uri(true)
    }

    fn build_uri(&self, redact: bool) -> String {
        let mut uri = String::from("mongodb://");
        if let Some((user, password)) = self.credentials() {
            let password = if redact { "****" } else { password };
            uri.push_str(&format!("{}:{}@", user, password));
        }
        uri.push_str(&format!("{}:{}/", self.server.trim(), self.port));
        uri
    }
}

/// Builder for ConnectionOptions.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptionsBuilder {
    options: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    /// Set the server host.
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.options.server = server.into();
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Set the user name.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.options.user = Some(user.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.options.password = Some(SecretString::new(password.into()));
        self
    }

    /// Set the database selected after connecting.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.options.database = Some(database.into());
        self
    }

    /// Build the options.
    pub fn build(self) -> ConnectionOptions {
        self.options
    }
}

/// A connected MongoDB client.
///
/// Cloning is cheap; clones share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoClient {
    inner: mongodb::Client,
    redacted_uri: String,
}

impl MongoClient {
    /// Open a client for the given options.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here. A malformed URI fails immediately.
    pub async fn connect(options: &ConnectionOptions) -> Result<Self> {
        let redacted_uri = options.redacted_uri();
        let inner = mongodb::Client::with_uri_str(options.uri()).await?;
        tracing::info!(uri = %redacted_uri, "opened MongoDB client");
        Ok(Self {
            inner,
            redacted_uri,
        })
    }

    /// The connection URI with the password masked.
    pub fn redacted_uri(&self) -> &str {
        &self.redacted_uri
    }

    /// List all database names.
    pub async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.list_database_names().await?)
    }

    /// Check whether a database is currently listed by the server.
    pub async fn has_database(&self, name: &str) -> Result<bool> {
        let names = self.list_database_names().await?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Get a database handle. The database need not exist.
    pub fn database(&self, name: &str) -> Database {
        Database::new(self.inner.database(name))
    }

    /// The underlying driver client.
    pub fn driver(&self) -> &mongodb::Client {
        &self.inner
    }
}
