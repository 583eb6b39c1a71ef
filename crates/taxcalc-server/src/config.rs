//! Server configuration types.
//!
//! Configuration is immutable after the server starts. Use the builder
//! for programmatic construction, or [`ServerConfig::from_env`] to pick
//! up the `PORT` and `TAXCALC_ROOT` environment variables.
//!
//! # Example
//!
//! ```rust
//! use taxcalc_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .port(9090)
//!     .shutdown_timeout(Duration::from_secs(10))
//!     .build();
//!
//! assert_eq!(config.port(), 9090);
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ServerError;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8082;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Default index document name.
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Environment variable selecting the listening port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable overriding the served root directory.
pub const ROOT_ENV: &str = "TAXCALC_ROOT";

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] or [`ServerConfig::from_env()`] to
/// construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port (all interfaces).
    port: u16,

    /// Root directory that files are served from.
    root_dir: PathBuf,

    /// Index document served for directory requests.
    index_file: String,

    /// How long to wait for in-flight connections during shutdown.
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Builds a configuration from the environment.
    ///
    /// Reads `PORT` (default 8082) and `TAXCALC_ROOT` (default: current
    /// working directory).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidPort`] if `PORT` is set but is not
    /// a valid port number.
    pub fn from_env() -> Result<Self, ServerError> {
        let mut builder = Self::builder();

        if let Ok(value) = std::env::var(PORT_ENV) {
            let port = value
                .parse::<u16>()
                .map_err(|source| ServerError::InvalidPort { value, source })?;
            builder = builder.port(port);
        }

        if let Ok(root) = std::env::var(ROOT_ENV) {
            builder = builder.root_dir(root);
        }

        Ok(builder.build())
    }

    /// Returns the listening port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the socket address the server binds to.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Returns the root directory files are served from.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Returns the index document name.
    #[must_use]
    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    /// Returns the full path of the index document.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root_dir.join(&self.index_file)
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    port: u16,
    root_dir: PathBuf,
    index_file: String,
    shutdown_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            root_dir: PathBuf::from("."),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// Sets the listening port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the root directory files are served from.
    #[must_use]
    pub fn root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = root.into();
        self
    }

    /// Sets the index document name.
    #[must_use]
    pub fn index_file(mut self, index: impl Into<String>) -> Self {
        self.index_file = index.into();
        self
    }

    /// Sets the graceful shutdown timeout.
    ///
    /// This is the maximum time the server waits for in-flight
    /// connections to finish during shutdown.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the [`ServerConfig`].
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            root_dir: self.root_dir,
            index_file: self.index_file,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
