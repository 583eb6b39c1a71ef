//! # Taxcalc Server
//!
//! HTTP server for the tax calculator application.
//!
//! This crate provides the server infrastructure:
//!
//! - Static file serving from a root directory, with `/` falling back
//!   to the configured index document
//! - Built-in `/health` (JSON) and `/status` (plain text) endpoints
//! - Graceful shutdown on SIGTERM/SIGINT with a bounded drain
//!
//! ## Example
//!
//! ```rust,ignore
//! use taxcalc_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     Server::new(config).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/taxcalc-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod static_files;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus};
pub use server::{BoundServer, Server};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
pub use static_files::{StaticFileError, StaticFiles};
