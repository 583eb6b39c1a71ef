//! Health check endpoint payloads.
//!
//! The `/health` endpoint reports a liveness snapshot: a fixed status
//! string, the service identifier, and the current wall-clock timestamp
//! in ISO-8601 form. The `/status` endpoint is assembled by the server
//! from the bound port and uptime — see [`crate::server`].
//!
//! # Example
//!
//! ```rust
//! use taxcalc_server::HealthCheck;
//!
//! let health = HealthCheck::new("tax-calculator");
//! let status = health.status();
//!
//! assert!(status.is_healthy());
//! assert_eq!(status.service(), "tax-calculator");
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Service identifier reported by `/health`.
pub const SERVICE_NAME: &str = "tax-calculator";

/// Health status response, returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// Service status (always "healthy" while the server is running).
    status: String,

    /// Service identifier.
    service: String,

    /// ISO-8601 timestamp taken when the snapshot was built.
    timestamp: String,
}

impl HealthStatus {
    /// Creates a new health status snapshot.
    #[must_use]
    pub fn new(
        status: impl Into<String>,
        service: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            status: status.into(),
            service: service.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Returns the status string.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the service identifier.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the snapshot timestamp.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns whether the status is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Health check handler.
///
/// The server is considered healthy whenever it is running; the check
/// carries the service identifier and the start time used for uptime
/// reporting.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Service identifier.
    service: String,

    /// When the server bound its listener.
    start_time: Instant,
}

impl HealthCheck {
    /// Creates a new health check, recording the current instant as the
    /// start time.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            start_time: Instant::now(),
        }
    }

    /// Returns the current health status with a fresh timestamp.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        let timestamp = chrono::Utc::now().to_rfc3339();
        HealthStatus::new("healthy", &self.service, timestamp)
    }

    /// Returns the elapsed time since the server started.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the service identifier.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}
