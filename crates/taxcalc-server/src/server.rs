//! HTTP server implementation.
//!
//! Built on Hyper and Tokio. The lifecycle is split in two:
//!
//! 1. [`Server::bind`] — verifies the index document exists, binds the
//!    TCP listener, and records the start timestamp. All start failures
//!    surface here as [`ServerError`].
//! 2. [`BoundServer::serve`] — accepts connections until the shutdown
//!    signal fires, then drains in-flight connections with a bounded
//!    wait before returning.
//!
//! Routing is fixed: `GET /health` and `GET /status` are built-in, and
//! everything else is resolved as a static file under the configured
//! root (with `/` falling back to the index document).

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::health::{HealthCheck, SERVICE_NAME};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::static_files::{HttpResponse, StaticFileError, StaticFiles};

/// The tax calculator HTTP server, not yet bound.
///
/// # Example
///
/// ```rust
/// use taxcalc_server::{Server, ServerConfig};
///
/// let config = ServerConfig::builder().port(8082).build();
/// let server = Server::new(config);
/// ```
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Creates a new server with the given configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Returns a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the listener and transitions to the listening state.
    ///
    /// The start timestamp used for uptime reporting is recorded here.
    ///
    /// # Errors
    ///
    /// - [`ServerError::MissingIndex`] if the index document is absent
    ///   from the root directory (configuration error, not a crash)
    /// - [`ServerError::AddrInUse`] if the port is already bound
    /// - [`ServerError::Bind`] on any other bind failure
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let index_path = self.config.index_path();
        if !index_path.is_file() {
            tracing::error!(
                path = %index_path.display(),
                "Index document not found in root directory"
            );
            return Err(ServerError::MissingIndex { path: index_path });
        }

        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(port = addr.port(), "Port is already in use");
                ServerError::AddrInUse { addr }
            } else {
                tracing::error!(%addr, error = %e, "Failed to bind listener");
                ServerError::Bind { addr, source: e }
            }
        })?;
        let local_addr = listener.local_addr()?;

        let static_files = StaticFiles::new(self.config.root_dir())
            .index(self.config.index_file().to_string());

        tracing::info!(
            port = local_addr.port(),
            root = %self.config.root_dir().display(),
            "Tax Calculator Server listening"
        );

        let inner = Arc::new(ServerInner {
            config: self.config,
            static_files,
            health: HealthCheck::new(SERVICE_NAME),
            port: local_addr.port(),
            listening: AtomicBool::new(true),
        });

        Ok(BoundServer {
            inner,
            listener,
            local_addr,
        })
    }

    /// Runs the server until SIGTERM or SIGINT is received.
    ///
    /// Convenience wrapper around [`Server::bind`] and
    /// [`BoundServer::serve`] with OS-signal shutdown wiring.
    ///
    /// # Errors
    ///
    /// Returns any start failure from [`Server::bind`].
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.bind().await?.serve(shutdown).await
    }
}

/// A server that has bound its listener and is ready to serve.
pub struct BoundServer {
    inner: Arc<ServerInner>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// Returns the actual bound address (useful with port 0).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns whether the server is in the listening state.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    /// Serves connections until the shutdown signal fires.
    ///
    /// On shutdown the listener stops accepting, in-flight connections
    /// get up to the configured shutdown timeout to finish, and any
    /// still active past the bound are abandoned (never force-killed).
    ///
    /// # Errors
    ///
    /// Returns an error only for unrecoverable I/O failures; individual
    /// connection errors are logged and do not stop the loop.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let inner = Arc::clone(&self.inner);
                            let guard = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(inner, stream, remote_addr, shutdown).await
                                {
                                    tracing::error!(%remote_addr, error = %e, "Connection error");
                                }
                                drop(guard);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        // listening -> stopped; the listener itself is released when
        // `self` drops at the end of this function.
        self.inner.listening.store(false, Ordering::SeqCst);

        let timeout = self.inner.config.shutdown_timeout();
        let active = tracker.active_connections();
        if active > 0 {
            tracing::info!(
                connections = active,
                timeout_secs = timeout.as_secs(),
                "Waiting for in-flight connections to finish"
            );
        }

        tokio::select! {
            () = tracker.wait_for_idle() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    connections = tracker.active_connections(),
                    "Shutdown timeout reached, abandoning remaining connections"
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Shared state for request handling.
struct ServerInner {
    config: ServerConfig,
    static_files: StaticFiles,
    health: HealthCheck,
    port: u16,
    listening: AtomicBool,
}

impl ServerInner {
    /// Routes one request to a response.
    fn route(&self, method: &Method, path: &str) -> HttpResponse {
        match (method, path) {
            (&Method::GET, "/health") => self.handle_health(),
            (&Method::GET, "/status") => self.handle_status(),
            _ => match self.static_files.handle(path, method) {
                Ok(response) => response,
                Err(e) => error_response(&e, path),
            },
        }
    }

    /// Builds the `/health` JSON response.
    fn handle_health(&self) -> HttpResponse {
        let status = self.health.status();
        let body = serde_json::to_string(&status)
            .unwrap_or_else(|_| r#"{"status":"healthy"}"#.to_string());

        json_response(StatusCode::OK, body)
    }

    /// Builds the `/status` plain-text uptime report.
    fn handle_status(&self) -> HttpResponse {
        let uptime = self.health.uptime();
        let body = format!(
            "Tax Calculator Server Running\nPort: {}\nUptime: {:.2} seconds",
            self.port,
            uptime.as_secs_f64()
        );

        Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(body)))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
    }
}

/// Handles a single TCP connection.
async fn handle_connection(
    inner: Arc<ServerInner>,
    stream: tokio::net::TcpStream,
    remote_addr: SocketAddr,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let inner = Arc::clone(&inner);
        async move { handle_request(&inner, &req) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    let mut conn = std::pin::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            // Stop accepting further requests on this connection but let
            // the one in flight finish; the drain bound in `serve` caps
            // how long we wait overall.
            tracing::debug!(%remote_addr, "Draining connection for shutdown");
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

/// Handles a single HTTP request.
fn handle_request(
    inner: &Arc<ServerInner>,
    req: &Request<Incoming>,
) -> Result<HttpResponse, Infallible> {
    let method = req.method();
    let path = req.uri().path();

    let response = inner.route(method, path);

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Handled request"
    );

    Ok(response)
}

/// Maps a static-file error to its HTTP response.
fn error_response(error: &StaticFileError, path: &str) -> HttpResponse {
    let status = error.status_code();
    let body = match error {
        StaticFileError::NotFound(_) => {
            serde_json::json!({ "error": "Not Found", "path": path })
        }
        StaticFileError::Forbidden(_) => {
            serde_json::json!({ "error": "Forbidden", "path": path })
        }
        StaticFileError::MethodNotAllowed => {
            serde_json::json!({ "error": "Method Not Allowed" })
        }
        StaticFileError::Io(_) => {
            serde_json::json!({ "error": "Internal Server Error" })
        }
    };

    json_response(status, body.to_string())
}

/// Builds a JSON response with the given status and body.
fn json_response(status: StatusCode, body: String) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>Tax Calculator</html>").unwrap();
        dir
    }

    fn test_config(root: &TempDir) -> ServerConfig {
        ServerConfig::builder()
            .port(0)
            .root_dir(root.path())
            .shutdown_timeout(Duration::from_millis(100))
            .build()
    }

    fn test_inner(root: &TempDir) -> ServerInner {
        let config = test_config(root);
        let static_files = StaticFiles::new(config.root_dir()).index(config.index_file().to_string());
        ServerInner {
            config,
            static_files,
            health: HealthCheck::new(SERVICE_NAME),
            port: 8082,
            listening: AtomicBool::new(true),
        }
    }

    async fn body_string(response: HttpResponse) -> String {
        let collected = response.into_body().collect().await.unwrap();
        String::from_utf8(collected.to_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let root = create_root();
        let inner = test_inner(&root);

        let response = inner.route(&Method::GET, "/health");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_string(response).await;
        assert!(body.contains("healthy"));
        assert!(body.contains("tax-calculator"));
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let root = create_root();
        let inner = test_inner(&root);

        let response = inner.route(&Method::GET, "/status");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let body = body_string(response).await;
        assert!(body.contains("Tax Calculator Server Running"));
        assert!(body.contains("Port: 8082"));
        assert!(body.contains("Uptime:"));
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let root = create_root();
        let inner = test_inner(&root);

        let response = inner.route(&Method::GET, "/");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("Tax Calculator"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let root = create_root();
        let inner = test_inner(&root);

        let response = inner.route(&Method::GET, "/missing.html");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_to_health_falls_through_to_405() {
        let root = create_root();
        let inner = test_inner(&root);

        let response = inner.route(&Method::POST, "/health");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_bind_fails_without_index() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::builder().port(0).root_dir(dir.path()).build();

        let result = Server::new(config).bind().await;
        assert!(matches!(result, Err(ServerError::MissingIndex { .. })));
    }

    #[tokio::test]
    async fn test_bind_succeeds_with_index() {
        let root = create_root();
        let server = Server::new(test_config(&root));

        let bound = server.bind().await.unwrap();
        assert!(bound.is_listening());
        assert_ne!(bound.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_second_bind_on_same_port_is_addr_in_use() {
        let root = create_root();
        let first = Server::new(test_config(&root)).bind().await.unwrap();
        let port = first.local_addr().port();

        let config = ServerConfig::builder()
            .port(port)
            .root_dir(root.path())
            .build();
        let result = Server::new(config).bind().await;

        assert!(matches!(result, Err(ServerError::AddrInUse { .. })));
    }

    #[tokio::test]
    async fn test_serve_exits_on_shutdown() {
        let root = create_root();
        let bound = Server::new(test_config(&root)).bind().await.unwrap();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), bound.serve(shutdown)).await;
        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }
}
