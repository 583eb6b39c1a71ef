//! Static file serving.
//!
//! Resolves request paths against a root directory and serves the file
//! bytes with an inferred MIME type. Directory requests fall back to
//! the configured index document.
//!
//! # Security
//!
//! Two guards are applied before any filesystem access:
//!
//! - Paths containing a `..` component are rejected with 403, and the
//!   canonicalized target must stay inside the canonicalized root.
//! - Hidden files (leading `.`) are refused unless explicitly enabled.
//!
//! # Example
//!
//! ```rust
//! use taxcalc_server::StaticFiles;
//!
//! let files = StaticFiles::new("./public").index("index.html");
//! ```

use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::{header, Method, Response, StatusCode};
use http_body_util::Full;
use thiserror::Error;

/// Type alias for the HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Errors that can occur when serving static files.
#[derive(Debug, Error)]
pub enum StaticFileError {
    /// The requested file was not found.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The path is forbidden (traversal attempt or hidden file).
    #[error("forbidden path: {0}")]
    Forbidden(String),

    /// Method other than GET or HEAD.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// I/O error while reading the file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StaticFileError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Static file handler for a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    /// Root directory files are served from.
    root: PathBuf,

    /// Index document served for directory requests.
    index_file: Option<String>,

    /// Whether files starting with `.` may be served.
    serve_hidden: bool,
}

impl StaticFiles {
    /// Creates a new static file handler for the given root directory.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index_file: None,
            serve_hidden: false,
        }
    }

    /// Sets the index document served for directory requests.
    #[must_use]
    pub fn index<S: Into<String>>(mut self, index: S) -> Self {
        self.index_file = Some(index.into());
        self
    }

    /// Allows or refuses serving hidden files. Refused by default.
    #[must_use]
    pub fn serve_hidden(mut self, enabled: bool) -> Self {
        self.serve_hidden = enabled;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handles a request for a static file.
    ///
    /// `/` (and any directory path) resolves to the index document when
    /// one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`StaticFileError`] for non-GET/HEAD methods, traversal
    /// attempts, missing files, and read failures.
    pub fn handle(
        &self,
        request_path: &str,
        method: &Method,
    ) -> Result<HttpResponse, StaticFileError> {
        if method != Method::GET && method != Method::HEAD {
            return Err(StaticFileError::MethodNotAllowed);
        }

        let file_path = self.resolve_path(request_path)?;

        if file_path.is_dir() {
            if let Some(ref index) = self.index_file {
                let index_path = file_path.join(index);
                if index_path.is_file() {
                    return self.serve_file(&index_path, method);
                }
            }
            return Err(StaticFileError::NotFound(request_path.to_string()));
        }

        self.serve_file(&file_path, method)
    }

    /// Resolves a request path to a file path inside the root.
    ///
    /// Percent-encoding is decoded first, so the traversal check below
    /// also catches encoded `..` sequences.
    fn resolve_path(&self, request_path: &str) -> Result<PathBuf, StaticFileError> {
        let decoded = urlencoding::decode(request_path)
            .map_err(|_| StaticFileError::NotFound(request_path.to_string()))?;
        let path = decoded.trim_start_matches('/');

        for component in Path::new(path).components() {
            match component {
                std::path::Component::ParentDir => {
                    return Err(StaticFileError::Forbidden(
                        "directory traversal not allowed".to_string(),
                    ));
                }
                std::path::Component::Normal(name) => {
                    if !self.serve_hidden {
                        if let Some(name) = name.to_str() {
                            if name.starts_with('.') {
                                return Err(StaticFileError::Forbidden(
                                    "hidden files not allowed".to_string(),
                                ));
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let full_path = self.root.join(path);

        // Canonicalize both sides; a target that escapes the root via a
        // symlink is refused even though `..` was already rejected.
        let canonical = full_path
            .canonicalize()
            .map_err(|_| StaticFileError::NotFound(request_path.to_string()))?;
        let canonical_root = self.root.canonicalize()?;

        if !canonical.starts_with(&canonical_root) {
            return Err(StaticFileError::Forbidden(
                "path escapes root directory".to_string(),
            ));
        }

        Ok(canonical)
    }

    /// Serves one file: full bytes for GET, headers only for HEAD.
    fn serve_file(&self, path: &Path, method: &Method) -> Result<HttpResponse, StaticFileError> {
        let metadata = std::fs::metadata(path)?;
        let mime_type = detect_mime_type(path);

        let body = if method == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(std::fs::read(path)?)
        };

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_type)
            .header(header::CONTENT_LENGTH, metadata.len().to_string());

        if let Ok(modified) = metadata.modified() {
            builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
        }

        builder
            .body(Full::new(body))
            .map_err(|e| StaticFileError::Io(std::io::Error::other(e.to_string())))
    }
}

/// Infers the MIME type for a file from its extension.
#[must_use]
pub fn detect_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("index.html"), "<html>Tax Calculator</html>").unwrap();
        fs::write(dir.path().join("style.css"), "body { margin: 0 }").unwrap();
        fs::write(dir.path().join("calc.js"), "function calculate() {}").unwrap();
        fs::write(dir.path().join("tax rates.html"), "<html>Rates</html>").unwrap();
        fs::write(dir.path().join(".secret"), "hidden").unwrap();

        let subdir = dir.path().join("assets");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("logo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();

        dir
    }

    #[test]
    fn test_serve_html_file() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let response = files.handle("/index.html", &Method::GET).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert!(response.headers().contains_key(header::CONTENT_LENGTH));
        assert!(response.headers().contains_key(header::LAST_MODIFIED));
    }

    #[test]
    fn test_serve_css_and_js() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let css = files.handle("/style.css", &Method::GET).unwrap();
        assert_eq!(
            css.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/css; charset=utf-8"
        );

        let js = files.handle("/calc.js", &Method::GET).unwrap();
        assert_eq!(
            js.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/javascript; charset=utf-8"
        );
    }

    #[test]
    fn test_serve_subdirectory_file() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let response = files.handle("/assets/logo.png", &Method::GET).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
    }

    #[test]
    fn test_root_falls_back_to_index() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path()).index("index.html");

        let response = files.handle("/", &Method::GET).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_directory_without_index_is_not_found() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let result = files.handle("/", &Method::GET);
        assert!(matches!(result.unwrap_err(), StaticFileError::NotFound(_)));
    }

    #[test]
    fn test_directory_traversal_blocked() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let result = files.handle("/../etc/passwd", &Method::GET);
        assert!(matches!(result.unwrap_err(), StaticFileError::Forbidden(_)));
    }

    #[test]
    fn test_percent_encoded_path_is_decoded() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let response = files.handle("/tax%20rates.html", &Method::GET).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_encoded_traversal_blocked() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let result = files.handle("/%2e%2e/etc/passwd", &Method::GET);
        assert!(matches!(result.unwrap_err(), StaticFileError::Forbidden(_)));
    }

    #[test]
    fn test_hidden_files_blocked_by_default() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let result = files.handle("/.secret", &Method::GET);
        assert!(matches!(result.unwrap_err(), StaticFileError::Forbidden(_)));
    }

    #[test]
    fn test_hidden_files_allowed_when_enabled() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path()).serve_hidden(true);

        let response = files.handle("/.secret", &Method::GET).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_file_not_found() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let result = files.handle("/missing.html", &Method::GET);
        assert!(matches!(result.unwrap_err(), StaticFileError::NotFound(_)));
    }

    #[test]
    fn test_post_method_not_allowed() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let result = files.handle("/index.html", &Method::POST);
        assert!(matches!(
            result.unwrap_err(),
            StaticFileError::MethodNotAllowed
        ));
    }

    #[test]
    fn test_head_request_has_empty_body_and_length() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let response = files.handle("/index.html", &Method::HEAD).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // Content-Length reports the file size even though the body is empty.
        let length: u64 = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(length > 0);
    }

    #[test]
    fn test_mime_type_detection() {
        assert_eq!(
            detect_mime_type(Path::new("a.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(detect_mime_type(Path::new("a.json")), "application/json");
        assert_eq!(detect_mime_type(Path::new("a.woff2")), "font/woff2");
        assert_eq!(
            detect_mime_type(Path::new("a.unknown")),
            "application/octet-stream"
        );
        assert_eq!(
            detect_mime_type(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            StaticFileError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StaticFileError::Forbidden(String::new()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            StaticFileError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
