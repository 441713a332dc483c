//! Error types for the paperorg library.
//!
//! Most of the metadata pipeline never surfaces an error: extraction and enrichment failures
//! are logged and discarded at each layer boundary. The variants below are what the
//! surrounding plumbing (downloading, validating input, moving files) can still report:
//! - Input validation
//! - Network and HTTP status failures
//! - File system operations
//! - PDF parsing (only observed internally by the extraction layers)
//!
//! # Examples
//!
//! ```no_run
//! use paperorg::{download::Downloader, errors::OrganizeError};
//!
//! # async fn example() -> Result<(), OrganizeError> {
//! let downloader = Downloader::new();
//! match downloader.download_file("https://example.org/paper.pdf", "paper.pdf").await {
//!   Err(OrganizeError::HttpStatus { status, .. }) => println!("Server said {status}"),
//!   Err(e) if e.is_retryable() => println!("Transient failure: {e}"),
//!   Err(e) => return Err(e),
//!   Ok(bytes) => println!("Downloaded {bytes} bytes"),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Error type alias used for the [`paperorg`](crate) crate.
pub type Result<T> = core::result::Result<T, OrganizeError>;

/// Errors that can occur when fetching and organizing papers.
#[derive(Error, Debug)]
pub enum OrganizeError {
  /// Input failed validation before any work was attempted.
  ///
  /// This can occur when:
  /// - A URL is empty, unparsable, lacks a host, or uses a scheme other than HTTP(S)
  /// - A local file is not a PDF
  /// - A directory holds no PDF files
  /// - A download finished with fewer bytes than the server announced
  #[error("{0}")]
  Validation(String),

  /// A network request failed before a response arrived.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),

  /// The server answered with a non-success status code.
  #[error("HTTP {status}: {url}")]
  HttpStatus {
    /// Status code returned by the server
    status: u16,
    /// The URL that was requested
    url:    String,
  },

  /// A file system operation on a known path failed.
  #[error("File system error at {}: {source}", path.display())]
  FileSystem {
    /// Path that was being read, written or created
    path:   PathBuf,
    /// Underlying IO failure
    source: std::io::Error,
  },

  /// A file system operation failed without a more specific path attached.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// Failed to parse a URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// PDF parsing errors from the lopdf library.
  ///
  /// Common causes are malformed or encrypted files and missing document objects.
  #[error(transparent)]
  Pdf(#[from] lopdf::Error),

  /// A text extraction strategy produced nothing usable.
  #[error("Text extraction failed: {0}")]
  TextExtraction(String),

  /// A glob pattern could not be built while listing a directory.
  #[error(transparent)]
  Glob(#[from] glob::PatternError),

  /// The requested record doesn't exist at the remote service.
  #[error("Paper not found")]
  NotFound,

  /// An API returned something we could not use.
  ///
  /// The string parameter describes what went wrong for debugging.
  #[error("API error: {0}")]
  ApiError(String),
}

impl OrganizeError {
  /// Checks if this error is transient and worth retrying.
  ///
  /// Only failures that never produced a response qualify: timeouts and connection errors.
  /// A response with an error status is final.
  ///
  /// ```
  /// use paperorg::errors::OrganizeError;
  ///
  /// let error = OrganizeError::HttpStatus { status: 503, url: "https://example.org".into() };
  /// assert!(!error.is_retryable());
  /// ```
  pub fn is_retryable(&self) -> bool {
    matches!(self, OrganizeError::Network(e) if e.is_timeout() || e.is_connect())
  }

  /// Wraps an IO error together with the path it happened on.
  pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    OrganizeError::FileSystem { path: path.into(), source }
  }
}
