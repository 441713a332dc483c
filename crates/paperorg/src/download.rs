//! Fetching PDFs over HTTP.
//!
//! [`Downloader`] validates URLs up front, retries transient network failures with
//! exponential backoff, streams the body to disk and never leaves a partial file behind.
//! A response with an error status is reported straight away without retrying.
//!
//! ```no_run
//! use paperorg::download::Downloader;
//!
//! # async fn example() -> Result<(), paperorg::errors::OrganizeError> {
//! let downloader = Downloader::new();
//! let (suggested, is_pdf) = downloader.get_download_info("https://arxiv.org/pdf/2301.07041").await?;
//! let name = suggested.filter(|_| is_pdf).unwrap_or_else(|| "paper.pdf".into());
//! downloader.download_file("https://arxiv.org/pdf/2301.07041", format!("Papers/{name}")).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{
  header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE},
  Response,
};
use tokio::{fs::File, io::AsyncWriteExt};
use url::Url;

use super::*;

lazy_static! {
  static ref FILENAME_PATTERNS: [Regex; 3] = [
    Regex::new(r#"(?i)filename\*?=\s*"([^"]+)""#).unwrap(),
    Regex::new(r"(?i)filename\*?=\s*'([^']+)'").unwrap(),
    Regex::new(r"(?i)filename\*?=\s*([^;,\s]+)").unwrap(),
  ];
}

/// How downloads retry transient failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
  /// Retries after the first attempt
  pub max_retries:   u32,
  /// Wait before the first retry
  pub initial_delay: Duration,
  /// Growth factor of the wait between retries
  pub multiplier:    f64,
  /// Per-request timeout
  pub timeout:       Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries:   3,
      initial_delay: Duration::from_secs(1),
      multiplier:    2.0,
      timeout:       Duration::from_secs(30),
    }
  }
}

/// The wait before retry number `attempt` (zero based): `initial_delay * multiplier^attempt`.
///
/// ```
/// use std::time::Duration;
///
/// use paperorg::download::{calculate_retry_delay, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// assert_eq!(calculate_retry_delay(0, &policy), Duration::from_secs(1));
/// assert_eq!(calculate_retry_delay(2, &policy), Duration::from_secs(4));
/// ```
pub fn calculate_retry_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
  let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
  policy.initial_delay.mul_f64(policy.multiplier.powi(exponent))
}

/// Checks that `url` is an absolute HTTP(S) URL with a host.
///
/// ```
/// use paperorg::download::validate_url;
///
/// assert!(validate_url("https://arxiv.org/pdf/2301.07041").is_ok());
/// assert!(validate_url("ftp://example.org/paper.pdf").is_err());
/// assert!(validate_url("").is_err());
/// ```
pub fn validate_url(url: &str) -> Result<Url> {
  if url.trim().is_empty() {
    return Err(OrganizeError::Validation("URL must be a non-empty string".into()));
  }
  let parsed = Url::parse(url)
    .map_err(|_| OrganizeError::Validation("URL must have a valid scheme and hostname".into()))?;
  if !matches!(parsed.scheme(), "http" | "https") {
    return Err(OrganizeError::Validation("URL must use HTTP or HTTPS protocol".into()));
  }
  if parsed.host_str().map_or(true, str::is_empty) {
    return Err(OrganizeError::Validation("URL must have a valid scheme and hostname".into()));
  }
  Ok(parsed)
}

/// Pulls a filename out of a `Content-Disposition` header value.
///
/// Quoted, single quoted and bare values are accepted. For RFC 5987 values
/// (`filename*=UTF-8''name.pdf`) the part after the last `'` is returned.
///
/// ```
/// use paperorg::download::filename_from_content_disposition;
///
/// assert_eq!(
///   filename_from_content_disposition(r#"inline; filename="1901.06032v7.pdf""#).as_deref(),
///   Some("1901.06032v7.pdf")
/// );
/// assert_eq!(
///   filename_from_content_disposition("attachment; filename*=UTF-8''paper.pdf").as_deref(),
///   Some("paper.pdf")
/// );
/// ```
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
  let filename = FILENAME_PATTERNS
    .iter()
    .find_map(|pattern| pattern.captures(header))?
    .get(1)?
    .as_str()
    .trim();

  let filename = if header.to_lowercase().contains("*=") && filename.contains('\'') {
    filename.rsplit('\'').next().unwrap_or(filename)
  } else {
    filename
  };
  (!filename.is_empty()).then(|| filename.to_string())
}

/// Progress callback arguments: bytes written so far and the announced total, if any.
pub type Progress = (u64, Option<u64>);

/// HTTP client for PDF downloads.
#[derive(Debug, Clone)]
pub struct Downloader {
  /// Internal web client, redirects are followed
  client: reqwest::Client,
  /// Retry behavior for transient failures
  policy: RetryPolicy,
}

impl Downloader {
  /// Creates a downloader with the default [`RetryPolicy`].
  pub fn new() -> Self { Self::with_policy(RetryPolicy::default()) }

  /// Creates a downloader with a custom retry policy.
  pub fn with_policy(policy: RetryPolicy) -> Self {
    let client = reqwest::Client::builder()
      .user_agent(config::USER_AGENT)
      .timeout(policy.timeout)
      .build()
      .unwrap_or_default();
    Self { client, policy }
  }

  /// Asks the server what `url` would return, without downloading it.
  ///
  /// Returns the filename suggested by `Content-Disposition`, if any, and whether the
  /// `Content-Type` is `application/pdf`.
  pub async fn get_download_info(&self, url: &str) -> Result<(Option<String>, bool)> {
    let url = validate_url(url)?;
    let response = self.client.head(url.clone()).send().await?;
    let response = check_status(response)?;

    let header =
      |name: HeaderName| response.headers().get(name).and_then(|value| value.to_str().ok());
    let suggested = header(CONTENT_DISPOSITION).and_then(filename_from_content_disposition);
    let is_pdf =
      header(CONTENT_TYPE).is_some_and(|kind| kind.to_lowercase().starts_with("application/pdf"));

    debug!("Download info for {url}: filename {suggested:?}, pdf {is_pdf}");
    Ok((suggested, is_pdf))
  }

  /// Downloads `url` to `destination`, creating parent directories. Returns the number of
  /// bytes written.
  pub async fn download_file(&self, url: &str, destination: impl AsRef<Path>) -> Result<u64> {
    self.download_file_with_progress(url, destination, |_| {}).await
  }

  /// Like [`download_file`](Self::download_file), reporting progress after every chunk.
  pub async fn download_file_with_progress(
    &self,
    url: &str,
    destination: impl AsRef<Path>,
    mut progress: impl FnMut(Progress),
  ) -> Result<u64> {
    let url = validate_url(url)?;
    let destination = destination.as_ref();
    if let Some(parent) = destination.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| OrganizeError::file_system(parent, e))?;
    }

    let response = self.fetch_with_retry(&url).await?;
    let total = response.content_length().filter(|&length| length > 0);

    let written = match write_body(response, destination, total, &mut progress).await {
      Ok(written) => written,
      Err(e) => {
        remove_partial(destination).await;
        return Err(e);
      },
    };

    if let Some(expected) = total {
      if written != expected {
        remove_partial(destination).await;
        return Err(OrganizeError::Validation(format!(
          "Download incomplete: expected {expected} bytes, got {written} bytes"
        )));
      }
    }

    debug!("Downloaded {written} bytes from {url} to {}", destination.display());
    Ok(written)
  }

  /// Sends the GET request, retrying timeouts and connection failures.
  async fn fetch_with_retry(&self, url: &Url) -> Result<Response> {
    let mut attempt = 0;
    loop {
      match self.client.get(url.clone()).send().await.map_err(OrganizeError::from) {
        Ok(response) => return check_status(response),
        Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
          let delay = calculate_retry_delay(attempt, &self.policy);
          warn!("Request to {url} failed ({e}), retrying in {delay:?}");
          tokio::time::sleep(delay).await;
          attempt += 1;
        },
        Err(e) => return Err(e),
      }
    }
  }
}

impl Default for Downloader {
  fn default() -> Self { Self::new() }
}

/// Turns an error status into [`OrganizeError::HttpStatus`].
fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    Ok(response)
  } else {
    Err(OrganizeError::HttpStatus { status: status.as_u16(), url: response.url().to_string() })
  }
}

/// Streams the response body into a new file at `destination`.
async fn write_body(
  mut response: Response,
  destination: &Path,
  total: Option<u64>,
  progress: &mut impl FnMut(Progress),
) -> Result<u64> {
  let io_error = |e| OrganizeError::file_system(destination, e);
  let mut file = File::create(destination).await.map_err(io_error)?;
  let mut written = 0;
  while let Some(chunk) = response.chunk().await? {
    file.write_all(&chunk).await.map_err(io_error)?;
    written += chunk.len() as u64;
    progress((written, total));
  }
  file.flush().await.map_err(io_error)?;
  Ok(written)
}

/// Best effort removal of a partially written download.
async fn remove_partial(destination: &Path) {
  if let Err(e) = tokio::fs::remove_file(destination).await {
    trace!("Could not remove partial download {}: {e}", destination.display());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fast_policy() -> RetryPolicy {
    RetryPolicy { initial_delay: Duration::from_millis(10), ..RetryPolicy::default() }
  }

  #[test]
  fn test_retry_delays_grow_exponentially() {
    let policy = RetryPolicy::default();
    assert_eq!(calculate_retry_delay(0, &policy), Duration::from_secs(1));
    assert_eq!(calculate_retry_delay(1, &policy), Duration::from_secs(2));
    assert_eq!(calculate_retry_delay(2, &policy), Duration::from_secs(4));

    let policy =
      RetryPolicy { initial_delay: Duration::from_millis(500), multiplier: 3.0, ..policy };
    assert_eq!(calculate_retry_delay(2, &policy), Duration::from_millis(4500));
  }

  #[test]
  fn test_validate_url() {
    assert!(validate_url("http://example.org/paper.pdf").is_ok());
    for bad in ["", "   ", "not a url", "file:///tmp/paper.pdf", "ftp://example.org/x", "https://"] {
      assert!(
        matches!(validate_url(bad), Err(OrganizeError::Validation(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn test_content_disposition_forms() {
    let parse = filename_from_content_disposition;
    assert_eq!(parse(r#"attachment; filename="document.pdf""#).as_deref(), Some("document.pdf"));
    assert_eq!(parse("attachment; filename='single.pdf'").as_deref(), Some("single.pdf"));
    assert_eq!(parse("attachment; filename=bare.pdf; size=10").as_deref(), Some("bare.pdf"));
    assert_eq!(parse("attachment; FILENAME=\"Upper.pdf\"").as_deref(), Some("Upper.pdf"));
    assert_eq!(parse("attachment; filename*=UTF-8'en'encoded.pdf").as_deref(), Some("encoded.pdf"));
    assert_eq!(parse("inline"), None);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_download_info() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("HEAD", "/pdf/2301.07041")
      .with_status(200)
      .with_header("content-type", "application/pdf; charset=binary")
      .with_header("content-disposition", r#"inline; filename="2301.07041v2.pdf""#)
      .create_async()
      .await;

    let url = format!("{}/pdf/2301.07041", server.url());
    let (filename, is_pdf) = Downloader::new().get_download_info(&url).await?;
    assert_eq!(filename.as_deref(), Some("2301.07041v2.pdf"));
    assert!(is_pdf);
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_download_info_html_page() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("HEAD", "/landing")
      .with_status(200)
      .with_header("content-type", "text/html")
      .create_async()
      .await;

    let url = format!("{}/landing", server.url());
    assert_eq!(Downloader::new().get_download_info(&url).await?, (None, false));
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_download_writes_file() -> anyhow::Result<()> {
    let body = b"%PDF-1.5 pretend content".to_vec();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/paper.pdf")
      .with_status(200)
      .with_header("content-type", "application/pdf")
      .with_body(&body)
      .create_async()
      .await;

    let dir = tempdir()?;
    let destination = dir.path().join("nested").join("paper.pdf");
    let mut reported = Vec::new();
    let written = Downloader::new()
      .download_file_with_progress(
        &format!("{}/paper.pdf", server.url()),
        &destination,
        |progress| reported.push(progress),
      )
      .await?;

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&destination)?, body);
    assert_eq!(reported.last(), Some(&(body.len() as u64, Some(body.len() as u64))));
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_http_error_is_not_retried() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/missing.pdf").with_status(404).expect(1).create_async().await;

    let dir = tempdir()?;
    let destination = dir.path().join("missing.pdf");
    let result = Downloader::with_policy(fast_policy())
      .download_file(&format!("{}/missing.pdf", server.url()), &destination)
      .await;

    assert!(matches!(result, Err(OrganizeError::HttpStatus { status: 404, .. })));
    assert!(!destination.exists());
    mock.assert_async().await;
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_connection_failure_is_retried_then_reported() -> anyhow::Result<()> {
    // Nothing listens on the discard port
    let dir = tempdir()?;
    let destination = dir.path().join("paper.pdf");
    let policy = RetryPolicy { max_retries: 2, ..fast_policy() };
    let result = Downloader::with_policy(policy)
      .download_file("http://127.0.0.1:9/paper.pdf", &destination)
      .await;

    assert!(matches!(result, Err(ref e) if e.is_retryable()));
    assert!(logs_contain("retrying in"));
    assert!(!destination.exists());
    Ok(())
  }

  #[tokio::test]
  async fn test_invalid_url_is_rejected_before_request() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let result =
      Downloader::new().download_file("ftp://example.org/x.pdf", dir.path().join("x")).await;
    assert!(matches!(result, Err(OrganizeError::Validation(_))));
    Ok(())
  }
}
