//! Clients for the bibliographic services used to enrich extracted metadata.
//!
//! Both clients are best effort: `get_metadata` returns `None` for anything other than a
//! usable record, and every outbound request is spaced by a [`RateLimiter`] so the public
//! APIs are not hammered during directory batches.
//!
//! # Supported Sources
//!
//! - [`arxiv`] - the arXiv Atom query API, looked up by arXiv identifier
//! - [`crossref`] - the CrossRef works API, looked up by DOI
//!
//! # Examples
//!
//! ```no_run
//! use paperorg::{
//!   clients::{arxiv::ArxivClient, crossref::CrossRefClient},
//!   paper::Bibliographic,
//! };
//!
//! # async fn example() {
//! if let Some(record) = ArxivClient::new().get_metadata("2301.07041").await {
//!   println!("arXiv: {:?}", record.title());
//! }
//!
//! if let Some(record) = CrossRefClient::new().get_metadata("10.1145/1327452.1327492").await {
//!   println!("CrossRef: {:?} ({:?})", record.title(), record.year());
//! }
//! # }
//! ```

use std::time::Instant;

use quick_xml::de::from_str;
use tokio::sync::Mutex;

pub mod arxiv;
pub mod crossref;

pub use arxiv::ArxivClient;
pub use crossref::CrossRefClient;

use super::*;

/// Spaces consecutive requests to one service by at least `min_interval`.
///
/// The lock is held across the wait, so callers sharing a client are served one at a time.
#[derive(Debug)]
pub struct RateLimiter {
  /// Minimum spacing between two requests
  min_interval: Duration,
  /// When the previous request was let through
  last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
  /// Creates a limiter that has not let any request through yet.
  pub fn new(min_interval: Duration) -> Self {
    Self { min_interval, last_request: Mutex::new(None) }
  }

  /// Waits until `min_interval` has passed since the previous call, then records this one.
  pub async fn wait(&self) {
    let mut last = self.last_request.lock().await;
    if let Some(previous) = *last {
      let elapsed = previous.elapsed();
      if elapsed < self.min_interval {
        let remaining = self.min_interval - elapsed;
        trace!("Rate limiting: sleeping {remaining:?}");
        tokio::time::sleep(remaining).await;
      }
    }
    *last = Some(Instant::now());
  }
}

/// Builds the HTTP client shared by every request of one API client.
fn http_client(config: &ClientConfig, user_agent: &str) -> reqwest::Client {
  reqwest::Client::builder()
    .user_agent(user_agent)
    .timeout(config.timeout)
    .build()
    .unwrap_or_default()
}
