//! Tunables for the extraction pipeline and its API clients.
//!
//! The defaults match what the tool has always done: five pages of text, a 5000 character
//! budget, and polite request spacing for arXiv (3s) and CrossRef (1s).
//!
//! ```
//! use std::time::Duration;
//!
//! use paperorg::config::ExtractionConfig;
//!
//! let config = ExtractionConfig::default();
//! assert_eq!(config.max_pages, 5);
//! assert_eq!(config.arxiv.min_interval, Duration::from_secs(3));
//!
//! let offline = ExtractionConfig { enhanced: false, ..ExtractionConfig::default() };
//! assert!(!offline.enhanced);
//! ```

use super::*;

/// Default arXiv query endpoint.
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Default CrossRef works endpoint.
pub const CROSSREF_API_URL: &str = "https://api.crossref.org/works";

/// User agent sent to the bibliographic APIs. CrossRef asks clients to identify themselves.
pub const USER_AGENT: &str =
  concat!("paperorg/", env!("CARGO_PKG_VERSION"), " (https://github.com/autoparallel/paperorg)");

/// Connection settings for one bibliographic API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
  /// Endpoint the client sends its requests to
  pub base_url:     String,
  /// Minimum spacing between two consecutive requests
  pub min_interval: Duration,
  /// Per-request timeout
  pub timeout:      Duration,
}

impl ClientConfig {
  /// Settings for the public arXiv API.
  pub fn arxiv() -> Self {
    Self {
      base_url:     ARXIV_API_URL.to_string(),
      min_interval: Duration::from_secs(3),
      timeout:      Duration::from_secs(10),
    }
  }

  /// Settings for the public CrossRef API.
  pub fn crossref() -> Self {
    Self {
      base_url:     CROSSREF_API_URL.to_string(),
      min_interval: Duration::from_secs(1),
      timeout:      Duration::from_secs(10),
    }
  }

  /// Same settings pointed at another endpoint, e.g. a mock server.
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  /// Same settings with a different request spacing.
  pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
    self.min_interval = min_interval;
    self
  }
}

/// Settings for [`MetadataExtractor`](crate::extract::MetadataExtractor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
  /// Number of leading pages handed to the text extraction chain
  pub max_pages:   usize,
  /// Stop reading further pages once this many characters were collected
  pub text_budget: usize,
  /// Whether to run the text mining and API enrichment layer at all
  pub enhanced:    bool,
  /// arXiv API settings
  pub arxiv:       ClientConfig,
  /// CrossRef API settings
  pub crossref:    ClientConfig,
  /// User agent sent with every API request
  pub user_agent:  String,
}

impl Default for ExtractionConfig {
  fn default() -> Self {
    Self {
      max_pages:   5,
      text_budget: 5000,
      enhanced:    true,
      arxiv:       ClientConfig::arxiv(),
      crossref:    ClientConfig::crossref(),
      user_agent:  USER_AGENT.to_string(),
    }
  }
}
