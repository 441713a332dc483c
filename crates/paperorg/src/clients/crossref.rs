//! Client for resolving DOIs through the CrossRef REST API.
//!
//! Looks up `https://api.crossref.org/works/{doi}` and reduces CrossRef's rich work record
//! to the handful of fields needed for naming: title, authors, year, journal and URL.
//!
//! # Examples
//!
//! ```no_run
//! use paperorg::{clients::CrossRefClient, paper::Bibliographic};
//!
//! # async fn example() {
//! let client = CrossRefClient::new();
//! if let Some(record) = client.get_metadata("https://doi.org/10.1145/1327452.1327492").await {
//!   println!("Title: {:?}", record.title());
//!   println!("Journal: {:?}", record.journal);
//! }
//! # }
//! ```

use super::*;

lazy_static! {
  static ref DOI_PREFIX: Regex =
    Regex::new(r"(?i)^(?:doi:\s*|https?://(?:dx\.)?doi\.org/)").unwrap();
  static ref DOI_SHAPE: Regex = Regex::new(r"^10\..+/.+").unwrap();
}

/// Oldest year CrossRef data is trusted for.
const CROSSREF_MIN_YEAR: i32 = 1800;

/// Newest year CrossRef data is trusted for.
const CROSSREF_MAX_YEAR: i32 = 2100;

/// Response structure from the Crossref API.
#[derive(Debug, Deserialize)]
struct CrossrefResponse {
  /// The main work metadata container
  message: CrossrefWork,
}

/// Metadata about an academic work from Crossref.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CrossrefWork {
  /// Paper titles (usually contains one item)
  #[serde(default)]
  title:            Vec<String>,
  /// List of paper authors
  #[serde(default)]
  author:           Vec<CrossrefAuthor>,
  /// Print publication date, if available
  published_print:  Option<CrossrefDate>,
  /// Online publication date, if available
  published_online: Option<CrossrefDate>,
  /// Creation date in Crossref's system
  created:          Option<CrossrefDate>,
  /// Journal or proceedings names
  #[serde(default)]
  container_title:  Vec<String>,
  /// Resolver URL for the work
  #[serde(rename = "URL")]
  url:              Option<String>,
  /// The work's DOI as registered
  #[serde(rename = "DOI")]
  doi:              Option<String>,
}

/// Author information from Crossref.
#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
  /// Author's given (first) name
  given:  Option<String>,
  /// Author's family (last) name
  family: Option<String>,
}

/// Date representation in Crossref's API.
#[derive(Debug, Deserialize)]
struct CrossrefDate {
  /// Date parts in the format [[year, month, day]], any of which may be null
  #[serde(rename = "date-parts", default)]
  date_parts: Vec<Vec<Option<i32>>>,
}

impl CrossrefDate {
  /// The year of the first date, when it lies in the range CrossRef data is trusted for.
  fn year(&self) -> Option<i32> {
    let year = (*self.date_parts.first()?.first()?)?;
    (CROSSREF_MIN_YEAR..=CROSSREF_MAX_YEAR).contains(&year).then_some(year)
  }
}

/// Metadata for one work registered with CrossRef.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossrefRecord {
  /// Main title
  pub title:   Option<String>,
  /// Author display names in paper order
  pub authors: Vec<String>,
  /// Publication year
  pub year:    Option<i32>,
  /// The DOI as registered
  pub doi:     String,
  /// Journal or proceedings name
  pub journal: Option<String>,
  /// Resolver URL
  pub url:     Option<String>,
}

impl Bibliographic for CrossrefRecord {
  fn origin(&self) -> &'static str { "CrossRef" }

  fn title(&self) -> Option<&str> { self.title.as_deref() }

  fn authors(&self) -> &[String] { &self.authors }

  fn year(&self) -> Option<i32> { self.year }
}

/// Reduces a DOI, `doi:` string or DOI resolver URL to its bare `10.xxxx/yyyy` form.
///
/// Returns `None` when what remains does not look like a DOI.
///
/// ```
/// use paperorg::clients::crossref::normalize_doi;
///
/// assert_eq!(normalize_doi("DOI: 10.1038/nature12373").as_deref(), Some("10.1038/nature12373"));
/// assert_eq!(normalize_doi("https://dx.doi.org/10.1038/nature12373").as_deref(), Some("10.1038/nature12373"));
/// assert_eq!(normalize_doi("not-a-doi"), None);
/// ```
pub fn normalize_doi(doi: &str) -> Option<String> {
  let doi = DOI_PREFIX.replace(doi.trim(), "");
  let doi = doi.trim();
  DOI_SHAPE.is_match(doi).then(|| doi.to_string())
}

/// Client for the CrossRef works API.
///
/// Requests carry an identifying user agent, as CrossRef asks, and are spaced by at least
/// [`ClientConfig::min_interval`] (1 second by default).
#[derive(Debug)]
pub struct CrossRefClient {
  /// Internal web client used to connect to the API.
  client:   reqwest::Client,
  /// The base URL to use for the client.
  base_url: String,
  /// Request spacing.
  limiter:  RateLimiter,
}

impl CrossRefClient {
  /// Creates a client for the public CrossRef API.
  pub fn new() -> Self { Self::with_config(&ClientConfig::crossref(), config::USER_AGENT) }

  /// Creates a client with custom endpoint, spacing and timeout.
  pub fn with_config(config: &ClientConfig, user_agent: &str) -> Self {
    Self {
      client:   http_client(config, user_agent),
      base_url: config.base_url.trim_end_matches('/').to_string(),
      limiter:  RateLimiter::new(config.min_interval),
    }
  }

  /// Looks up a work by DOI.
  ///
  /// Strings that do not normalize to a DOI return `None` without touching the network.
  /// Unknown DOIs, non-200 responses, and transport or parsing failures also return `None`.
  pub async fn get_metadata(&self, doi: &str) -> Option<CrossrefRecord> {
    let Some(doi) = normalize_doi(doi) else {
      debug!("Not looking up invalid DOI {doi:?}");
      return None;
    };
    match self.fetch(&doi).await {
      Ok(record) => Some(record),
      Err(e) => {
        debug!("CrossRef lookup for {doi} failed: {e}");
        None
      },
    }
  }

  /// The work URL for `doi`, with each `/`-separated part percent-encoded as a path segment.
  fn work_url(&self, doi: &str) -> Result<url::Url> {
    let mut url = url::Url::parse(&self.base_url)?;
    url
      .path_segments_mut()
      .map_err(|()| OrganizeError::ApiError(format!("Not a base URL: {}", self.base_url)))?
      .pop_if_empty()
      .extend(doi.split('/'));
    Ok(url)
  }

  /// Requests the work record and converts it.
  async fn fetch(&self, doi: &str) -> Result<CrossrefRecord> {
    let url = self.work_url(doi)?;
    self.limiter.wait().await;
    debug!("Fetching from Crossref via: {url}");

    let response = self.client.get(url.clone()).send().await?;
    let status = response.status();
    debug!("Crossref response status: {status}");
    if status == reqwest::StatusCode::NOT_FOUND {
      return Err(OrganizeError::NotFound);
    }
    if status != reqwest::StatusCode::OK {
      return Err(OrganizeError::HttpStatus { status: status.as_u16(), url: url.to_string() });
    }

    let text = response.text().await?;
    trace!("Crossref response: {text}");

    let response: CrossrefResponse = serde_json::from_str(&text)
      .map_err(|e| OrganizeError::ApiError(format!("Failed to parse JSON: {e}")))?;
    let work = response.message;

    let authors = work
      .author
      .into_iter()
      .filter_map(|author| match (author.given, author.family) {
        (Some(given), Some(family)) => Some(format!("{} {}", given.trim(), family.trim())),
        (None, Some(family)) => Some(family),
        _ => None,
      })
      .map(|name| name.trim().to_string())
      .filter(|name| !name.is_empty())
      .collect();

    let year = [&work.published_print, &work.published_online, &work.created]
      .into_iter()
      .flatten()
      .find_map(CrossrefDate::year);

    Ok(CrossrefRecord {
      title: work.title.into_iter().map(|title| title.trim().to_string()).find(|t| !t.is_empty()),
      authors,
      year,
      doi: work.doi.unwrap_or_else(|| doi.to_string()),
      journal: work.container_title.into_iter().next(),
      url: work.url,
    })
  }
}

impl Default for CrossRefClient {
  fn default() -> Self { Self::new() }
}
