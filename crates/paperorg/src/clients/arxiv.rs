//! Client for looking up papers on arXiv.org.
//!
//! Queries arXiv's Atom feed API (`http://export.arxiv.org/api/query`) for exactly one entry
//! by identifier. Both new-style (2301.07041) and old-style (math.AG/0601001) identifiers are
//! accepted, with or without an `arXiv:` prefix.
//!
//! # Examples
//!
//! ```no_run
//! use paperorg::{clients::ArxivClient, paper::Bibliographic};
//!
//! # async fn example() {
//! let client = ArxivClient::new();
//! if let Some(record) = client.get_metadata("arXiv:2301.07041").await {
//!   println!("Title: {:?}", record.title());
//!   println!("Categories: {:?}", record.categories);
//! }
//! # }
//! ```

use super::*;

/// Internal representation of the arXiv API's Atom feed response.
#[derive(Debug, Deserialize)]
struct Feed {
  /// A feed holds zero entries when the id is unknown
  #[serde(rename = "entry", default)]
  entries: Vec<Entry>,
}

/// Internal representation of a paper entry from arXiv's API response.
#[derive(Debug, Deserialize)]
struct Entry {
  /// Paper title, wrapped over several lines by arXiv
  title:      String,
  /// List of paper authors
  #[serde(rename = "author", default)]
  authors:    Vec<Author>,
  /// Paper abstract
  #[serde(default)]
  summary:    String,
  /// First version submission timestamp, RFC 3339
  published:  Option<String>,
  /// arXiv URL (e.g., "http://arxiv.org/abs/2301.07041v1")
  #[serde(rename = "id")]
  arxiv_url:  String,
  /// Subject classifications
  #[serde(rename = "category", default)]
  categories: Vec<Category>,
}

/// Internal representation of an author from arXiv's API response.
#[derive(Debug, Deserialize)]
struct Author {
  /// Author's full name
  name: String,
}

/// Internal representation of a `<category term="..."/>` element.
#[derive(Debug, Deserialize)]
struct Category {
  /// Subject class, e.g. `cs.LG`
  #[serde(rename = "@term")]
  term: String,
}

/// Metadata for one arXiv paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxivRecord {
  /// Title with line wrapping collapsed
  pub title:         String,
  /// Author display names in paper order
  pub authors:       Vec<String>,
  /// Year of first submission
  pub year:          Option<i32>,
  /// Paper abstract
  pub abstract_text: String,
  /// Abstract page URL
  pub url:           String,
  /// Subject classifications
  pub categories:    Vec<String>,
}

impl Bibliographic for ArxivRecord {
  fn origin(&self) -> &'static str { "arXiv" }

  fn title(&self) -> Option<&str> {
    if self.title.is_empty() {
      None
    } else {
      Some(&self.title)
    }
  }

  fn authors(&self) -> &[String] { &self.authors }

  fn year(&self) -> Option<i32> { self.year }
}

/// Strips a leading `arXiv:` prefix (any case) and surrounding whitespace.
///
/// ```
/// use paperorg::clients::arxiv::normalize_arxiv_id;
///
/// assert_eq!(normalize_arxiv_id("arXiv:2301.07041v2"), "2301.07041v2");
/// assert_eq!(normalize_arxiv_id(" ARXIV:hep-th/0345678 "), "hep-th/0345678");
/// assert_eq!(normalize_arxiv_id("2301.07041"), "2301.07041");
/// ```
pub fn normalize_arxiv_id(arxiv_id: &str) -> String {
  let arxiv_id = arxiv_id.trim();
  match arxiv_id.get(..6) {
    Some(prefix) if prefix.eq_ignore_ascii_case("arxiv:") => arxiv_id[6..].trim().to_string(),
    _ => arxiv_id.to_string(),
  }
}

/// Client for the arXiv query API.
///
/// Requests are spaced by at least [`ClientConfig::min_interval`] (3 seconds by default, as
/// arXiv asks of API users).
#[derive(Debug)]
pub struct ArxivClient {
  /// Internal web client used to connect to the API.
  client:   reqwest::Client,
  /// The query endpoint.
  base_url: String,
  /// Request spacing.
  limiter:  RateLimiter,
}

impl ArxivClient {
  /// Creates a client for the public arXiv API.
  pub fn new() -> Self { Self::with_config(&ClientConfig::arxiv(), config::USER_AGENT) }

  /// Creates a client with custom endpoint, spacing and timeout.
  pub fn with_config(config: &ClientConfig, user_agent: &str) -> Self {
    Self {
      client:   http_client(config, user_agent),
      base_url: config.base_url.clone(),
      limiter:  RateLimiter::new(config.min_interval),
    }
  }

  /// Looks up a paper by arXiv identifier.
  ///
  /// Returns `None` when arXiv has no such paper, and also when the request or the response
  /// parsing fails; those failures are logged at debug level.
  pub async fn get_metadata(&self, arxiv_id: &str) -> Option<ArxivRecord> {
    let arxiv_id = normalize_arxiv_id(arxiv_id);
    match self.fetch(&arxiv_id).await {
      Ok(record) => Some(record),
      Err(OrganizeError::NotFound) => {
        debug!("arXiv has no entry for {arxiv_id}");
        None
      },
      Err(e) => {
        debug!("arXiv lookup for {arxiv_id} failed: {e}");
        None
      },
    }
  }

  /// Runs the query and converts the first feed entry.
  async fn fetch(&self, arxiv_id: &str) -> Result<ArxivRecord> {
    self.limiter.wait().await;
    debug!("Fetching from arXiv via: {} (id_list={arxiv_id})", self.base_url);

    let response = self
      .client
      .get(&self.base_url)
      .query(&[("id_list", arxiv_id), ("max_results", "1")])
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      return Err(OrganizeError::HttpStatus {
        status: status.as_u16(),
        url:    response.url().to_string(),
      });
    }

    let body = response.text().await?;
    trace!("arXiv response: {body}");

    let feed: Feed =
      from_str(&body).map_err(|e| OrganizeError::ApiError(format!("Failed to parse XML: {e}")))?;
    let entry = feed.entries.into_iter().next().ok_or(OrganizeError::NotFound)?;

    // Malformed ids come back as a single entry pointing at the API error page
    if entry.arxiv_url.contains("/api/errors") {
      return Err(OrganizeError::ApiError(entry.summary.trim().to_string()));
    }

    Ok(ArxivRecord {
      title:         collapse_whitespace(&entry.title),
      authors:       entry
        .authors
        .into_iter()
        .map(|author| collapse_whitespace(&author.name))
        .filter(|name| !name.is_empty())
        .collect(),
      year:          entry
        .published
        .as_deref()
        .and_then(|published| published.trim().parse::<DateTime<Utc>>().ok())
        .map(|published| published.year()),
      abstract_text: entry.summary.trim().to_string(),
      url:           entry.arxiv_url.trim().to_string(),
      categories:    entry.categories.into_iter().map(|category| category.term).collect(),
    })
  }
}

impl Default for ArxivClient {
  fn default() -> Self { Self::new() }
}

/// Joins the whitespace-separated words of `text` with single spaces.
fn collapse_whitespace(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }
