//! The metadata record that flows through the extraction pipeline.
//!
//! A [`PaperMetadata`] starts out empty for every PDF, is filled in by the property layer and
//! then by API enrichment, and is finally consumed by the filename synthesizer. Every field
//! is write-once: a `fill_*` call on a field that already holds a value is a no-op, so data
//! from an earlier layer always wins over data from a later one.
//!
//! # Examples
//!
//! ```
//! use paperorg::paper::PaperMetadata;
//!
//! let mut metadata = PaperMetadata::new().with_title("  Deep Neural Networks ");
//! assert_eq!(metadata.title(), Some("Deep Neural Networks"));
//!
//! // Later layers cannot overwrite what is already there
//! assert!(!metadata.fill_title("Something Else"));
//! assert_eq!(metadata.title(), Some("Deep Neural Networks"));
//!
//! // Implausible years are never stored
//! assert!(!metadata.fill_year(1850));
//! assert_eq!(metadata.year(), None);
//! ```

use super::*;

/// Earliest publication year accepted into a [`PaperMetadata`].
pub const MIN_YEAR: i32 = 1900;

/// Latest publication year accepted into a [`PaperMetadata`]: five years past the current one.
pub fn max_year() -> i32 { Utc::now().year() + 5 }

/// Whether `year` falls inside `[MIN_YEAR, max_year()]`.
pub fn is_plausible_year(year: i32) -> bool { (MIN_YEAR..=max_year()).contains(&year) }

/// Structured metadata for one academic paper.
///
/// Fields are private so the write-once and range invariants hold for every value that
/// exists; use the accessors to read and the `fill_*`/`with_*` methods to populate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
  /// Trimmed, never empty
  title:    Option<String>,
  /// Display names in paper order, empty when unknown
  authors:  Vec<String>,
  /// Bare `10.xxxx/yyyy` form
  doi:      Option<String>,
  /// arXiv identifier without the `arXiv:` prefix, version suffix kept
  arxiv_id: Option<String>,
  /// Always inside `[MIN_YEAR, max_year()]`
  year:     Option<i32>,
}

impl PaperMetadata {
  /// Creates an empty record.
  pub fn new() -> Self { Self::default() }

  /// The paper title, if known.
  pub fn title(&self) -> Option<&str> { self.title.as_deref() }

  /// The paper authors in order; empty when unknown.
  pub fn authors(&self) -> &[String] { &self.authors }

  /// The DOI, if known.
  pub fn doi(&self) -> Option<&str> { self.doi.as_deref() }

  /// The arXiv identifier, if known.
  pub fn arxiv_id(&self) -> Option<&str> { self.arxiv_id.as_deref() }

  /// The publication year, if known.
  pub fn year(&self) -> Option<i32> { self.year }

  /// Whether no field has been populated yet.
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.authors.is_empty()
      && self.doi.is_none()
      && self.arxiv_id.is_none()
      && self.year.is_none()
  }

  /// Sets the title if none is present and the trimmed text is not empty.
  ///
  /// Returns whether the title was stored.
  pub fn fill_title(&mut self, title: impl AsRef<str>) -> bool {
    let title = title.as_ref().trim();
    if self.title.is_some() || title.is_empty() {
      return false;
    }
    self.title = Some(title.to_string());
    true
  }

  /// Sets the author list if none is present. Blank names are dropped first.
  ///
  /// Returns whether any authors were stored.
  pub fn fill_authors<I, S>(&mut self, authors: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>, {
    if !self.authors.is_empty() {
      return false;
    }
    self.authors = authors
      .into_iter()
      .map(|name| name.as_ref().trim().to_string())
      .filter(|name| !name.is_empty())
      .collect();
    !self.authors.is_empty()
  }

  /// Sets the DOI if none is present.
  pub fn fill_doi(&mut self, doi: impl AsRef<str>) -> bool {
    let doi = doi.as_ref().trim();
    if self.doi.is_some() || doi.is_empty() {
      return false;
    }
    self.doi = Some(doi.to_string());
    true
  }

  /// Sets the arXiv identifier if none is present, dropping an `arXiv:` prefix.
  pub fn fill_arxiv_id(&mut self, arxiv_id: impl AsRef<str>) -> bool {
    let arxiv_id = clients::arxiv::normalize_arxiv_id(arxiv_id.as_ref());
    if self.arxiv_id.is_some() || arxiv_id.is_empty() {
      return false;
    }
    self.arxiv_id = Some(arxiv_id);
    true
  }

  /// Sets the year if none is present and it passes [`is_plausible_year`].
  pub fn fill_year(&mut self, year: i32) -> bool {
    if self.year.is_some() || !is_plausible_year(year) {
      return false;
    }
    self.year = Some(year);
    true
  }

  /// Builder form of [`fill_title`](Self::fill_title).
  pub fn with_title(mut self, title: impl AsRef<str>) -> Self {
    self.fill_title(title);
    self
  }

  /// Builder form of [`fill_authors`](Self::fill_authors).
  pub fn with_authors<I, S>(mut self, authors: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>, {
    self.fill_authors(authors);
    self
  }

  /// Builder form of [`fill_doi`](Self::fill_doi).
  pub fn with_doi(mut self, doi: impl AsRef<str>) -> Self {
    self.fill_doi(doi);
    self
  }

  /// Builder form of [`fill_arxiv_id`](Self::fill_arxiv_id).
  pub fn with_arxiv_id(mut self, arxiv_id: impl AsRef<str>) -> Self {
    self.fill_arxiv_id(arxiv_id);
    self
  }

  /// Builder form of [`fill_year`](Self::fill_year).
  pub fn with_year(mut self, year: i32) -> Self {
    self.fill_year(year);
    self
  }

  /// Copies title, authors and year from an enrichment record into whichever of those
  /// fields are still empty.
  pub fn merge_from(mut self, record: &impl Bibliographic) -> Self {
    if let Some(title) = record.title() {
      if self.fill_title(title) {
        debug!("Updated title from {}: {title}", record.origin());
      }
    }
    if self.fill_authors(record.authors()) {
      debug!("Updated authors from {}: {:?}", record.origin(), self.authors);
    }
    if let Some(year) = record.year() {
      if self.fill_year(year) {
        debug!("Updated year from {}: {year}", record.origin());
      }
    }
    self
  }
}

/// A bibliographic record returned by an enrichment service.
///
/// Implemented by the arXiv and CrossRef records so [`PaperMetadata::merge_from`] can treat
/// them alike.
pub trait Bibliographic {
  /// Human readable name of the service, used in logs
  fn origin(&self) -> &'static str;
  /// Title as reported by the service
  fn title(&self) -> Option<&str>;
  /// Author display names as reported by the service
  fn authors(&self) -> &[String];
  /// Publication year as reported by the service
  fn year(&self) -> Option<i32>;
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Record {
    title:   Option<String>,
    authors: Vec<String>,
    year:    Option<i32>,
  }

  impl Bibliographic for Record {
    fn origin(&self) -> &'static str { "test" }

    fn title(&self) -> Option<&str> { self.title.as_deref() }

    fn authors(&self) -> &[String] { &self.authors }

    fn year(&self) -> Option<i32> { self.year }
  }

  #[test]
  fn test_new_metadata_is_empty() {
    let metadata = PaperMetadata::new();
    assert!(metadata.is_empty());
    assert!(metadata.authors().is_empty());
    assert_eq!(metadata.title(), None);
  }

  #[test]
  fn test_blank_values_are_absent() {
    let metadata = PaperMetadata::new().with_title("   ").with_authors(["", "  "]).with_doi(" ");
    assert!(metadata.is_empty());
  }

  #[test]
  fn test_year_bounds() {
    assert!(PaperMetadata::new().with_year(MIN_YEAR).year().is_some());
    assert!(PaperMetadata::new().with_year(max_year()).year().is_some());
    assert!(PaperMetadata::new().with_year(MIN_YEAR - 1).year().is_none());
    assert!(PaperMetadata::new().with_year(max_year() + 1).year().is_none());
  }

  #[test]
  fn test_arxiv_prefix_is_stripped() {
    let metadata = PaperMetadata::new().with_arxiv_id("arXiv:2401.12345v3");
    assert_eq!(metadata.arxiv_id(), Some("2401.12345v3"));
  }

  #[test]
  fn test_merge_only_fills_gaps() {
    let metadata = PaperMetadata::new().with_title("From Properties").with_year(2020);
    let record = Record {
      title:   Some("From API".into()),
      authors: vec!["Ada Lovelace".into()],
      year:    Some(2021),
    };

    let metadata = metadata.merge_from(&record);
    assert_eq!(metadata.title(), Some("From Properties"));
    assert_eq!(metadata.authors(), ["Ada Lovelace".to_string()]);
    assert_eq!(metadata.year(), Some(2020));
  }

  #[test]
  fn test_merge_rejects_implausible_year() {
    let record = Record { title: None, authors: vec![], year: Some(1850) };
    let metadata = PaperMetadata::new().merge_from(&record);
    assert_eq!(metadata.year(), None);
  }
}
