//! The metadata extraction pipeline for a single PDF.
//!
//! Metadata is gathered in three layers, each of which only fills fields that are still
//! empty:
//!
//! 1. Embedded document properties (title, authors, creation date)
//! 2. A year mined from the title, when the properties carried none
//! 3. Identifiers found in the text of the first pages, enriched through CrossRef (DOI) and
//!    arXiv (arXiv id)
//!
//! A failure in any layer is logged and the pipeline continues with what it has, so
//! [`MetadataExtractor::extract`] always returns a [`PaperMetadata`], possibly an empty one.
//!
//! # Examples
//!
//! ```no_run
//! use paperorg::{config::ExtractionConfig, extract::MetadataExtractor};
//!
//! # async fn example() {
//! // Properties and title only, no network
//! let offline = MetadataExtractor::new(ExtractionConfig { enhanced: false, ..Default::default() });
//! let metadata = offline.extract("paper.pdf").await;
//! println!("{:?} ({:?})", metadata.title(), metadata.year());
//! # }
//! ```

use super::*;
use crate::{
  identifiers::{find_arxiv_candidates, find_doi_candidates},
  pdf::{parse_authors, year_from_pdf_date, LopdfPropertyReader, PdfProperties, PropertyReader},
  text::{TextExtractionChain, TextLimits},
};

lazy_static! {
  /// Year patterns tried against a title, most specific first
  static ref TITLE_YEAR_PATTERNS: [Regex; 3] = [
    Regex::new(r"\((\d{4})\)").unwrap(),
    Regex::new(r"\[(\d{4})\]").unwrap(),
    Regex::new(r"\b(\d{4})\b").unwrap(),
  ];
}

/// Runs the layered extraction over PDFs.
///
/// Holds the API clients, so reusing one extractor across a batch keeps their rate limits
/// in effect between papers.
pub struct MetadataExtractor {
  /// Pipeline settings
  config:     ExtractionConfig,
  /// Source of embedded document properties
  properties: Box<dyn PropertyReader>,
  /// Text extraction strategies for the enhanced layer
  text:       TextExtractionChain,
  /// arXiv enrichment
  arxiv:      ArxivClient,
  /// CrossRef enrichment
  crossref:   CrossRefClient,
}

impl MetadataExtractor {
  /// Creates an extractor with the lopdf property reader and the standard text chain.
  pub fn new(config: ExtractionConfig) -> Self {
    Self {
      properties: Box::new(LopdfPropertyReader),
      text: TextExtractionChain::with_limits(TextLimits::from_config(&config)),
      arxiv: ArxivClient::with_config(&config.arxiv, &config.user_agent),
      crossref: CrossRefClient::with_config(&config.crossref, &config.user_agent),
      config,
    }
  }

  /// Replaces the property reader.
  pub fn with_property_reader(mut self, reader: impl PropertyReader + 'static) -> Self {
    self.properties = Box::new(reader);
    self
  }

  /// Replaces the text extraction chain.
  pub fn with_text_extractors(mut self, chain: TextExtractionChain) -> Self {
    self.text = chain;
    self
  }

  /// The settings this extractor runs with.
  pub fn config(&self) -> &ExtractionConfig { &self.config }

  /// Extracts whatever metadata can be found for the PDF at `path`. Never fails.
  pub async fn extract(&self, path: impl AsRef<Path>) -> PaperMetadata {
    let path = path.as_ref();
    debug!("Extracting metadata from {}", path.display());

    let mut metadata = match self.properties.read_properties(path) {
      Ok(properties) => from_properties(&properties),
      Err(e) => {
        debug!("Could not read document properties of {}: {e}", path.display());
        PaperMetadata::new()
      },
    };

    if metadata.year().is_none() {
      if let Some(year) = metadata.title().and_then(year_from_title) {
        debug!("Using year {year} found in title");
        metadata.fill_year(year);
      }
    }

    if self.config.enhanced {
      metadata = self.enrich(path, metadata).await;
    }

    debug!("Extracted metadata for {}: {metadata:?}", path.display());
    metadata
  }

  /// Mines the text for identifiers and merges what the matching services know.
  async fn enrich(&self, path: &Path, mut metadata: PaperMetadata) -> PaperMetadata {
    let Some(text) = self.text.extract(path) else {
      debug!("No text extracted from {}", path.display());
      return metadata;
    };

    if let Some(best) = find_doi_candidates(&text).into_iter().next() {
      debug!("Processing DOI match: {} (confidence: {:.2})", best.identifier, best.confidence);
      metadata.fill_doi(&best.identifier);
      if let Some(record) = self.crossref.get_metadata(&best.identifier).await {
        metadata = metadata.merge_from(&record);
      }
    }

    if let Some(best) = find_arxiv_candidates(&text).into_iter().next() {
      debug!("Processing arXiv match: {} (confidence: {:.2})", best.identifier, best.confidence);
      metadata.fill_arxiv_id(&best.identifier);
      if let Some(record) = self.arxiv.get_metadata(&best.identifier).await {
        metadata = metadata.merge_from(&record);
      }
    }

    metadata
  }
}

impl Default for MetadataExtractor {
  fn default() -> Self { Self::new(ExtractionConfig::default()) }
}

impl std::fmt::Debug for MetadataExtractor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MetadataExtractor")
      .field("config", &self.config)
      .field("text", &self.text)
      .finish_non_exhaustive()
  }
}

/// Extracts metadata for one PDF with the default settings. Never fails.
///
/// For batches prefer a shared [`MetadataExtractor`], which keeps API rate limits between
/// calls.
pub async fn extract_pdf_metadata(path: impl AsRef<Path>) -> PaperMetadata {
  MetadataExtractor::default().extract(path).await
}

/// Builds the first metadata layer from document properties.
fn from_properties(properties: &PdfProperties) -> PaperMetadata {
  let mut metadata = PaperMetadata::new();
  if let Some(title) = &properties.title {
    metadata.fill_title(title);
  }
  if let Some(author) = &properties.author {
    metadata.fill_authors(parse_authors(author));
  }
  if let Some(year) = [&properties.creation_date, &properties.modification_date]
    .into_iter()
    .flatten()
    .find_map(|date| year_from_pdf_date(date))
  {
    metadata.fill_year(year);
  }
  metadata
}

/// Finds a publication year in a title.
///
/// The first of `(YYYY)`, `[YYYY]` and a bare `YYYY` that occurs in the title decides; within
/// it the last occurrence is taken. Implausible years yield `None`.
///
/// ```
/// use paperorg::extract::year_from_title;
///
/// assert_eq!(year_from_title("Proceedings (2019)"), Some(2019));
/// assert_eq!(year_from_title("Comparing 2020 vs 2024 methods"), Some(2024));
/// assert_eq!(year_from_title("Top 1000 words"), None);
/// ```
pub fn year_from_title(title: &str) -> Option<i32> {
  let pattern = TITLE_YEAR_PATTERNS.iter().find(|pattern| pattern.is_match(title))?;
  let year = pattern.captures_iter(title).last()?.get(1)?.as_str().parse().ok()?;
  paper::is_plausible_year(year).then_some(year)
}
