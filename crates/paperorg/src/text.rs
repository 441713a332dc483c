//! Plain text extraction from the first pages of a PDF.
//!
//! Identifiers like DOIs and arXiv ids almost always sit on the first page, so extractors
//! only read a handful of leading pages and stop early once enough text was collected.
//! Several strategies are tried in order by a [`TextExtractionChain`]: the first one that
//! yields non-blank text wins.
//!
//! ```no_run
//! use paperorg::text::TextExtractionChain;
//!
//! let chain = TextExtractionChain::default();
//! if let Some(text) = chain.extract("paper.pdf".as_ref()) {
//!   println!("{} characters", text.len());
//! }
//! ```

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;

use super::*;

/// Page and character limits shared by the extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLimits {
  /// Number of leading pages to read
  pub max_pages:   usize,
  /// Stop reading once the collected text has more characters than this
  pub text_budget: usize,
}

impl TextLimits {
  /// Limits taken from an [`ExtractionConfig`].
  pub fn from_config(config: &ExtractionConfig) -> Self {
    Self { max_pages: config.max_pages, text_budget: config.text_budget }
  }

  /// Joins page texts, trimming each page and skipping blank ones, until the page limit is
  /// reached or the budget is exceeded.
  fn collect(&self, pages: impl IntoIterator<Item = String>) -> String {
    let mut parts = Vec::new();
    let mut collected = 0;
    for page in pages.into_iter().take(self.max_pages) {
      let page = page.trim();
      if page.is_empty() {
        continue;
      }
      collected += page.chars().count();
      parts.push(page.to_string());
      if collected > self.text_budget {
        break;
      }
    }
    parts.join("\n")
  }
}

impl Default for TextLimits {
  fn default() -> Self { Self::from_config(&ExtractionConfig::default()) }
}

/// A strategy for pulling plain text out of a PDF.
pub trait TextExtractor: Send + Sync {
  /// Short name used in logs.
  fn name(&self) -> &'static str;

  /// Extracts the text of the leading pages of the PDF at `path`.
  fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Layout-aware extraction through the `pdf-extract` crate.
///
/// Handles font encodings and text positioning better than [`LopdfTextExtractor`], but it
/// is also more fragile on unusual files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutTextExtractor {
  /// Page and character limits
  limits: TextLimits,
}

impl LayoutTextExtractor {
  /// Creates the extractor with the given limits.
  pub fn new(limits: TextLimits) -> Self { Self { limits } }
}

impl TextExtractor for LayoutTextExtractor {
  fn name(&self) -> &'static str { "pdf-extract" }

  fn extract_text(&self, path: &Path) -> Result<String> {
    // pdf-extract panics on some malformed content streams
    let pages = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)))
      .map_err(|_| OrganizeError::TextExtraction("pdf-extract panicked".into()))?
      .map_err(|e| OrganizeError::TextExtraction(e.to_string()))?;

    non_empty(self.limits.collect(pages))
  }
}

/// Page by page extraction through `lopdf`.
///
/// Simpler than [`LayoutTextExtractor`] and more tolerant of damaged files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextExtractor {
  /// Page and character limits
  limits: TextLimits,
}

impl LopdfTextExtractor {
  /// Creates the extractor with the given limits.
  pub fn new(limits: TextLimits) -> Self { Self { limits } }
}

impl TextExtractor for LopdfTextExtractor {
  fn name(&self) -> &'static str { "lopdf" }

  fn extract_text(&self, path: &Path) -> Result<String> {
    let doc = Document::load(path)?;
    let pages = doc
      .get_pages()
      .into_keys()
      .take(self.limits.max_pages)
      .map(|page| doc.extract_text(&[page]))
      .collect::<std::result::Result<Vec<_>, _>>()?;

    non_empty(self.limits.collect(pages))
  }
}

/// Turns blank output into an error so the chain moves on to the next strategy.
fn non_empty(text: String) -> Result<String> {
  if text.trim().is_empty() {
    Err(OrganizeError::TextExtraction("no text found".into()))
  } else {
    Ok(text)
  }
}

/// Ordered list of extraction strategies, tried until one produces text.
pub struct TextExtractionChain {
  /// Strategies in the order they are tried
  extractors: Vec<Box<dyn TextExtractor>>,
}

impl TextExtractionChain {
  /// Creates a chain from the given strategies.
  pub fn new(extractors: Vec<Box<dyn TextExtractor>>) -> Self { Self { extractors } }

  /// The standard chain: [`LayoutTextExtractor`], then [`LopdfTextExtractor`].
  pub fn with_limits(limits: TextLimits) -> Self {
    Self::new(vec![
      Box::new(LayoutTextExtractor::new(limits)),
      Box::new(LopdfTextExtractor::new(limits)),
    ])
  }

  /// Returns the text of the first strategy that yields non-blank output, or `None` if
  /// every strategy failed.
  pub fn extract(&self, path: &Path) -> Option<String> {
    for extractor in &self.extractors {
      match extractor.extract_text(path) {
        Ok(text) if !text.trim().is_empty() => {
          debug!("Extracted text from {} using {}", path.display(), extractor.name());
          return Some(text);
        },
        Ok(_) => debug!("{} found no text in {}", extractor.name(), path.display()),
        Err(e) => debug!("Text extraction failed with {}: {e}", extractor.name()),
      }
    }
    warn!("All text extractors failed for {}", path.display());
    None
  }
}

impl Default for TextExtractionChain {
  fn default() -> Self { Self::with_limits(TextLimits::default()) }
}

impl std::fmt::Debug for TextExtractionChain {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let names: Vec<_> = self.extractors.iter().map(|extractor| extractor.name()).collect();
    f.debug_struct("TextExtractionChain").field("extractors", &names).finish()
  }
}
