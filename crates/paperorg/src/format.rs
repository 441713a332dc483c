//! Filename synthesis from paper metadata.
//!
//! Names have the form `Author_Year_Title.pdf`, where each part is only present when known.
//! Every component is reduced to ASCII letters, digits, `-` and `_` so the result is safe
//! on every common filesystem, and lengths are capped so that the author and year survive
//! truncation of long titles.
//!
//! # Examples
//!
//! ```
//! use paperorg::{format::generate_filename, paper::PaperMetadata};
//!
//! let metadata = PaperMetadata::new()
//!   .with_title("Machine Learning: A Comprehensive Survey")
//!   .with_authors(["John Doe", "Jane Smith"])
//!   .with_year(2024);
//! assert_eq!(
//!   generate_filename(&metadata, "download.pdf"),
//!   "Doe_2024_Machine_Learning_A_Comprehensive_Survey.pdf"
//! );
//!
//! // Without a title there is nothing to name the file after
//! assert_eq!(generate_filename(&PaperMetadata::new(), "download.pdf"), "download.pdf");
//! ```

use unicode_normalization::UnicodeNormalization;

use super::*;

lazy_static! {
  static ref UNSAFE_CHARACTERS: Regex =
    Regex::new(r#"[/\\:*?"<>|&()\[\]{}.%$#@!^`~+=;',]"#).unwrap();
  static ref NON_WORD: Regex = Regex::new(r"[^\w\s-]").unwrap();
  static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
  static ref UNDERSCORES: Regex = Regex::new(r"_+").unwrap();
}

/// Longest a single sanitized component may be.
pub const MAX_COMPONENT_LENGTH: usize = 50;

/// Longest a generated filename may be, extension excluded.
pub const MAX_FILENAME_LENGTH: usize = 90;

/// Reduces text to a filesystem-safe filename component.
///
/// Accents are decomposed and dropped, punctuation becomes `_`, runs of whitespace and
/// underscores collapse to one `_`, and the result is capped at [`MAX_COMPONENT_LENGTH`],
/// cutting at the last `_` inside the cap when there is one.
///
/// ```
/// use paperorg::format::sanitize;
///
/// assert_eq!(sanitize("AI & ML: The Future/Present?"), "AI_ML_The_Future_Present");
/// assert_eq!(sanitize("Schrödinger's cat"), "Schrodinger_s_cat");
/// assert_eq!(sanitize("!!!"), "");
/// ```
pub fn sanitize(text: &str) -> String {
  let ascii: String = text.nfkd().filter(char::is_ascii).collect();
  let text = UNSAFE_CHARACTERS.replace_all(&ascii, "_");
  let text = NON_WORD.replace_all(&text, "");
  let text = WHITESPACE.replace_all(&text, "_");
  let text = UNDERSCORES.replace_all(&text, "_");
  let text = text.trim_matches('_');

  if text.len() <= MAX_COMPONENT_LENGTH {
    return text.to_string();
  }

  // Only ASCII is left, so byte offsets are character offsets
  let capped = &text[..MAX_COMPONENT_LENGTH];
  let capped = if text.as_bytes()[MAX_COMPONENT_LENGTH] == b'_' {
    capped
  } else {
    capped.rfind('_').map_or(capped, |boundary| &capped[..boundary])
  };
  capped.trim_matches('_').to_string()
}

/// The last whitespace separated token of a name, e.g. `Damme` for `Jean-Claude Van Damme`.
pub fn last_name(name: &str) -> &str { name.split_whitespace().last().unwrap_or("") }

/// Builds `Author_Year_Title.pdf` from whatever metadata is available.
///
/// Only the first author's last name is used. When the metadata has no title, or the title
/// has nothing filesystem-safe in it, `fallback_name` is returned unchanged. Names longer
/// than [`MAX_FILENAME_LENGTH`] lose characters from the end of the title only.
pub fn generate_filename(metadata: &PaperMetadata, fallback_name: &str) -> String {
  let Some(title) = metadata.title() else {
    return fallback_name.to_string();
  };
  let title = sanitize(title);
  if title.is_empty() {
    debug!("Title sanitizes to nothing, keeping {fallback_name}");
    return fallback_name.to_string();
  }

  let mut prefix = Vec::new();
  if let Some(author) = metadata.authors().first() {
    let author = sanitize(last_name(author));
    if !author.is_empty() {
      prefix.push(author);
    }
  }
  if let Some(year) = metadata.year() {
    prefix.push(year.to_string());
  }

  let name = if prefix.is_empty() {
    truncate(&title, MAX_FILENAME_LENGTH).to_string()
  } else {
    let prefix = prefix.join("_");
    let available = MAX_FILENAME_LENGTH.saturating_sub(prefix.len() + 1);
    let title = if prefix.len() + 1 + title.len() > MAX_FILENAME_LENGTH {
      truncate(&title, available).trim_end_matches('_')
    } else {
      title.as_str()
    };
    format!("{prefix}_{title}")
  };

  trace!("Generated filename {name}.pdf from {metadata:?}");
  format!("{name}.pdf")
}

/// The first `max` bytes of an ASCII string.
fn truncate(text: &str, max: usize) -> &str { &text[..text.len().min(max)] }
