//! DOI and arXiv identifier mining with confidence scoring.
//!
//! Every pattern is run over the whole text; each hit gets the confidence of the pattern
//! that produced it. When the same identifier is found more than once only the most
//! confident occurrence is kept, and results come back sorted by descending confidence.
//!
//! | Kind  | Pattern                                      | Confidence |
//! |-------|----------------------------------------------|------------|
//! | DOI   | bare `10.NNNN/suffix`                        | 1.0        |
//! | DOI   | `doi: 10.NNNN/suffix`                        | 0.95       |
//! | DOI   | `https://doi.org/10.NNNN/suffix`             | 0.9        |
//! | DOI   | `(doi: 10.NNNN/suffix)` / `[doi …]`          | 0.8        |
//! | arXiv | `YYMM.NNNNN[vN]`, optionally `arXiv:`-prefixed | 1.0      |
//! | arXiv | `arxiv = YYMM.NNNNN[vN]`                     | 0.95       |
//! | arXiv | `arxiv.org/abs/YYMM.NNNNN`                   | 0.9        |
//! | arXiv | `subject-class[.XX]/YYMMnnn`                 | 0.8        |
//! | arXiv | `arxiv.org/abs/subject-class/YYMMnnn`        | 0.75       |
//!
//! # Examples
//!
//! ```
//! use paperorg::identifiers::{find_arxiv_candidates, find_doi_candidates};
//!
//! let doi = find_doi_candidates("DOI: 10.1234/example.doi");
//! assert_eq!(doi.len(), 1);
//! assert_eq!(doi[0].identifier, "10.1234/example.doi");
//!
//! let arxiv = find_arxiv_candidates("see https://arxiv.org/abs/2401.12345");
//! assert_eq!(arxiv[0].identifier, "2401.12345");
//! ```

use super::*;

lazy_static! {
  static ref DOI_PATTERNS: Vec<(Regex, f64)> = vec![
    (Regex::new(r"(?i)\b10\.\d{4,}/[^\s\]]+").unwrap(), 1.0),
    (Regex::new(r"(?i)\bdoi\s*[:=]\s*(10\.\d{4,}/[^\s\]]+)").unwrap(), 0.95),
    (Regex::new(r"(?i)https?://(?:dx\.)?doi\.org/(10\.\d{4,}/[^\s\]]+)").unwrap(), 0.9),
    (Regex::new(r"(?i)[\[(]doi\s*[:=]?\s*(10\.\d{4,}/[^\s\])]+)[\])]").unwrap(), 0.8),
  ];
  static ref ARXIV_PATTERNS: Vec<(Regex, f64)> = vec![
    (Regex::new(r"(?i)\b(?:arXiv:)?(\d{4}\.\d{4,5}(?:v\d+)?)\b").unwrap(), 1.0),
    (Regex::new(r"(?i)\barxiv\s*[:=]\s*(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap(), 0.95),
    (Regex::new(r"(?i)https?://arxiv\.org/(?:abs|pdf)/(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap(), 0.9),
    (Regex::new(r"(?i)\b(?:arXiv:)?([a-z-]+(?:\.[A-Z]{2})?/\d{7})\b").unwrap(), 0.8),
    (
      Regex::new(r"(?i)https?://arxiv\.org/(?:abs|pdf)/([a-z-]+(?:\.[A-Z]{2})?/\d{7})").unwrap(),
      0.75,
    ),
  ];
  static ref DOI_TRAILING_PUNCTUATION: Regex = Regex::new(r"[.,;:\]]+$").unwrap();
  static ref ARXIV_NEW_FORMAT: Regex = Regex::new(r"^\d{4}\.\d{4,5}(?:v\d+)?$").unwrap();
  static ref ARXIV_OLD_FORMAT: Regex = Regex::new(r"^[a-z-]+(?:\.[A-Z]{2})?/\d{7}$").unwrap();
}

/// Shortest DOI candidate that is still considered plausible.
const MIN_DOI_LENGTH: usize = 7;

/// The family of identifier a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
  /// A Digital Object Identifier, `10.NNNN/suffix`
  Doi,
  /// An arXiv identifier, `YYMM.NNNNN[vN]` or `subject-class/YYMMnnn`
  Arxiv,
}

impl std::fmt::Display for IdentifierKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      IdentifierKind::Doi => write!(f, "DOI"),
      IdentifierKind::Arxiv => write!(f, "arXiv"),
    }
  }
}

/// A cleaned identifier candidate found in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierMatch {
  /// The cleaned identifier
  pub identifier: String,
  /// Which kind of identifier this is
  pub kind:       IdentifierKind,
  /// How specific the matching pattern was, in `[0, 1]`
  pub confidence: f64,
}

impl IdentifierMatch {
  /// Creates a match.
  pub fn new(identifier: impl Into<String>, kind: IdentifierKind, confidence: f64) -> Self {
    Self { identifier: identifier.into(), kind, confidence }
  }
}

/// Finds DOI candidates in `text`, most confident first, one entry per distinct DOI.
pub fn find_doi_candidates(text: &str) -> Vec<IdentifierMatch> {
  let matches = scan(text, &DOI_PATTERNS).filter_map(|(raw, confidence)| {
    let doi = clean_doi(raw);
    if is_plausible_doi(&doi) {
      trace!("Found DOI pattern '{doi}' with confidence {confidence:.2}");
      Some(IdentifierMatch::new(doi, IdentifierKind::Doi, confidence))
    } else {
      None
    }
  });
  deduplicate(matches)
}

/// Finds arXiv candidates in `text`, most confident first, one entry per distinct id.
///
/// Coarse pattern hits that fail [`is_valid_arxiv_format`] are discarded.
pub fn find_arxiv_candidates(text: &str) -> Vec<IdentifierMatch> {
  let matches = scan(text, &ARXIV_PATTERNS).filter_map(|(raw, confidence)| {
    let arxiv_id = raw.replace("arXiv:", "");
    let arxiv_id = arxiv_id.trim();
    if is_valid_arxiv_format(arxiv_id) {
      trace!("Found arXiv pattern '{arxiv_id}' with confidence {confidence:.2}");
      Some(IdentifierMatch::new(arxiv_id, IdentifierKind::Arxiv, confidence))
    } else {
      None
    }
  });
  deduplicate(matches)
}

/// Checks a bare arXiv identifier against the new (`2401.12345v1`) and old
/// (`hep-th/0345678`) formats. Matching is case sensitive.
///
/// ```
/// use paperorg::identifiers::is_valid_arxiv_format;
///
/// assert!(is_valid_arxiv_format("2401.12345v1"));
/// assert!(is_valid_arxiv_format("cs.AI/0123456"));
/// assert!(!is_valid_arxiv_format("123.456"));
/// ```
pub fn is_valid_arxiv_format(arxiv_id: &str) -> bool {
  ARXIV_NEW_FORMAT.is_match(arxiv_id) || ARXIV_OLD_FORMAT.is_match(arxiv_id)
}

/// Strips trailing sentence punctuation and any closing parenthesis left unbalanced by the
/// surrounding prose. Parentheses that belong to the DOI itself are kept.
fn clean_doi(raw: &str) -> String {
  let mut doi = raw.trim().to_string();
  loop {
    let stripped = DOI_TRAILING_PUNCTUATION.replace(&doi, "").into_owned();
    let opened = stripped.matches('(').count();
    let closed = stripped.matches(')').count();
    match stripped.strip_suffix(')') {
      Some(inner) if closed > opened => doi = inner.to_string(),
      _ => return stripped,
    }
  }
}

/// A DOI candidate is kept if it is long enough, has a suffix and the `10.` prefix.
fn is_plausible_doi(doi: &str) -> bool {
  doi.len() >= MIN_DOI_LENGTH && doi.contains('/') && doi.starts_with("10.")
}

/// Runs every pattern over the text, yielding the captured identifier (or the whole match
/// for patterns without a group) alongside the pattern confidence.
fn scan<'t>(
  text: &'t str,
  patterns: &'t [(Regex, f64)],
) -> impl Iterator<Item = (&'t str, f64)> + 't {
  patterns.iter().flat_map(move |(pattern, confidence)| {
    pattern.captures_iter(text).filter_map(move |captures| {
      captures.get(1).or_else(|| captures.get(0)).map(|m| (m.as_str(), *confidence))
    })
  })
}

/// Keeps the highest-confidence match per identifier, sorted by descending confidence.
/// Ties keep first-seen order.
fn deduplicate(matches: impl Iterator<Item = IdentifierMatch>) -> Vec<IdentifierMatch> {
  let mut unique: Vec<IdentifierMatch> = Vec::new();
  for candidate in matches {
    match unique.iter_mut().find(|existing| existing.identifier == candidate.identifier) {
      Some(existing) if candidate.confidence > existing.confidence => *existing = candidate,
      Some(_) => {},
      None => unique.push(candidate),
    }
  }
  unique.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
  unique
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_doi_with_prefix() {
    let matches = find_doi_candidates("This paper has DOI: 10.1234/example.doi and other content.");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "10.1234/example.doi");
    assert_eq!(matches[0].kind, IdentifierKind::Doi);
    assert!(matches[0].confidence > 0.8);
  }

  #[test]
  fn test_doi_url() {
    let matches = find_doi_candidates("Available at https://doi.org/10.5678/another.example for details.");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "10.5678/another.example");
  }

  #[test]
  fn test_doi_trailing_punctuation_is_stripped() {
    let matches = find_doi_candidates("Published as 10.1145/3313831.3376166.");
    assert_eq!(matches[0].identifier, "10.1145/3313831.3376166");

    let matches = find_doi_candidates("[10.1000/xyz123];");
    assert_eq!(matches[0].identifier, "10.1000/xyz123");
  }

  #[test]
  fn test_doi_in_parentheses() {
    let matches = find_doi_candidates("(doi:10.4321/paren.case)");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "10.4321/paren.case");
    assert_eq!(matches[0].confidence, 1.0);

    let matches = find_doi_candidates("as shown in (10.1234/abc.def).");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "10.1234/abc.def");
  }

  #[test]
  fn test_doi_keeps_balanced_parentheses() {
    let matches = find_doi_candidates("See 10.1002/(SICI)1097-4571(199806)49:8.");
    assert_eq!(matches[0].identifier, "10.1002/(SICI)1097-4571(199806)49:8");

    let matches = find_doi_candidates("(cited as 10.1002/(SICI)1097-4571(199806)49:8),");
    assert_eq!(matches[0].identifier, "10.1002/(SICI)1097-4571(199806)49:8");
    assert_eq!(matches[0].confidence, 1.0);
  }

  #[test]
  fn test_multiple_dois_sorted_and_distinct() {
    let text = "doi: 10.1111/first.one see also 10.2222/second.two and 10.1111/first.one";
    let matches = find_doi_candidates(text);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].identifier, "10.1111/first.one");
    assert_eq!(matches[1].identifier, "10.2222/second.two");
    assert!(matches.windows(2).all(|w| w[0].confidence >= w[1].confidence));
  }

  #[test]
  fn test_no_doi() {
    assert!(find_doi_candidates("This text contains no DOI identifiers at all.").is_empty());
    assert!(find_doi_candidates("version 10.12 of the tool").is_empty());
  }

  #[test]
  fn test_arxiv_new_format() {
    let matches = find_arxiv_candidates("arXiv:2401.12345v1 contains the research details.");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "2401.12345v1");
    assert_eq!(matches[0].kind, IdentifierKind::Arxiv);
    assert!(matches[0].confidence > 0.9);
  }

  #[test]
  fn test_arxiv_old_format() {
    let matches = find_arxiv_candidates("See cs.AI/0123456 for the original paper.");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "cs.AI/0123456");
  }

  #[test]
  fn test_arxiv_url() {
    let matches = find_arxiv_candidates("https://arxiv.org/abs/2401.12345 shows the results.");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "2401.12345");
  }

  #[test]
  fn test_arxiv_old_format_url() {
    let matches = find_arxiv_candidates("https://arxiv.org/abs/hep-th/0345678");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "hep-th/0345678");
    assert_eq!(matches[0].confidence, 0.8);
  }

  #[test]
  fn test_arxiv_case_sensitive_validation() {
    assert!(find_arxiv_candidates("CS.AI/0123456").is_empty());
  }

  #[test]
  fn test_arxiv_format_validation() {
    assert!(is_valid_arxiv_format("2401.12345"));
    assert!(is_valid_arxiv_format("2401.12345v1"));
    assert!(is_valid_arxiv_format("1234.5678v10"));
    assert!(is_valid_arxiv_format("math-ph/0234567"));
    assert!(is_valid_arxiv_format("hep-th/0345678"));
    assert!(!is_valid_arxiv_format("invalid"));
    assert!(!is_valid_arxiv_format("123.456"));
    assert!(!is_valid_arxiv_format("not-arxiv/123"));
  }
}
