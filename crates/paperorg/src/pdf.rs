//! Embedded document properties of a PDF.
//!
//! PDF files carry an optional `Info` dictionary in their trailer with entries such as
//! `Title`, `Author` and `CreationDate`. Producers fill it inconsistently, so every value is
//! optional and the helpers here are lenient about what they accept.
//!
//! ```no_run
//! use paperorg::pdf::{parse_authors, LopdfPropertyReader, PropertyReader};
//!
//! # fn example() -> Result<(), paperorg::errors::OrganizeError> {
//! let properties = LopdfPropertyReader.read_properties("paper.pdf".as_ref())?;
//! if let Some(author) = properties.author.as_deref() {
//!   println!("{:?}", parse_authors(author));
//! }
//! # Ok(())
//! # }
//! ```

use lopdf::{Dictionary, Document, Object};

use super::*;

lazy_static! {
  static ref AUTHOR_SEPARATOR: Regex = Regex::new(r",|;| and ").unwrap();
  static ref PDF_DATE_YEAR: Regex = Regex::new(r"D:(\d{4})").unwrap();
}

/// The subset of a PDF's document information dictionary used for naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfProperties {
  /// `Title` entry
  pub title:             Option<String>,
  /// `Author` entry, often several names in one string
  pub author:            Option<String>,
  /// `CreationDate` entry, usually `D:YYYYMMDDHHmmSS...`
  pub creation_date:     Option<String>,
  /// `ModDate` entry
  pub modification_date: Option<String>,
}

/// Source of embedded document properties.
///
/// The extractor only depends on this trait, so tests and callers can substitute their own
/// reader for the lopdf one.
pub trait PropertyReader: Send + Sync {
  /// Reads the document properties of the PDF at `path`.
  fn read_properties(&self, path: &Path) -> Result<PdfProperties>;
}

/// [`PropertyReader`] backed by [`lopdf`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfPropertyReader;

impl PropertyReader for LopdfPropertyReader {
  fn read_properties(&self, path: &Path) -> Result<PdfProperties> {
    let doc = Document::load(path)?;
    let Some(info) = info_dictionary(&doc)? else {
      trace!("{} has no Info dictionary", path.display());
      return Ok(PdfProperties::default());
    };

    Ok(PdfProperties {
      title:             text_entry(&doc, info, "Title"),
      author:            text_entry(&doc, info, "Author"),
      creation_date:     text_entry(&doc, info, "CreationDate"),
      modification_date: text_entry(&doc, info, "ModDate"),
    })
  }
}

/// Resolves the trailer's `Info` entry, which may be inline or an indirect reference.
fn info_dictionary(doc: &Document) -> Result<Option<&Dictionary>> {
  let Ok(info) = doc.trailer.get(b"Info") else {
    return Ok(None);
  };
  let (_, info) = doc.dereference(info)?;
  Ok(info.as_dict().ok())
}

/// Reads a text string entry, decoding UTF-16BE when the value carries a byte order mark.
fn text_entry(doc: &Document, dict: &Dictionary, key: &str) -> Option<String> {
  let (_, object) = doc.dereference(dict.get(key.as_bytes()).ok()?).ok()?;
  let bytes = match object {
    Object::String(bytes, _) => bytes.as_slice(),
    Object::Name(bytes) => bytes.as_slice(),
    _ => return None,
  };
  let text = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
    let (text, ..) = encoding_rs::UTF_16BE.decode(utf16);
    text.into_owned()
  } else {
    String::from_utf8_lossy(bytes).into_owned()
  };
  let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
  (!text.is_empty()).then(|| text.to_string())
}

/// Splits an `Author` property into individual names.
///
/// Names are separated by `,`, `;` or ` and `; blank pieces are dropped.
///
/// ```
/// use paperorg::pdf::parse_authors;
///
/// assert_eq!(parse_authors("Alice Smith and Bob Jones; Carol White"), vec![
///   "Alice Smith",
///   "Bob Jones",
///   "Carol White"
/// ]);
/// ```
pub fn parse_authors(author: &str) -> Vec<String> {
  AUTHOR_SEPARATOR
    .split(author)
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(String::from)
    .collect()
}

/// Reads the year out of a PDF date string (`D:YYYYMMDD...`) if it is a plausible
/// publication year.
///
/// ```
/// use paperorg::pdf::year_from_pdf_date;
///
/// assert_eq!(year_from_pdf_date("D:20230115120000Z"), Some(2023));
/// assert_eq!(year_from_pdf_date("D:18500101"), None);
/// assert_eq!(year_from_pdf_date("2023-01-15"), None);
/// ```
pub fn year_from_pdf_date(date: &str) -> Option<i32> {
  let year = PDF_DATE_YEAR.captures(date)?.get(1)?.as_str().parse().ok()?;
  paper::is_plausible_year(year).then_some(year)
}
