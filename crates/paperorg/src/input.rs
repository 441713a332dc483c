//! Classifying what the user asked to organize.
//!
//! ```no_run
//! use paperorg::input::{detect_input_type, pdf_files_in, InputKind};
//!
//! # fn example() -> Result<(), paperorg::errors::OrganizeError> {
//! match detect_input_type("~/Downloads")? {
//!   InputKind::Directory => println!("{} PDFs", pdf_files_in("~/Downloads".as_ref())?.len()),
//!   kind => println!("{kind}"),
//! }
//! # Ok(())
//! # }
//! ```

use glob::Pattern;

use super::*;

/// What kind of input an argument refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
  /// An `http(s)://` URL to download
  Url,
  /// A local PDF file
  File,
  /// A local directory of PDFs
  Directory,
}

impl std::fmt::Display for InputKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      InputKind::Url => write!(f, "url"),
      InputKind::File => write!(f, "file"),
      InputKind::Directory => write!(f, "directory"),
    }
  }
}

/// Decides whether `input` is a URL, a PDF file or a directory.
///
/// URLs must have a host; files must have a `.pdf` extension (any case). Anything else,
/// including paths that do not exist, is a validation error.
pub fn detect_input_type(input: &str) -> Result<InputKind> {
  if input.starts_with("http://") || input.starts_with("https://") {
    let has_host = url::Url::parse(input)
      .is_ok_and(|url| url.host_str().is_some_and(|host| !host.is_empty()));
    if !has_host {
      return Err(OrganizeError::Validation(format!("Invalid URL: {input}")));
    }
    return Ok(InputKind::Url);
  }

  let path = Path::new(input);
  if path.is_file() {
    let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
      return Err(OrganizeError::Validation(format!("File must be a PDF: {input}")));
    }
    return Ok(InputKind::File);
  }
  if path.is_dir() {
    return Ok(InputKind::Directory);
  }

  Err(OrganizeError::Validation(format!("Invalid input: {input}")))
}

/// The `*.pdf` files directly inside `dir`, sorted by path.
///
/// Fails when there are none.
pub fn pdf_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
  let pattern = Path::new(&Pattern::escape(&dir.to_string_lossy())).join("*.pdf");
  let mut files = glob::glob(&pattern.to_string_lossy())?
    .map(|entry| entry.map_err(|e| OrganizeError::Path(e.into())))
    .collect::<Result<Vec<_>>>()?;
  files.retain(|path| path.is_file());
  files.sort();

  if files.is_empty() {
    return Err(OrganizeError::Validation(format!(
      "No PDF files found in directory: {}",
      dir.display()
    )));
  }
  trace!("Found {} PDF files in {}", files.len(), dir.display());
  Ok(files)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn test_urls() {
    assert_eq!(detect_input_type("https://arxiv.org/pdf/2301.07041").unwrap(), InputKind::Url);
    assert_eq!(detect_input_type("http://example.org/a.pdf").unwrap(), InputKind::Url);
    assert!(matches!(detect_input_type("https://"), Err(OrganizeError::Validation(_))));
  }

  #[test]
  fn test_files_and_directories() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let pdf = dir.path().join("Paper.PDF");
    let text = dir.path().join("notes.txt");
    fs::write(&pdf, b"%PDF")?;
    fs::write(&text, b"notes")?;

    assert_eq!(detect_input_type(&pdf.to_string_lossy())?, InputKind::File);
    assert_eq!(detect_input_type(&dir.path().to_string_lossy())?, InputKind::Directory);

    let error = detect_input_type(&text.to_string_lossy()).unwrap_err();
    assert!(error.to_string().starts_with("File must be a PDF"));
    let error = detect_input_type(&dir.path().join("missing.pdf").to_string_lossy()).unwrap_err();
    assert!(error.to_string().starts_with("Invalid input"));
    Ok(())
  }

  #[test]
  fn test_pdf_files_sorted() -> anyhow::Result<()> {
    let dir = tempdir()?;
    for name in ["b.pdf", "a.pdf", "c.txt", "d.pdf"] {
      fs::write(dir.path().join(name), b"")?;
    }
    fs::create_dir(dir.path().join("nested.pdf"))?;

    let files = pdf_files_in(dir.path())?;
    let names: Vec<_> = files.iter().filter_map(|path| path.file_name()?.to_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf", "d.pdf"]);
    Ok(())
  }

  #[test]
  fn test_directory_without_pdfs() -> anyhow::Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("readme.md"), b"")?;

    let error = pdf_files_in(dir.path()).unwrap_err();
    assert!(error.to_string().starts_with("No PDF files found in directory"));
    Ok(())
  }

  #[test]
  fn test_directory_with_glob_characters() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let odd = dir.path().join("papers [draft]");
    fs::create_dir(&odd)?;
    fs::write(odd.join("x.pdf"), b"")?;

    assert_eq!(pdf_files_in(&odd)?, vec![odd.join("x.pdf")]);
    Ok(())
  }
}
