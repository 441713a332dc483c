//! Processors for the three kinds of input: URLs, single PDFs and directories of PDFs.
//!
//! Every processor ends with the PDF inside the destination directory and, unless disabled,
//! renamed after its metadata. Naming problems are reported and never fail a run.

use std::{
  fmt::Display,
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use console::style;
use paperorg::{
  download::Downloader,
  extract::MetadataExtractor,
  input::{pdf_files_in, InputKind},
  rename::{apply_metadata_naming, unique_destination},
};
use tracing::{debug, trace};

use crate::errors::CliError;

/// What happened to one PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
  /// Where the PDF came from (the download target for URLs)
  pub original_path:  PathBuf,
  /// Where the PDF ended up
  pub final_path:     PathBuf,
  /// Whether the PDF was fetched from the network
  pub was_downloaded: bool,
  /// Whether metadata naming changed the file name
  pub was_renamed:    bool,
}

/// Settings and collaborators shared by all processors for one run.
#[derive(Debug)]
pub struct Context {
  /// Directory the organized PDFs end up in
  pub destination: PathBuf,
  /// Fixed file name given with `--name`
  pub custom_name: Option<String>,
  /// Whether to rename PDFs after their metadata
  pub auto_name:   bool,
  /// Suppresses progress output
  pub quiet:       bool,
  /// Metadata pipeline, shared so API rate limits hold across a batch
  pub extractor:   MetadataExtractor,
  /// HTTP transport for URL inputs
  pub downloader:  Downloader,
}

impl Context {
  /// Prints a progress line unless quiet.
  fn say(&self, line: impl Display) {
    if !self.quiet {
      println!("{line}");
    }
  }

  /// Renames `path` after its metadata unless auto naming is off or the user picked the
  /// name.
  ///
  /// Returns the final path; on failure a warning is printed and `path` is kept.
  async fn name_by_metadata(&self, path: &Path, custom_name: Option<&str>) -> PathBuf {
    if !self.auto_name || custom_name.is_some() {
      return path.to_path_buf();
    }

    match apply_metadata_naming(&self.extractor, path).await {
      Ok(renamed) => {
        if renamed != path {
          let name = renamed.file_name().unwrap_or_default().to_string_lossy();
          self.say(format!("{} Renamed to: {name}", style("✓").green()));
        }
        renamed
      },
      Err(e) => {
        if !self.quiet {
          eprintln!("{} Could not extract metadata: {e}", style("⚠").yellow());
        }
        path.to_path_buf()
      },
    }
  }
}

/// Turns one input argument into organized PDFs.
#[async_trait]
pub trait InputProcessor: Send + Sync {
  /// Processes `input`, returning one result per PDF handled.
  async fn process(&self, input: &str, context: &Context)
    -> Result<Vec<ProcessingResult>, CliError>;
}

/// The processor responsible for `kind`.
pub fn processor_for(kind: InputKind) -> Box<dyn InputProcessor> {
  match kind {
    InputKind::Url => Box::new(UrlProcessor),
    InputKind::File => Box::new(FileProcessor),
    InputKind::Directory => Box::new(DirectoryProcessor),
  }
}

/// Downloads a PDF into the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlProcessor;

#[async_trait]
impl InputProcessor for UrlProcessor {
  async fn process(
    &self,
    input: &str,
    context: &Context,
  ) -> Result<Vec<ProcessingResult>, CliError> {
    context.say(format!("{} Downloading from URL: {input}", style("→").cyan()));

    let filename = match &context.custom_name {
      Some(name) => with_pdf_extension(name),
      None => {
        let info = match context.downloader.get_download_info(input).await {
          Ok(info) => Some(info),
          Err(e) => {
            debug!("HEAD request for {input} failed: {e}");
            None
          },
        };
        download_filename(input, info)
      },
    };

    let target = unique_destination(&context.destination, &filename, None);
    let bytes = context.downloader.download_file(input, &target).await?;
    trace!("Downloaded {bytes} bytes");
    context.say(format!("{} Downloaded to: {}", style("✓").green(), target.display()));

    let final_path = context.name_by_metadata(&target, context.custom_name.as_deref()).await;
    Ok(vec![ProcessingResult {
      was_renamed: final_path != target,
      original_path: target,
      final_path,
      was_downloaded: true,
    }])
  }
}

/// Copies an existing PDF into the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileProcessor;

#[async_trait]
impl InputProcessor for FileProcessor {
  async fn process(
    &self,
    input: &str,
    context: &Context,
  ) -> Result<Vec<ProcessingResult>, CliError> {
    Ok(vec![self.organize(Path::new(input), context.custom_name.as_deref(), context).await?])
  }
}

impl FileProcessor {
  /// Places `source` in the destination under `custom_name` or its own name, then names it
  /// by metadata.
  async fn organize(
    &self,
    source: &Path,
    custom_name: Option<&str>,
    context: &Context,
  ) -> Result<ProcessingResult, CliError> {
    context.say(format!("{} Processing existing file: {}", style("→").cyan(), source.display()));

    let current_name = source.file_name().unwrap_or_default().to_string_lossy().into_owned();
    let filename = custom_name.map_or(current_name.clone(), with_pdf_extension);

    let placed = if filename == current_name && same_directory(source, &context.destination) {
      source.to_path_buf()
    } else {
      let destination = unique_destination(&context.destination, &filename, Some(source));
      tokio::fs::copy(source, &destination)
        .await
        .map_err(|e| paperorg::errors::OrganizeError::file_system(&destination, e))?;
      context.say(format!("{} Copied to: {}", style("✓").green(), destination.display()));
      destination
    };

    let final_path = context.name_by_metadata(&placed, custom_name).await;
    Ok(ProcessingResult {
      original_path: source.to_path_buf(),
      was_renamed: final_path != placed,
      final_path,
      was_downloaded: false,
    })
  }
}

/// Runs every PDF of a directory through the [`FileProcessor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryProcessor;

#[async_trait]
impl InputProcessor for DirectoryProcessor {
  async fn process(
    &self,
    input: &str,
    context: &Context,
  ) -> Result<Vec<ProcessingResult>, CliError> {
    let dir = Path::new(input);
    let files = pdf_files_in(dir)?;
    context.say(format!("{} Processing directory: {}", style("→").cyan(), dir.display()));
    context.say(format!("Found {} PDF files", files.len()));

    let mut results = Vec::with_capacity(files.len());
    for file in files {
      let name = file.file_name().unwrap_or_default().to_string_lossy();
      context.say(format!("\n  Processing: {name}"));
      // --name is ignored for a batch
      results.push(FileProcessor.organize(&file, None, context).await?);
    }

    context.say(format!("\n{} Processed {} files", style("✓").green(), results.len()));
    Ok(results)
  }
}

/// Appends `.pdf` unless `name` already ends with it.
fn with_pdf_extension(name: &str) -> String {
  if name.ends_with(".pdf") {
    name.to_string()
  } else {
    format!("{name}.pdf")
  }
}

/// Picks the local file name for a download.
///
/// `info` is the HEAD request result: the server's suggested file name and whether it
/// reported PDF content. The server's name wins when it reports a PDF, then the last URL
/// path segment, then `paper.pdf`.
fn download_filename(url: &str, info: Option<(Option<String>, bool)>) -> String {
  if let Some((Some(suggested), true)) = &info {
    return with_pdf_extension(suggested);
  }

  url::Url::parse(url)
    .ok()
    .and_then(|url| url.path_segments()?.last().map(str::to_string))
    .filter(|segment| !segment.is_empty())
    .map_or_else(|| "paper.pdf".to_string(), |segment| with_pdf_extension(&segment))
}

/// Whether `file` lives directly inside `dir`.
fn same_directory(file: &Path, dir: &Path) -> bool {
  let parent = match file.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  match (parent.canonicalize(), dir.canonicalize()) {
    (Ok(a), Ok(b)) => a == b,
    _ => parent == dir,
  }
}
