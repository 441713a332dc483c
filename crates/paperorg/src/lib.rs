//! A library for turning academic PDFs into well-named files.
//!
//! `paperorg` reads what it can from a paper, fills the gaps from bibliographic services and
//! synthesizes a filesystem-safe name of the form `Author_Year_Title.pdf`:
//!
//! - Embedded document properties (title, author, creation date) via [`pdf`]
//! - Plain text of the first pages via the extraction chain in [`text`]
//! - DOI and arXiv identifiers mined from that text via [`identifiers`]
//! - Enrichment from the arXiv and CrossRef APIs via [`clients`]
//! - Filename synthesis in [`format`] and collision-safe renaming in [`rename`]
//!
//! Extraction never fails a paper: the worst case is an empty [`PaperMetadata`], which makes
//! [`format::generate_filename`] hand back the original name.
//!
//! # Example
//! ```rust,no_run
//! use paperorg::{extract::MetadataExtractor, format::generate_filename};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let extractor = MetadataExtractor::default();
//!   let metadata = extractor.extract("downloads/2301.07041.pdf").await;
//!   println!("{}", generate_filename(&metadata, "2301.07041.pdf"));
//!
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]
use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod clients;
pub mod config;
pub mod download;
pub mod errors;
pub mod extract;
pub mod format;
pub mod identifiers;
pub mod input;
pub mod paper;
pub mod pdf;
pub mod rename;
pub mod text;
#[cfg(test)] mod tests;

use clients::{arxiv::ArxivClient, crossref::CrossRefClient};
use config::{ClientConfig, ExtractionConfig};
use errors::{OrganizeError, Result};
use paper::{Bibliographic, PaperMetadata};

/// Common types for ergonomic imports.
///
/// ```no_run
/// use paperorg::prelude::*;
///
/// # async fn example() -> Result<(), OrganizeError> {
/// let metadata = extract_pdf_metadata("paper.pdf").await;
/// let name = generate_filename(&metadata, "paper.pdf");
/// # Ok(())
/// # }
/// ```
pub mod prelude {
  pub use crate::{
    errors::OrganizeError,
    extract::{extract_pdf_metadata, MetadataExtractor},
    format::generate_filename,
    paper::PaperMetadata,
    rename::{apply_metadata_naming, rename_with_conflict_resolution},
  };
}
