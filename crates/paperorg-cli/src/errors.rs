//! Error types for the paper-organize CLI.
//!
//! Library errors pass through unchanged so their message reaches the user as is. Only the
//! destination directory setup adds its own variant, which carries a hint on how to pick a
//! writable location.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a CLI run.
///
/// # Examples
///
/// ```ignore
/// # fn example() -> Result<(), CliError> {
/// // File operations may result in IO errors
/// std::fs::create_dir_all("some/path")?;
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum CliError {
  /// Errors from the underlying paperorg library
  #[error(transparent)]
  Organize(#[from] paperorg::errors::OrganizeError),

  /// The destination directory could not be created
  #[error(
    "Cannot create directory '{}': {source}\n  Set PAPERS_DIR or use --dir to specify a writable \
     location",
    path.display()
  )]
  Directory {
    /// Directory that was being created
    path:   PathBuf,
    /// Underlying IO failure
    source: std::io::Error,
  },

  /// File system and IO operation errors
  #[error(transparent)]
  IO(#[from] std::io::Error),
}
