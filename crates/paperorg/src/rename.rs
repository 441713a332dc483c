//! Collision-safe renaming.
//!
//! A rename never replaces an unrelated file: when the desired name is taken, `_1`, `_2`, ...
//! is inserted before the extension until a free name is found. The name is claimed with a
//! hard link, so a file that appears between the check and the move is not clobbered.
//!
//! ```no_run
//! use paperorg::{extract::MetadataExtractor, rename::apply_metadata_naming};
//!
//! # async fn example() -> Result<(), paperorg::errors::OrganizeError> {
//! let extractor = MetadataExtractor::default();
//! let renamed = apply_metadata_naming(&extractor, "Papers/2301.07041.pdf").await?;
//! println!("Now at {}", renamed.display());
//! # Ok(())
//! # }
//! ```

use std::{fs, io};

use super::*;
use crate::{extract::MetadataExtractor, format::generate_filename};

/// The first free path in `dir` for `name`, appending `_1`, `_2`, ... to the stem as needed.
///
/// `source` is the file about to be moved there; finding it at a candidate path does not
/// count as a collision.
pub fn unique_destination(dir: &Path, name: &str, source: Option<&Path>) -> PathBuf {
  let desired = Path::new(name);
  let stem = desired.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
  let suffix =
    desired.extension().map(|ext| format!(".{}", ext.to_string_lossy())).unwrap_or_default();

  let mut candidate = dir.join(name);
  let mut counter = 1;
  while is_taken(&candidate) && Some(candidate.as_path()) != source {
    candidate = dir.join(format!("{stem}_{counter}{suffix}"));
    counter += 1;
  }
  candidate
}

/// Whether anything, including a dangling symlink, occupies `path`.
fn is_taken(path: &Path) -> bool { fs::symlink_metadata(path).is_ok() }

/// Renames `path` to `desired_name` in the same directory, suffixing the name when another
/// file already has it.
///
/// Returns the final path, which is `path` itself when it already has the desired name.
pub fn rename_with_conflict_resolution(path: &Path, desired_name: &str) -> Result<PathBuf> {
  let dir = path.parent().unwrap_or_else(|| Path::new(""));
  loop {
    let destination = unique_destination(dir, desired_name, Some(path));
    if destination == path {
      return Ok(destination);
    }

    if claim(path, &destination).map_err(|e| OrganizeError::file_system(path, e))? {
      debug!("Renamed {} to {}", path.display(), destination.display());
      return Ok(destination);
    }
    trace!("{} was taken before the rename, trying the next name", destination.display());
  }
}

/// Moves `path` to `destination` unless something already exists there.
///
/// Returns `Ok(false)` when the name is taken. On filesystems without hard links this falls
/// back to an existence check followed by a plain rename, which is not atomic.
fn claim(path: &Path, destination: &Path) -> io::Result<bool> {
  match fs::hard_link(path, destination) {
    Ok(()) => fs::remove_file(path).map(|()| true),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
    Err(e)
      if matches!(e.kind(), io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied)
        && path.exists() =>
    {
      debug!("Hard links unavailable ({e}), falling back to rename");
      if is_taken(destination) {
        return Ok(false);
      }
      fs::rename(path, destination).map(|()| true)
    },
    Err(e) => Err(e),
  }
}

/// Extracts metadata from the PDF at `path` and renames it after it.
///
/// The file stays where it is when no better name can be generated.
pub async fn apply_metadata_naming(
  extractor: &MetadataExtractor,
  path: impl AsRef<Path>,
) -> Result<PathBuf> {
  let path = path.as_ref();
  let current = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .ok_or_else(|| OrganizeError::Validation(format!("Not a file path: {}", path.display())))?;

  let metadata = extractor.extract(path).await;
  let new_name = generate_filename(&metadata, &current);
  if new_name == current {
    debug!("Keeping {current}, no better name found");
    return Ok(path.to_path_buf());
  }

  rename_with_conflict_resolution(path, &new_name)
}
