//! Mapping URLs onto the local directory tree.
//!
//! `http://host/a/b/c.png?x=1` lands at `<base>/a/b/c.png`: the scheme and host
//! (the first three `/`-delimited segments) are dropped and the rest of the
//! path is mirrored below the base directory.

use crate::error::TransferError;

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name used for empty intermediate segments such as the middle of `a//b`.
pub const EMPTY_SEGMENT: &str = "null";

/// The path part of a URL, split into directories and a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPath {
    /// Directory segments below the host.
    pub dirs: Vec<String>,
    /// Last segment, still carrying the `?query` suffix when the URL has one.
    pub file: String,
}

impl UrlPath {
    /// Split `url` into its directory chain and file name.
    ///
    /// ```rust
    /// use treefetch::transfer::UrlPath;
    ///
    /// let path = UrlPath::parse("http://h/img//a.png?v=2").unwrap();
    /// assert_eq!(path.dirs, vec!["img", "null"]);
    /// assert_eq!(path.file, "a.png?v=2");
    /// ```
    pub fn parse(url: &str) -> Result<Self, TransferError> {
        let invalid = |reason: &str| {
            TransferError::filesystem(url, io::Error::new(io::ErrorKind::InvalidInput, reason.to_string()))
        };

        let without_fragment = url.split('#').next().unwrap_or_default();
        let (path_part, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let mut segments: Vec<&str> = path_part.split('/').skip(3).collect();
        let file = match segments.pop() {
            Some(file) if !file.is_empty() => file,
            _ => return Err(invalid("URL has no file name")),
        };
        if is_traversal(file) {
            return Err(invalid("URL file name is not a plain name"));
        }

        let mut dirs = Vec::with_capacity(segments.len());
        for segment in segments {
            if is_traversal(segment) {
                return Err(invalid("URL path contains `.` or `..` segments"));
            }
            dirs.push(match segment {
                "" => EMPTY_SEGMENT.to_string(),
                other => other.to_string(),
            });
        }

        let file = match query {
            // A `/` inside the query must not turn into a directory.
            Some(query) => format!("{}?{}", file, query.replace('/', "%2F")),
            None => file.to_string(),
        };

        Ok(Self { dirs, file })
    }

    /// Path relative to the base directory.
    pub fn relative(&self) -> PathBuf {
        self.dirs.iter().chain(std::iter::once(&self.file)).collect()
    }
}

fn is_traversal(segment: &str) -> bool {
    segment == "." || segment == ".."
}

/// Drop a `?query` suffix from the file name of `path`.
///
/// ```rust
/// use std::path::Path;
/// use treefetch::transfer::strip_query;
///
/// assert_eq!(strip_query(Path::new("/out/a/b.png?x=1")), Path::new("/out/a/b.png"));
/// assert_eq!(strip_query(Path::new("/out/a/b.png")), Path::new("/out/a/b.png"));
/// ```
pub fn strip_query(path: &Path) -> PathBuf {
    let file_name = path.file_name().and_then(|name| name.to_str());
    match file_name.and_then(|name| name.split_once('?')) {
        Some((stem, _)) if !stem.is_empty() => path.with_file_name(stem),
        _ => path.to_path_buf(),
    }
}

/// Make sure every directory of `dirs` exists below `base`, returning the
/// innermost one.
///
/// Missing directories are created. An existing non-directory in the chain is
/// left untouched unless `clear` is set, in which case it is replaced by a
/// directory.
pub async fn ensure_dirs(base: &Path, dirs: &[String], clear: bool) -> Result<PathBuf, TransferError> {
    let mut current = base.to_path_buf();
    for dir in dirs {
        current.push(dir);
        match fs::metadata(&current).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) if clear => {
                debug!("Replacing file {:?} with a directory", &current);
                fs::remove_file(&current)
                    .await
                    .map_err(|e| TransferError::filesystem(&current, e))?;
                create_dir(&current).await?;
            }
            Ok(_) => {
                debug!("Leaving non-directory {:?} in place", &current);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Creating directory {:?}", &current);
                create_dir(&current).await?;
            }
            Err(e) => return Err(TransferError::filesystem(&current, e)),
        }
    }
    Ok(current)
}

async fn create_dir(path: &Path) -> Result<(), TransferError> {
    match fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(TransferError::filesystem(path, e)),
    }
}
