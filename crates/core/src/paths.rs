//! Relative content paths.
//!
//! Paths arriving from URLs are attacker-controlled. Everything that turns one into a filesystem
//! location goes through [`RelativePath::parse`], which only admits plain descendants of the base
//! directory. This module performs no I/O.

use crate::{CoreError, CoreResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A validated, slash-separated path below the base directory.
///
/// The empty path denotes the base directory itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelativePath(String);

impl RelativePath {
    /// The base directory.
    pub fn root() -> Self {
        Self::default()
    }

    /// Validate a relative path.
    ///
    /// `.` segments and empty segments (`a//b`) are dropped. Backslashes are treated as
    /// separators so Windows-style input cannot smuggle `..` past the check.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPath` for absolute paths, drive or root prefixes and any `..`
    /// segment.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let unified = raw.replace('\\', "/");
        if unified.starts_with('/') {
            return Err(CoreError::InvalidPath("absolute paths are not allowed".into()));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(CoreError::InvalidPath(
                        "parent directory segments are not allowed".into(),
                    ))
                }
                _ => {}
            }

            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => segments.push(segment),
                _ => {
                    return Err(CoreError::InvalidPath(
                        "path segment is not a plain name".into(),
                    ))
                }
            }
        }

        Ok(Self(segments.join("/")))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the entry called `name` inside this directory.
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Absolute location of this path under `base`.
    pub fn to_fs_path(&self, base: &Path) -> PathBuf {
        let mut full = base.to_path_buf();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        full
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
