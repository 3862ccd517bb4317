//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core services
//! behind an `Arc`. Nothing in the request path reads flags or environment variables.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    base_path: PathBuf,
    hidden_extensions: HiddenExtensions,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The base path must be an existing directory. It is canonicalised so the root node of the
    /// tree carries the directory's real name even when the operator passes `.`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the base path does not exist, is not a directory or
    /// cannot be canonicalised.
    pub fn new(base_path: &Path, hidden_extensions: HiddenExtensions) -> CoreResult<Self> {
        if !base_path.is_dir() {
            return Err(CoreError::InvalidInput(format!(
                "base path is not a directory: {}",
                base_path.display()
            )));
        }

        let base_path = base_path.canonicalize().map_err(|e| {
            CoreError::InvalidInput(format!(
                "cannot canonicalize base path {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(Self {
            base_path,
            hidden_extensions,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn hidden_extensions(&self) -> &HiddenExtensions {
        &self.hidden_extensions
    }
}

/// Set of file extensions excluded from the tree.
///
/// Extensions are stored lowercase without a leading dot, so `.SRT`, `srt` and `.srt` all
/// configure the same rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HiddenExtensions(Vec<String>);

impl HiddenExtensions {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalised: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !normalised.contains(&ext) {
                normalised.push(ext);
            }
        }
        Self(normalised)
    }

    /// Parse the comma-separated list accepted on the command line.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether an entry called `name` carries one of the hidden extensions.
    ///
    /// Only the text after the last dot counts, so `lesson.srt.txt` is not hidden by `srt`. A
    /// leading dot also starts an extension: `.srt` is hidden by `srt`.
    pub fn matches(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => {
                let ext = ext.to_lowercase();
                self.0.iter().any(|hidden| *hidden == ext)
            }
            _ => false,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where read-status records are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageMode {
    /// Records live for the lifetime of the process.
    Memory,
    /// Records persist in the SQLite file at the given path.
    File(PathBuf),
}

impl StorageMode {
    /// Resolve the mode from the `--db` kind and `--dbpath` flags.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if `kind` is neither `memory` nor `file`.
    pub fn from_flags(kind: &str, db_path: &Path) -> CoreResult<Self> {
        match kind.parse::<StorageKind>()? {
            StorageKind::Memory => Ok(Self::Memory),
            StorageKind::File => Ok(Self::File(db_path.to_path_buf())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StorageKind {
    Memory,
    File,
}

impl FromStr for StorageKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(CoreError::InvalidInput(format!(
                "unknown database type '{other}', expected 'memory' or 'file'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn hidden_extensions_are_normalised() {
        let hidden = HiddenExtensions::parse_list(".SRT, vtt,,.srt");
        assert_eq!(hidden.as_slice(), &["srt".to_string(), "vtt".to_string()]);
    }

    #[test]
    fn hidden_extension_matching_ignores_case_and_dot() {
        let hidden = HiddenExtensions::parse_list(".srt");
        assert!(hidden.matches("lesson.srt"));
        assert!(hidden.matches("LESSON.SRT"));
        assert!(!hidden.matches("lesson.mp4"));
        assert!(!hidden.matches("srt"));
        assert!(!hidden.matches("lesson.srt.txt"));
        assert!(!hidden.matches("lesson."));
    }

    #[test]
    fn hidden_extension_matching_covers_dotfiles() {
        let hidden = HiddenExtensions::parse_list(".srt,gitignore");
        assert!(hidden.matches(".srt"));
        assert!(hidden.matches(".gitignore"));
        assert!(!hidden.matches(".env"));
    }

    #[test]
    fn empty_hidden_list_hides_nothing() {
        let hidden = HiddenExtensions::parse_list("");
        assert!(hidden.is_empty());
        assert!(!hidden.matches("notes.txt"));
        assert!(!hidden.matches("README"));
    }

    #[test]
    fn config_rejects_missing_base_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let result = CoreConfig::new(&missing, HiddenExtensions::default());
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn config_rejects_file_base_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let result = CoreConfig::new(&file, HiddenExtensions::default());
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn config_canonicalises_base_path() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("course");
        std::fs::create_dir(&nested).unwrap();
        let cfg = CoreConfig::new(&nested.join("."), HiddenExtensions::default()).unwrap();
        assert_eq!(cfg.base_path(), nested.canonicalize().unwrap());
    }

    #[test]
    fn storage_mode_from_flags() {
        let path = Path::new("content.db");
        assert_eq!(
            StorageMode::from_flags("memory", path).unwrap(),
            StorageMode::Memory
        );
        assert_eq!(
            StorageMode::from_flags("FILE", path).unwrap(),
            StorageMode::File(PathBuf::from("content.db"))
        );
        assert!(matches!(
            StorageMode::from_flags("postgres", path),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
