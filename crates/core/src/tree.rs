//! File tree construction.
//!
//! [`TreeService`] walks the configured base directory and produces a fresh [`FileNode`] tree
//! for every query. Entries whose name carries a hidden extension are dropped while listing, so
//! a hidden directory is skipped together with everything below it and nothing inside it is
//! ever statted.
//!
//! Only a failure on the requested entry itself reaches the caller. Below it, a child that cannot
//! be statted or listed (vanished, unreadable, a symlink loop) is skipped with a warning and the
//! rest of the tree is still returned.

use crate::paths::RelativePath;
use crate::{CoreConfig, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;

/// One entry of the served tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Base name of the entry.
    pub name: String,
    /// Slash-separated path relative to the base directory. The root carries its own name.
    pub path: String,
    pub is_dir: bool,
    /// Visible children, sorted by name. Omitted from JSON when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(FileNode::node_count).sum::<usize>()
    }

    /// Depth-first iterator over this subtree, `self` first.
    pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Builds [`FileNode`] trees from the base directory.
#[derive(Clone, Debug)]
pub struct TreeService {
    cfg: Arc<CoreConfig>,
}

impl TreeService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Build the whole tree rooted at the base directory.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Stat` or `CoreError::ReadDir` if the base directory or one of its
    /// descendants cannot be inspected.
    pub fn build(&self) -> CoreResult<FileNode> {
        self.build_at(&RelativePath::root())?
            .ok_or_else(|| CoreError::NotFound("base directory is hidden".into()))
    }

    /// Build the subtree at `relative`.
    ///
    /// Returns `Ok(None)` when the entry is a file with a hidden extension.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Stat` if the entry itself cannot be statted and `CoreError::ReadDir` if
    /// it is a directory that cannot be listed. Descendants that fail either way are left out.
    pub fn build_at(&self, relative: &RelativePath) -> CoreResult<Option<FileNode>> {
        let full_path = relative.to_fs_path(self.cfg.base_path());
        let metadata = fs::metadata(&full_path).map_err(|source| CoreError::Stat {
            path: full_path.clone(),
            source,
        })?;

        let name = if relative.is_root() {
            root_name(self.cfg.base_path())
        } else {
            full_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        if !metadata.is_dir() && self.cfg.hidden_extensions().matches(&name) {
            return Ok(None);
        }

        let path = if relative.is_root() {
            name.clone()
        } else {
            relative.to_string()
        };

        let mut node = FileNode {
            name,
            path,
            is_dir: metadata.is_dir(),
            children: Vec::new(),
        };

        if !node.is_dir {
            return Ok(Some(node));
        }

        let entries = fs::read_dir(&full_path).map_err(|source| CoreError::ReadDir {
            path: full_path.clone(),
            source,
        })?;

        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CoreError::ReadDir {
                path: full_path.clone(),
                source,
            })?;
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            if !self.cfg.hidden_extensions().matches(&entry_name) {
                names.push(entry_name);
            }
        }
        names.sort();

        for entry_name in names {
            let child_path = relative.child(&entry_name);
            match self.build_at(&child_path) {
                Ok(Some(child)) => node.children.push(child),
                Ok(None) => {}
                Err(CoreError::Stat { source, .. }) if source.kind() == ErrorKind::NotFound => {
                    tracing::warn!("entry vanished while building tree: {}", child_path);
                }
                Err(e @ (CoreError::Stat { .. } | CoreError::ReadDir { .. })) => {
                    tracing::warn!("skipping {} while building tree: {}", child_path, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Some(node))
    }
}

fn root_name(base: &std::path::Path) -> String {
    base.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.display().to_string())
}
