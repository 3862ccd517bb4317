//! # CourseViewer Core
//!
//! Core logic for browsing a directory of course content.
//!
//! This crate contains the pure filesystem and storage operations:
//! - Building the navigable file tree with hidden-extension filtering (`tree`)
//! - Opening content and planning single byte ranges for streaming (`content`)
//! - Persisting read status with last-read-wins queries (`read_status`)
//!
//! **No API concerns**: HTTP routing, static assets and flag parsing belong in `api-rest` and the
//! binaries. Every call here is synchronous and blocks the calling thread.

pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod paths;
pub mod read_status;
pub mod tree;

pub use config::{CoreConfig, HiddenExtensions, StorageMode};
pub use content::{ByteRange, Content, ContentService};
pub use error::{CoreError, CoreResult};
pub use paths::RelativePath;
pub use read_status::{ReadStatusRecord, ReadStatusStore};
pub use tree::{FileNode, TreeService};
