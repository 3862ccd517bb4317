//! Constants used throughout the CourseViewer core crate.
//!
//! Defaults for the configuration surface, the content-type table and the read-status schema
//! live here so the server, CLI and tests agree on them.

/// Base directory served when no explicit path is configured.
pub const DEFAULT_BASE_PATH: &str = ".";

/// Hidden extensions applied when the operator does not pass any.
pub const DEFAULT_HIDDEN_EXTENSIONS: &str = ".srt";

/// SQLite file used for file-backed read-status storage.
pub const DEFAULT_DB_PATH: &str = "content.db";

/// Port the server listens on by default.
pub const DEFAULT_PORT: u16 = 8080;

/// Directory holding `static/` and `templates/` for the browser UI.
pub const DEFAULT_WEB_ROOT: &str = "web";

/// Fallback MIME type for extensions missing from [`CONTENT_TYPES`].
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension (lowercase, no dot) to MIME type. Text types are always UTF-8.
pub const CONTENT_TYPES: &[(&str, &str)] = &[
    ("md", "text/markdown; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("mp4", "video/mp4"),
];

/// Layout used for `read_at` values. Fixed width, so text order is chronological order.
pub const READ_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Schema for the read-status table and its descending timestamp index.
pub const READ_STATUS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS read_status (
        path TEXT PRIMARY KEY,
        read_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    );
    CREATE INDEX IF NOT EXISTS idx_read_at ON read_status(read_at DESC);
";
