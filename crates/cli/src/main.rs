use clap::{Parser, Subcommand};
use courseviewer_core::{
    constants::{DEFAULT_BASE_PATH, DEFAULT_DB_PATH, DEFAULT_HIDDEN_EXTENSIONS},
    ContentService, CoreConfig, FileNode, HiddenExtensions, ReadStatusRecord, ReadStatusStore,
    RelativePath, StorageMode, TreeService,
};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "courseviewer")]
#[command(about = "CourseViewer command line tools")]
struct Cli {
    /// Directory containing the course content
    #[arg(long, global = true, default_value = DEFAULT_BASE_PATH)]
    path: PathBuf,
    /// Comma-separated file extensions to hide from the tree
    #[arg(long, global = true, default_value = DEFAULT_HIDDEN_EXTENSIONS)]
    hide: String,
    /// SQLite file holding read status
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    dbpath: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Print the file tree as JSON
    Tree {
        /// Only print the subtree at this relative path
        #[arg(long)]
        at: Option<String>,
    },
    /// Mark a content path as read
    MarkRead {
        /// Path relative to the course directory
        path: String,
    },
    /// Print read paths and the last read path as JSON
    Status,
    /// Write a file, or part of it, to stdout
    Cat {
        /// Path relative to the course directory
        path: String,
        /// Byte range in Range header form, e.g. bytes=0-1023
        #[arg(long)]
        range: Option<String>,
    },
}

impl Cli {
    fn core_config(&self) -> CliResult<Arc<CoreConfig>> {
        let hidden = HiddenExtensions::parse_list(&self.hide);
        Ok(Arc::new(CoreConfig::new(&self.path, hidden)?))
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        println!("No command given. Try --help.");
        return Ok(());
    };

    match command {
        Commands::Tree { at } => {
            let tree = build_tree(cli.core_config()?, at.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Commands::MarkRead { path } => {
            let record = mark_read(&cli.dbpath, path)?;
            println!("Marked {} as read at {}", record.path, record.read_at);
        }
        Commands::Status => {
            let status = read_status(&cli.dbpath)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Cat { path, range } => {
            let content = ContentService::new(cli.core_config()?).open(path, range.as_deref())?;
            if let Some(content_range) = content.content_range() {
                eprintln!("Content-Range: {}", content_range);
            }
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            content.stream_to(&mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

fn build_tree(cfg: Arc<CoreConfig>, at: Option<&str>) -> CliResult<FileNode> {
    let service = TreeService::new(cfg);
    match at {
        Some(raw) => service
            .build_at(&RelativePath::parse(raw)?)?
            .ok_or_else(|| format!("{} is hidden", raw).into()),
        None => Ok(service.build()?),
    }
}

fn mark_read(db_path: &Path, path: &str) -> CliResult<ReadStatusRecord> {
    let relative = RelativePath::parse(path)?;
    if relative.is_root() {
        return Err("path must not be empty".into());
    }
    let store = ReadStatusStore::open(&StorageMode::File(db_path.to_path_buf()))?;
    Ok(store.mark_read(relative.as_str())?)
}

/// Same shape as `GET /api/read-status`.
fn read_status(db_path: &Path) -> CliResult<serde_json::Value> {
    let store = ReadStatusStore::open(&StorageMode::File(db_path.to_path_buf()))?;
    let last_read = store.last_read()?.map(|record| {
        serde_json::json!({
            "path": record.path,
            "timestamp": record.read_at,
        })
    });
    Ok(serde_json::json!({
        "paths": store.list_read_paths()?,
        "lastRead": last_read,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "courseviewer",
            "cat",
            "module/intro.md",
            "--range",
            "bytes=0-9",
            "--path",
            "/courses/rust",
            "--hide",
            ".srt,.vtt",
        ])
        .unwrap();

        assert_eq!(cli.path, PathBuf::from("/courses/rust"));
        assert_eq!(cli.hide, ".srt,.vtt");
        assert_eq!(cli.dbpath, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(
            cli.command,
            Some(Commands::Cat {
                path: "module/intro.md".into(),
                range: Some("bytes=0-9".into()),
            })
        );
    }

    #[test]
    fn test_mark_read_requires_a_path() {
        assert!(Cli::try_parse_from(["courseviewer", "mark-read"]).is_err());
    }

    #[test]
    fn test_mark_read_rejects_empty_and_escaping_paths() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("content.db");

        assert!(mark_read(&db_path, "").is_err());
        assert!(mark_read(&db_path, "./").is_err());
        assert!(mark_read(&db_path, "../outside.md").is_err());
        assert!(!db_path.exists());
    }

    #[test]
    fn test_status_matches_rest_shape() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("content.db");

        let empty = read_status(&db_path).unwrap();
        assert_eq!(empty["paths"], serde_json::json!([]));
        assert!(empty["lastRead"].is_null());

        mark_read(&db_path, "b.md").unwrap();
        let last = mark_read(&db_path, "a/./c.md").unwrap();
        assert_eq!(last.path, "a/c.md");

        let status = read_status(&db_path).unwrap();
        assert_eq!(status["paths"], serde_json::json!(["a/c.md", "b.md"]));
        assert_eq!(status["lastRead"]["path"], "a/c.md");
        assert_eq!(
            status["lastRead"]["timestamp"],
            serde_json::to_value(last.read_at).unwrap()
        );
        assert!(status["lastRead"].get("readAt").is_none());
    }

    #[test]
    fn test_tree_at_hidden_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("subs.srt"), "1").unwrap();
        fs::write(temp.path().join("intro.md"), "# Intro").unwrap();
        let cfg = Arc::new(
            CoreConfig::new(temp.path(), HiddenExtensions::parse_list(".srt")).unwrap(),
        );

        assert!(build_tree(cfg.clone(), Some("subs.srt")).is_err());
        let node = build_tree(cfg.clone(), Some("intro.md")).unwrap();
        assert_eq!(node.path, "intro.md");
        assert_eq!(build_tree(cfg, None).unwrap().children.len(), 1);
    }
}
