#![allow(dead_code)]

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::LevelFilter;
use rowkit::{Table, TableOptions, create_table};
use tempfile::{TempDir, tempdir};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Installs `env_logger` once per test binary; `rowkit` logs at info unless
/// `RUST_LOG` says otherwise.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("rowkit", LevelFilter::Info);
        }
        let _ = builder.is_test(true).format_timestamp_millis().try_init();
    });
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Header plus data rows as borrowed strings.
pub fn rows(lines: &[&[&'static str]]) -> Vec<Vec<&'static str>> {
    lines.iter().map(|line| line.to_vec()).collect()
}

/// Builds a table from string rows with default options.
pub fn table_from(lines: &[&[&'static str]]) -> Table {
    init_logging();
    create_table(rows(lines), &TableOptions::new()).expect("create table")
}
