//! File logger. The terminal belongs to the UI, so records go to `--log-file`.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("logger already installed")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Install env_logger writing to `path`. `level` wins over `RUST_LOG`,
/// which in turn defaults to `info`.
pub fn init(path: &Path, level: Option<LevelFilter>) -> Result<(), LogError> {
    let file = File::create(path).map_err(|source| LogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}
