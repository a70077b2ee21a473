use std::path::PathBuf;

use thiserror::Error;

use crate::config::DatabaseKind;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("unsupported database type: {0}")]
    UnsupportedKind(String),

    #[error("unsupported operation for {kind}: {detail}")]
    Unsupported { kind: DatabaseKind, detail: String },

    #[error("failed to start {program}: {detail}")]
    Spawn { program: String, detail: String },

    #[error("{program} exited unsuccessfully ({}): {stderr}",
        .code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}")))]
    Process {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("compression stream error on {path}: {source}")]
    Stream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file system operation failed on {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid connection configuration: {0}")]
    Config(String),

    #[error("database connection failed: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;
