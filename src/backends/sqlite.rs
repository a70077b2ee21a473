// dbbackup/src/backends/sqlite.rs
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::{BackupRequest, BackupType, ConnectionConfig, DatabaseKind};
use crate::errors::{BackupError, Result};
use crate::process::{ensure_success, CommandSpec, ProcessRunner};

pub struct SqliteBackend;

fn fs_err(path: &Path) -> impl FnOnce(std::io::Error) -> BackupError {
    let path = path.to_path_buf();
    move |source| BackupError::FileSystem { path, source }
}

/// Path of the write-ahead-log sidecar next to the main database file.
fn wal_sidecar(database_path: &Path) -> PathBuf {
    PathBuf::from(format!("{}-wal", database_path.display()))
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| {
        BackupError::Config(format!("database_path has no file name: {}", path.display()))
    })
}

/// Copies the main database file, plus the WAL sidecar when one exists,
/// into `dest_dir`. A missing sidecar means every change is already in the
/// main file and is not an error.
fn copy_with_sidecar(database_path: &Path, dest_dir: &Path) -> Result<()> {
    fs::create_dir_all(dest_dir).map_err(fs_err(dest_dir))?;
    let main_dest = dest_dir.join(file_name(database_path)?);
    fs::copy(database_path, &main_dest).map_err(fs_err(database_path))?;
    println!("✓ Copied database file to {}", main_dest.display());

    let sidecar = wal_sidecar(database_path);
    if sidecar.exists() {
        let sidecar_dest = PathBuf::from(format!("{}-wal", main_dest.display()));
        fs::copy(&sidecar, &sidecar_dest).map_err(fs_err(&sidecar))?;
        println!("✓ Copied WAL sidecar to {}", sidecar_dest.display());
    } else {
        println!("ℹ No WAL sidecar present, main file only.");
    }
    Ok(())
}

#[async_trait]
impl super::DatabaseBackend for SqliteBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let embedded = config.as_embedded()?;
        if embedded.database_path.is_file() {
            println!("✅ SQLite database file exists.");
            Ok(())
        } else {
            Err(BackupError::Connection(format!(
                "SQLite database file does not exist: {}",
                embedded.database_path.display()
            )))
        }
    }

    async fn create_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        request: &BackupRequest,
    ) -> Result<()> {
        let embedded = config.as_embedded()?;
        match request.backup_type {
            BackupType::Full => {
                println!("🚀 Starting SQLite backup (sqlite3 .backup)...");
                // The .backup dot-command parses its own quoting; escape
                // single quotes in the user-supplied path.
                let escaped = request.output_path.display().to_string().replace('\'', "''");
                let spec = CommandSpec::new("sqlite3")
                    .arg(embedded.database_path.display().to_string())
                    .arg(format!(".backup '{escaped}'"));
                let outcome = runner.run(&spec).await;
                ensure_success("sqlite3", &outcome)
            }
            BackupType::Incremental => {
                println!("🚀 Starting SQLite incremental backup (file + WAL copy)...");
                copy_with_sidecar(&embedded.database_path, &request.output_path)
            }
            BackupType::Differential => {
                let Some(full_backup) = request.full_backup_path.as_deref() else {
                    return Err(BackupError::Unsupported {
                        kind: DatabaseKind::Sqlite,
                        detail: "differential backup requires the path of a prior full backup"
                            .to_string(),
                    });
                };
                println!("🚀 Starting SQLite differential backup...");
                let source_mtime = fs::metadata(&embedded.database_path)
                    .and_then(|m| m.modified())
                    .map_err(fs_err(&embedded.database_path))?;
                let full_mtime = fs::metadata(full_backup)
                    .and_then(|m| m.modified())
                    .map_err(fs_err(full_backup))?;
                if source_mtime <= full_mtime {
                    println!("ℹ Database unchanged since the full backup, nothing to copy.");
                    return Ok(());
                }
                copy_with_sidecar(&embedded.database_path, &request.output_path)
            }
        }
    }

    async fn restore_backup(
        &self,
        _runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        artifact_path: &Path,
    ) -> Result<()> {
        let embedded = config.as_embedded()?;
        println!("🔄 Starting SQLite restore (file copy)...");
        if artifact_path.is_dir() {
            // Directory artifacts come from incremental/differential copies
            // and hold the main file under its original name.
            let main_src = artifact_path.join(file_name(&embedded.database_path)?);
            fs::copy(&main_src, &embedded.database_path).map_err(fs_err(&main_src))?;
            let sidecar_src = PathBuf::from(format!("{}-wal", main_src.display()));
            if sidecar_src.exists() {
                let sidecar_dest = wal_sidecar(&embedded.database_path);
                fs::copy(&sidecar_src, &sidecar_dest).map_err(fs_err(&sidecar_src))?;
            }
        } else {
            fs::copy(artifact_path, &embedded.database_path).map_err(fs_err(artifact_path))?;
        }
        println!("✅ SQLite restore successful.");
        Ok(())
    }
}
