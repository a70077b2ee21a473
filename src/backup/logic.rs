// dbbackup/src/backup/logic.rs
//! Backup orchestration: dispatch to the engine adapter, then wrap the raw
//! artifact in the compression pipeline.
//!
//! Per request the flow is Dispatched -> AdapterRunning -> Compressing ->
//! Done, with any failure terminating the flow before the next stage. A
//! failed dump is never compressed.

use std::path::PathBuf;

use crate::backends::backend_for;
use crate::compress;
use crate::config::{BackupRequest, ConnectionConfig, DatabaseKind};
use crate::errors::Result;
use crate::process::ProcessRunner;

/// Runs one backup request end to end and returns the path of the final
/// (compressed) artifact, or `None` when the adapter legitimately produced
/// nothing (unchanged differential source).
pub async fn run_backup(
    runner: &dyn ProcessRunner,
    config: &ConnectionConfig,
    request: &BackupRequest,
) -> Result<Option<PathBuf>> {
    // Dispatched: unknown tags fail here, before any subprocess exists.
    let kind = DatabaseKind::parse(&request.database_kind)?;
    if request.output_path.as_os_str().is_empty() {
        return Err(crate::errors::BackupError::Config(
            "backup output_path must not be empty".to_string(),
        ));
    }
    let backend = backend_for(kind);
    println!(
        "🚀 Starting {} {} backup -> {}",
        kind,
        request.backup_type,
        request.output_path.display()
    );

    // AdapterRunning: adapter failure skips compression entirely.
    backend.create_backup(runner, config, request).await?;

    // A no-op adapter success (unchanged differential source) produces no
    // artifact, so there is nothing to compress.
    if !request.output_path.exists() {
        println!("ℹ Adapter produced no artifact, skipping compression.");
        return Ok(None);
    }

    // Compressing: only entered after a zero exit from the adapter.
    let artifact = compress::compress(&request.output_path)?;
    println!("✅ Backup completed: {}", artifact.display());
    Ok(Some(artifact))
}
