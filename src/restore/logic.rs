// dbbackup/src/restore/logic.rs
//! Restore orchestration: reverse the compression, hand the plain artifact
//! to the engine adapter, then clean up the decompressed intermediate.
//!
//! Per request the flow is Dispatched -> Decompressing -> AdapterRunning ->
//! Cleanup -> Done. On adapter failure the decompressed intermediate is
//! left in place for operator inspection.

use std::fs;

use crate::backends::backend_for;
use crate::compress;
use crate::config::{ConnectionConfig, DatabaseKind, RestoreRequest};
use crate::errors::Result;
use crate::process::ProcessRunner;

pub async fn run_restore(
    runner: &dyn ProcessRunner,
    config: &ConnectionConfig,
    request: &RestoreRequest,
) -> Result<()> {
    let kind = DatabaseKind::parse(&request.database_kind)?;
    let backend = backend_for(kind);
    println!(
        "🔄 Starting {} restore from {}",
        kind,
        request.artifact_path.display()
    );

    // Decompressing: a no-op passthrough for artifacts without the
    // compressed suffix, so every artifact can be routed through here.
    let plain = compress::decompress(&request.artifact_path)?;

    backend.restore_backup(runner, config, &plain).await?;

    // Cleanup: only the intermediate that decompression itself produced,
    // and only once the adapter has reported success. The restore itself is
    // already complete at this point, so a stuck intermediate is logged and
    // left behind rather than turning a finished restore into a failure.
    if plain != request.artifact_path {
        let removed = if plain.is_dir() {
            fs::remove_dir_all(&plain)
        } else {
            fs::remove_file(&plain)
        };
        match removed {
            Ok(()) => println!("🧹 Removed decompressed intermediate {}", plain.display()),
            Err(e) => eprintln!(
                "⚠ Could not remove decompressed intermediate {}: {e}",
                plain.display()
            ),
        }
    }

    println!("✅ Restore completed.");
    Ok(())
}
