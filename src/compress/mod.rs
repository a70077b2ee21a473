// dbbackup/src/compress/mod.rs
//! Compression pipeline wrapped around every backup artifact.
//!
//! Plain dump files become `<path>.gz` gzip streams; directory artifacts
//! (streaming base backups) become `<path>.tar.gz` archives. The source is
//! removed only after the transform has fully flushed; on any stream error
//! the source is preserved and the partial output is dropped.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder};
use walkdir::WalkDir;

use crate::errors::{BackupError, Result};

const GZ_SUFFIX: &str = ".gz";
const TAR_GZ_SUFFIX: &str = ".tar.gz";

fn stream_err(path: &Path) -> impl FnOnce(io::Error) -> BackupError {
    let path = path.to_path_buf();
    move |source| BackupError::Stream { path, source }
}

fn fs_err(path: &Path) -> impl FnOnce(io::Error) -> BackupError {
    let path = path.to_path_buf();
    move |source| BackupError::FileSystem { path, source }
}

/// Compresses a raw artifact and removes the raw form once the compressed
/// form is complete on disk. Returns the compressed path.
pub fn compress(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        compress_dir(path)
    } else {
        compress_file(path)
    }
}

fn compress_file(path: &Path) -> Result<PathBuf> {
    let dest = PathBuf::from(format!("{}{}", path.display(), GZ_SUFFIX));
    println!("🗜 Compressing {} -> {}", path.display(), dest.display());

    let result = (|| -> io::Result<()> {
        let mut source = File::open(path)?;
        let mut encoder = GzEncoder::new(File::create(&dest)?, Compression::default());
        io::copy(&mut source, &mut encoder)?;
        encoder.finish()?.sync_all()?;
        Ok(())
    })();

    if let Err(err) = result {
        // The raw file stays behind for inspection; only the partial
        // compressed output is discarded.
        let _ = fs::remove_file(&dest);
        return Err(stream_err(path)(err));
    }

    fs::remove_file(path).map_err(fs_err(path))?;
    println!("✓ Compressed artifact ready: {}", dest.display());
    Ok(dest)
}

/// Directory artifacts are packed into a gzipped tarball with paths
/// relative to the directory root.
fn compress_dir(path: &Path) -> Result<PathBuf> {
    let dest = PathBuf::from(format!("{}{}", path.display(), TAR_GZ_SUFFIX));
    println!("🗜 Archiving {} -> {}", path.display(), dest.display());

    let result = (|| -> io::Result<()> {
        let encoder = GzEncoder::new(File::create(&dest)?, Compression::default());
        let mut builder = Builder::new(encoder);
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(io::Error::other)?;
            let name = entry
                .path()
                .strip_prefix(path)
                .map_err(io::Error::other)?;
            if name.as_os_str().is_empty() {
                continue;
            }
            if entry.path().is_dir() {
                builder.append_dir(name, entry.path())?;
            } else if entry.path().is_file() {
                builder.append_path_with_name(entry.path(), name)?;
            }
        }
        builder.into_inner()?.finish()?.sync_all()?;
        Ok(())
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&dest);
        return Err(stream_err(path)(err));
    }

    fs::remove_dir_all(path).map_err(fs_err(path))?;
    println!("✓ Compressed artifact ready: {}", dest.display());
    Ok(dest)
}

/// Reverses [`compress`]. A path without a recognized compressed suffix is
/// returned unchanged with no file system mutation, so callers can route
/// every artifact through here unconditionally.
pub fn decompress(path: &Path) -> Result<PathBuf> {
    if let Some(dest) = strip_suffix(path, TAR_GZ_SUFFIX) {
        decompress_dir(path, dest)
    } else if let Some(dest) = strip_suffix(path, GZ_SUFFIX) {
        decompress_file(path, dest)
    } else {
        Ok(path.to_path_buf())
    }
}

fn decompress_file(path: &Path, dest: PathBuf) -> Result<PathBuf> {
    println!("📦 Decompressing {} -> {}", path.display(), dest.display());

    let result = (|| -> io::Result<()> {
        let mut decoder = GzDecoder::new(File::open(path)?);
        let mut output = File::create(&dest)?;
        io::copy(&mut decoder, &mut output)?;
        output.sync_all()?;
        Ok(())
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&dest);
        return Err(stream_err(path)(err));
    }
    Ok(dest)
}

fn decompress_dir(path: &Path, dest: PathBuf) -> Result<PathBuf> {
    println!("📦 Extracting {} -> {}", path.display(), dest.display());
    fs::create_dir_all(&dest).map_err(fs_err(&dest))?;

    let result = (|| -> io::Result<()> {
        let decoder = GzDecoder::new(File::open(path)?);
        Archive::new(decoder).unpack(&dest)?;
        Ok(())
    })();

    if let Err(err) = result {
        let _ = fs::remove_dir_all(&dest);
        return Err(stream_err(path)(err));
    }
    Ok(dest)
}

fn strip_suffix(path: &Path, suffix: &str) -> Option<PathBuf> {
    path.to_str()
        .and_then(|s| s.strip_suffix(suffix))
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_round_trip_is_byte_identical_and_removes_raw() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("orders.sql");
        let payload = b"INSERT INTO orders VALUES (1, 'widget');\n".repeat(200);
        fs::write(&raw, &payload).unwrap();

        let compressed = compress(&raw).unwrap();
        assert_eq!(compressed, dir.path().join("orders.sql.gz"));
        assert!(!raw.exists(), "raw artifact must be removed after compression");

        let restored = decompress(&compressed).unwrap();
        assert_eq!(restored, raw);
        assert_eq!(fs::read(&restored).unwrap(), payload);
        assert!(compressed.exists(), "decompression keeps the compressed artifact");
    }

    #[test]
    fn directory_round_trip_preserves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("basebackup");
        fs::create_dir_all(base.join("pg_wal")).unwrap();
        fs::write(base.join("backup_label"), b"LABEL").unwrap();
        fs::write(base.join("pg_wal").join("000000010000000000000001"), b"wal").unwrap();

        let compressed = compress(&base).unwrap();
        assert_eq!(compressed, dir.path().join("basebackup.tar.gz"));
        assert!(!base.exists());

        let restored = decompress(&compressed).unwrap();
        assert_eq!(restored, base);
        assert_eq!(fs::read(base.join("backup_label")).unwrap(), b"LABEL");
        assert_eq!(
            fs::read(base.join("pg_wal").join("000000010000000000000001")).unwrap(),
            b"wal"
        );
    }

    #[test]
    fn decompress_is_a_no_op_for_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("already-plain.dump");
        fs::write(&plain, b"dump").unwrap();
        let before = fs::read_dir(dir.path()).unwrap().count();

        let result = decompress(&plain).unwrap();
        assert_eq!(result, plain);
        assert_eq!(
            fs::read_dir(dir.path()).unwrap().count(),
            before,
            "no file system mutation for a passthrough"
        );
    }

    #[test]
    fn failed_compression_preserves_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-written.sql");
        match compress(&missing) {
            Err(BackupError::Stream { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Stream error, got {other:?}"),
        }
        assert!(!dir.path().join("never-written.sql.gz").exists());
    }
}
