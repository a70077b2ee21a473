//! Point-in-time backup and restore for heterogeneous databases.
//!
//! Delegates dump/restore mechanics to each engine's native tool
//! (`pg_dump`, `mysqldump`, `mongodump`, `sqlite3`) and provides the
//! uniform lifecycle around that delegation: process supervision, output
//! streaming, gzip compression of every artifact, and cleanup under
//! partial failure.

pub mod backends;
pub mod backup;
pub mod compress;
pub mod config;
pub mod errors;
pub mod process;
pub mod restore;

pub use backup::run_backup;
pub use config::{BackupRequest, BackupType, ConnectionConfig, DatabaseKind, RestoreRequest};
pub use errors::{BackupError, Result};
pub use process::{CommandSpec, ProcessOutcome, ProcessRunner, TokioProcessRunner};
pub use restore::run_restore;
