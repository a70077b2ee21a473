// dbbackup/src/backends/mod.rs
//! Backend adapters: one per supported engine, all behind the same
//! connect/backup/restore contract. Command construction is adapter
//! specific, but credentials always travel through the mechanism the
//! native tool expects (scoped environment variable or argument), never
//! through an interpolated shell string.

pub(crate) mod mongodb;
pub(crate) mod mysql;
pub(crate) mod postgres;
pub(crate) mod sqlite;

use std::path::Path;

use async_trait::async_trait;

use crate::config::{BackupRequest, ConnectionConfig, DatabaseKind};
use crate::errors::Result;
use crate::process::ProcessRunner;

#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    /// Cheap connectivity probe. Purely observational: produces no
    /// artifacts and spawns no dump tool.
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()>;

    /// Produces the raw artifact at `request.output_path`. Backup types the
    /// engine has no native mechanism for are rejected, never silently
    /// downgraded to a full backup.
    async fn create_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        request: &BackupRequest,
    ) -> Result<()>;

    /// Restores from an uncompressed artifact path.
    async fn restore_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        artifact_path: &Path,
    ) -> Result<()>;
}

/// Closed dispatch over the supported engines.
pub fn backend_for(kind: DatabaseKind) -> Box<dyn DatabaseBackend> {
    match kind {
        DatabaseKind::Postgres => Box::new(postgres::PostgresBackend),
        DatabaseKind::Mysql => Box::new(mysql::MysqlBackend),
        DatabaseKind::Mongodb => Box::new(mongodb::MongodbBackend),
        DatabaseKind::Sqlite => Box::new(sqlite::SqliteBackend),
    }
}

/// Native tools each engine's adapter shells out to, for preflight checks.
pub fn required_tools(kind: DatabaseKind) -> &'static [&'static str] {
    match kind {
        DatabaseKind::Postgres => &["pg_dump", "pg_basebackup", "psql"],
        DatabaseKind::Mysql => &["mysqldump", "mysql"],
        DatabaseKind::Mongodb => &["mongodump", "mongorestore"],
        DatabaseKind::Sqlite => &["sqlite3"],
    }
}
