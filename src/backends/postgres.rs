// dbbackup/src/backends/postgres.rs
use std::path::Path;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection};

use crate::config::{BackupRequest, BackupType, ConnectionConfig, DatabaseKind, ServerConfig};
use crate::errors::{BackupError, Result};
use crate::process::{ensure_success, CommandSpec, ProcessRunner};

pub struct PostgresBackend;

fn base_args(server: &ServerConfig) -> Vec<String> {
    vec![
        "-h".to_string(),
        server.host.clone(),
        "-p".to_string(),
        server.port.to_string(),
        "-U".to_string(),
        server.user.clone(),
    ]
}

#[async_trait]
impl super::DatabaseBackend for PostgresBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let server = config.as_server()?;
        let options = PgConnectOptions::new()
            .host(&server.host)
            .port(server.port)
            .username(&server.user)
            .password(&server.password)
            .database(&server.database);
        let conn = options
            .connect()
            .await
            .map_err(|e| BackupError::Connection(format!("PostgreSQL: {e}")))?;
        conn.close()
            .await
            .map_err(|e| BackupError::Connection(format!("PostgreSQL: {e}")))?;
        println!("✅ PostgreSQL connection successful.");
        Ok(())
    }

    async fn create_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        request: &BackupRequest,
    ) -> Result<()> {
        let server = config.as_server()?;
        let spec = match request.backup_type {
            BackupType::Full => {
                println!("🚀 Starting PostgreSQL backup (pg_dump)...");
                CommandSpec::new("pg_dump")
                    .args(base_args(server))
                    .args(["-d", server.database.as_str()])
                    .arg("-f")
                    .arg(request.output_path.display().to_string())
            }
            // A streaming base backup is the engine-native incremental
            // mechanism; the artifact is a directory.
            BackupType::Incremental => {
                println!("🚀 Starting PostgreSQL base backup (pg_basebackup)...");
                CommandSpec::new("pg_basebackup")
                    .args(base_args(server))
                    .arg("-D")
                    .arg(request.output_path.display().to_string())
                    .arg("--format=plain")
            }
            BackupType::Differential => {
                return Err(BackupError::Unsupported {
                    kind: DatabaseKind::Postgres,
                    detail: "differential backups have no native PostgreSQL mechanism".to_string(),
                });
            }
        };
        let program = spec.program.clone();
        let outcome = runner
            .run(&spec.env("PGPASSWORD", &server.password))
            .await;
        ensure_success(&program, &outcome)
    }

    async fn restore_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        artifact_path: &Path,
    ) -> Result<()> {
        let server = config.as_server()?;
        if artifact_path.is_dir() {
            return Err(BackupError::Unsupported {
                kind: DatabaseKind::Postgres,
                detail: format!(
                    "base backup directory {} must be placed into the server data directory manually",
                    artifact_path.display()
                ),
            });
        }
        println!("🔄 Starting PostgreSQL restore (psql)...");
        let spec = CommandSpec::new("psql")
            .arg("-X")
            .arg("-q")
            .args(["-v", "ON_ERROR_STOP=1"])
            .args(base_args(server))
            .args(["-d", server.database.as_str()])
            .arg("-f")
            .arg(artifact_path.display().to_string())
            .env("PGPASSWORD", &server.password);
        let outcome = runner.run(&spec).await;
        ensure_success("psql", &outcome)?;
        println!("✅ PostgreSQL restore successful.");
        Ok(())
    }
}
