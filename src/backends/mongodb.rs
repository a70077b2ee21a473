// dbbackup/src/backends/mongodb.rs
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

use crate::config::{BackupRequest, BackupType, ConnectionConfig, DatabaseKind, ServerConfig};
use crate::errors::{BackupError, Result};
use crate::process::{ensure_success, CommandSpec, ProcessRunner};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MongodbBackend;

/// Builds a `mongodb://` URI with credentials percent-escaped by the URL
/// parser, so user-supplied fields never need shell quoting.
fn connection_uri(server: &ServerConfig, with_database: bool) -> Result<Url> {
    let mut uri = Url::parse(&format!("mongodb://{}:{}", server.host, server.port))
        .map_err(|e| BackupError::Config(format!("invalid MongoDB host/port: {e}")))?;
    if !server.user.is_empty() {
        uri.set_username(&server.user)
            .map_err(|_| BackupError::Config("invalid MongoDB user".to_string()))?;
        if !server.password.is_empty() {
            uri.set_password(Some(&server.password))
                .map_err(|_| BackupError::Config("invalid MongoDB password".to_string()))?;
        }
    }
    if with_database {
        uri.set_path(&format!("/{}", server.database));
    }
    Ok(uri)
}

#[async_trait]
impl super::DatabaseBackend for MongodbBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Mongodb
    }

    /// Reachability probe against the server socket. The dump tooling ships
    /// without a lightweight client, so the probe stops at the TCP layer.
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let server = config.as_server()?;
        let address = format!("{}:{}", server.host, server.port);
        match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(&address)).await {
            Ok(Ok(_)) => {
                println!("✅ MongoDB server reachable at {address}.");
                Ok(())
            }
            Ok(Err(e)) => Err(BackupError::Connection(format!("MongoDB at {address}: {e}"))),
            Err(_) => Err(BackupError::Connection(format!(
                "MongoDB at {address}: connection timed out"
            ))),
        }
    }

    async fn create_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        request: &BackupRequest,
    ) -> Result<()> {
        let server = config.as_server()?;
        match request.backup_type {
            BackupType::Full => {}
            other => {
                return Err(BackupError::Unsupported {
                    kind: DatabaseKind::Mongodb,
                    detail: format!("{other} backups are not supported by mongodump"),
                });
            }
        }
        println!("🚀 Starting MongoDB backup (mongodump)...");
        let uri = connection_uri(server, true)?;
        let spec = CommandSpec::new("mongodump")
            .arg(format!("--uri={uri}"))
            .arg(format!("--archive={}", request.output_path.display()));
        let outcome = runner.run(&spec).await;
        ensure_success("mongodump", &outcome)
    }

    async fn restore_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        artifact_path: &Path,
    ) -> Result<()> {
        let server = config.as_server()?;
        println!("🔄 Starting MongoDB restore (mongorestore)...");
        let uri = connection_uri(server, false)?;
        let spec = CommandSpec::new("mongorestore")
            .arg(format!("--uri={uri}"))
            .arg(format!("--archive={}", artifact_path.display()))
            .args(["--db", server.database.as_str()]);
        let outcome = runner.run(&spec).await;
        ensure_success("mongorestore", &outcome)?;
        println!("✅ MongoDB restore successful.");
        Ok(())
    }
}
