// dbbackup/src/backends/mysql.rs
use std::path::Path;

use async_trait::async_trait;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{ConnectOptions, Connection};

use crate::config::{BackupRequest, BackupType, ConnectionConfig, DatabaseKind, ServerConfig};
use crate::errors::{BackupError, Result};
use crate::process::{ensure_success, CommandSpec, ProcessRunner};

pub struct MysqlBackend;

fn base_args(server: &ServerConfig) -> Vec<String> {
    vec![
        "-h".to_string(),
        server.host.clone(),
        "-P".to_string(),
        server.port.to_string(),
        "-u".to_string(),
        server.user.clone(),
    ]
}

#[async_trait]
impl super::DatabaseBackend for MysqlBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Mysql
    }

    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let server = config.as_server()?;
        let options = MySqlConnectOptions::new()
            .host(&server.host)
            .port(server.port)
            .username(&server.user)
            .password(&server.password)
            .database(&server.database);
        let conn = options
            .connect()
            .await
            .map_err(|e| BackupError::Connection(format!("MySQL: {e}")))?;
        conn.close()
            .await
            .map_err(|e| BackupError::Connection(format!("MySQL: {e}")))?;
        println!("✅ MySQL connection successful.");
        Ok(())
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
                    kind: DatabaseKind::Mysql,
                    detail: format!(
                        "{other} backups require binary log shipping, which mysqldump does not provide"
                    ),
                });
            }
        }
        println!("🚀 Starting MySQL backup (mysqldump)...");
        let spec = CommandSpec::new("mysqldump")
            .args(base_args(server))
            .arg(&server.database)
            .arg("-r")
            .arg(request.output_path.display().to_string())
            .env("MYSQL_PWD", &server.password);
        let outcome = runner.run(&spec).await;
        ensure_success("mysqldump", &outcome)
    }

    async fn restore_backup(
        &self,
        runner: &dyn ProcessRunner,
        config: &ConnectionConfig,
        artifact_path: &Path,
    ) -> Result<()> {
        let server = config.as_server()?;
        println!("🔄 Starting MySQL restore (mysql)...");
        // `source` runs client-side; the path is handed to the client as a
        // single argv entry, no shell in between.
        let spec = CommandSpec::new("mysql")
            .args(base_args(server))
            .arg(&server.database)
            .arg("-e")
            .arg(format!("source {}", artifact_path.display()))
            .env("MYSQL_PWD", &server.password);
        let outcome = runner.run(&spec).await;
        ensure_success("mysql", &outcome)?;
        println!("✅ MySQL restore successful.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::super::DatabaseBackend;
    use super::*;
    use crate::process::test_support::ScriptedRunner;

    fn server_config() -> ConnectionConfig {
        ConnectionConfig::Server(ServerConfig {
            host: "mysql.internal".into(),
            port: 3306,
            user: "backup".into(),
            password: "s3cret".into(),
            database: "inventory".into(),
        })
    }

    #[tokio::test]
    async fn full_backup_passes_password_via_env_only() {
        let runner = ScriptedRunner::succeeding();
        let request = BackupRequest {
            database_kind: "mysql".into(),
            output_path: PathBuf::from("/backups/inventory.sql"),
            backup_type: BackupType::Full,
            full_backup_path: None,
        };
        MysqlBackend
            .create_backup(&runner, &server_config(), &request)
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].program, "mysqldump");
        assert!(calls[0]
            .envs
            .contains(&("MYSQL_PWD".to_string(), "s3cret".to_string())));
        assert!(!calls[0].args.iter().any(|a| a.contains("s3cret")));
    }

    #[tokio::test]
    async fn incremental_backup_is_tagged_unsupported() {
        let runner = ScriptedRunner::succeeding();
        let request = BackupRequest {
            database_kind: "mysql".into(),
            output_path: PathBuf::from("/backups/inventory.sql"),
            backup_type: BackupType::Incremental,
            full_backup_path: None,
        };
        let err = MysqlBackend
            .create_backup(&runner, &server_config(), &request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackupError::Unsupported {
                kind: DatabaseKind::Mysql,
                ..
            }
        ));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn restore_sources_the_artifact() {
        let runner = ScriptedRunner::succeeding();
        MysqlBackend
            .restore_backup(&runner, &server_config(), Path::new("/backups/inventory.sql"))
            .await
            .unwrap();
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].program, "mysql");
        assert!(calls[0]
            .args
            .contains(&"source /backups/inventory.sql".to_string()));
    }
}
