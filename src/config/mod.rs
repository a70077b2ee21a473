// dbbackup/src/config/mod.rs
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::errors::{BackupError, Result};

/// The closed set of database engines this tool knows how to back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    Postgres,
    Mysql,
    Mongodb,
    Sqlite,
}

impl DatabaseKind {
    /// Parses a case-insensitive kind tag as received from the CLI layer.
    ///
    /// Unknown tags are rejected up front so that no subprocess is ever
    /// spawned for an engine we cannot handle.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            "sqlite" => Ok(Self::Sqlite),
            // Report the caller's original spelling, not the normalized tag.
            _ => Err(BackupError::UnsupportedKind(tag.to_string())),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongodb => "mongodb",
            Self::Sqlite => "sqlite",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    #[default]
    Full,
    Incremental,
    Differential,
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Differential => "differential",
        };
        write!(f, "{name}")
    }
}

/// Connection parameters for one database, owned by the caller for the
/// duration of a single backup or restore operation. Never persisted here.
#[derive(Clone, Deserialize)]
#[serde(untagged)]
pub enum ConnectionConfig {
    Server(ServerConfig),
    Embedded(EmbeddedConfig),
}

/// Host/port style connection used by the server engines.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

/// File-path style connection used by the embedded engine (SQLite).
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedConfig {
    pub database_path: PathBuf,
}

impl ConnectionConfig {
    pub fn as_server(&self) -> Result<&ServerConfig> {
        match self {
            Self::Server(cfg) => Ok(cfg),
            Self::Embedded(_) => Err(BackupError::Config(
                "this engine needs host/port/user/database connection fields".to_string(),
            )),
        }
    }

    pub fn as_embedded(&self) -> Result<&EmbeddedConfig> {
        match self {
            Self::Embedded(cfg) => Ok(cfg),
            Self::Server(_) => Err(BackupError::Config(
                "this engine needs a database_path connection field".to_string(),
            )),
        }
    }
}

// Keep secrets out of logs and error chains.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(cfg) => cfg.fmt(f),
            Self::Embedded(cfg) => cfg.fmt(f),
        }
    }
}

/// One backup invocation. Immutable once constructed; discarded after the
/// orchestrator returns.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupRequest {
    /// Case-insensitive engine tag from the CLI layer ("postgres", "mysql",
    /// "mongodb", "sqlite"). Validated by the orchestrator before dispatch.
    pub database_kind: String,
    /// Destination for the raw artifact. The binary fills in a timestamped
    /// default when the config leaves this empty.
    #[serde(default)]
    pub output_path: PathBuf,
    #[serde(default)]
    pub backup_type: BackupType,
    /// Base of a prior full backup; required for differential backups.
    #[serde(default)]
    pub full_backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoreRequest {
    pub database_kind: String,
    pub artifact_path: PathBuf,
}

/// Top-level config.json shape consumed by the binary. The library never
/// reads this itself; it receives the pieces as explicit parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub backup: Option<BackupRequest>,
    pub restore: Option<RestoreRequest>,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> anyhow::Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_case_insensitive() {
        assert_eq!(DatabaseKind::parse("Postgres").unwrap(), DatabaseKind::Postgres);
        assert_eq!(DatabaseKind::parse("MYSQL").unwrap(), DatabaseKind::Mysql);
        assert_eq!(DatabaseKind::parse("mongo").unwrap(), DatabaseKind::Mongodb);
        assert_eq!(DatabaseKind::parse("sqlite").unwrap(), DatabaseKind::Sqlite);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        match DatabaseKind::parse("oracle") {
            Err(BackupError::UnsupportedKind(tag)) => assert_eq!(tag, "oracle"),
            other => panic!("expected UnsupportedKind, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_keeps_the_original_spelling() {
        match DatabaseKind::parse("OracleDB") {
            Err(BackupError::UnsupportedKind(tag)) => assert_eq!(tag, "OracleDB"),
            other => panic!("expected UnsupportedKind, got {other:?}"),
        }
    }

    #[test]
    fn connection_config_deserializes_both_shapes() {
        let server: ConnectionConfig = serde_json::from_str(
            r#"{"host":"db.local","port":5432,"user":"app","password":"s3cret","database":"orders"}"#,
        )
        .unwrap();
        let server = server.as_server().unwrap();
        assert_eq!(server.host, "db.local");
        assert_eq!(server.port, 5432);

        let embedded: ConnectionConfig =
            serde_json::from_str(r#"{"database_path":"/var/lib/app/app.db"}"#).unwrap();
        assert!(embedded.as_embedded().is_ok());
        assert!(embedded.as_server().is_err());
    }

    #[test]
    fn server_debug_redacts_password() {
        let cfg = ServerConfig {
            host: "h".into(),
            port: 5432,
            user: "u".into(),
            password: "topsecret".into(),
            database: "d".into(),
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("topsecret"));
        assert!(printed.contains("<redacted>"));
    }
}
