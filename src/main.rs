//! Database Backup/Restore Tool
//!
//! Thin entry point over the orchestration library: loads config.json,
//! picks the operation, and reports the outcome.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;

use dbbackup::backends::{backend_for, required_tools};
use dbbackup::config::{AppConfig, DatabaseKind};
use dbbackup::process::TokioProcessRunner;
use dbbackup::{run_backup, run_restore};

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let config_path = PathBuf::from("config.json");
    let app_config = AppConfig::load_from_json(&config_path).with_context(|| {
        format!(
            "Failed to load application configuration from {}",
            config_path.display()
        )
    })?;

    let args: Vec<String> = env::args().collect();
    let choice = if args.len() > 1 {
        args[1].trim().to_string()
    } else {
        prompt_choice()?
    };

    let runner = TokioProcessRunner;

    match choice.as_str() {
        "1" | "backup" => {
            let mut request = app_config
                .backup
                .clone()
                .context("No 'backup' section in config.json")?;
            let kind = DatabaseKind::parse(&request.database_kind)?;
            preflight_tools(kind);
            if request.output_path.as_os_str().is_empty() {
                let timestamp = Local::now().format("%Y-%m-%d_%H_%M_%S");
                request.output_path = PathBuf::from(format!("{kind}_backup_{timestamp}"));
                println!("ℹ No output path configured, using {}", request.output_path.display());
            }
            match run_backup(&runner, &app_config.connection, &request)
                .await
                .context("Backup process failed")?
            {
                Some(artifact) => println!("📦 Final artifact: {}", artifact.display()),
                None => println!("ℹ No artifact produced, source unchanged."),
            }
        }
        "2" | "restore" => {
            let request = app_config
                .restore
                .clone()
                .context("No 'restore' section in config.json")?;
            let kind = DatabaseKind::parse(&request.database_kind)?;
            preflight_tools(kind);
            run_restore(&runner, &app_config.connection, &request)
                .await
                .context("Restore process failed")?;
        }
        "3" | "test" => {
            let tag = app_config
                .backup
                .as_ref()
                .map(|r| r.database_kind.clone())
                .or_else(|| app_config.restore.as_ref().map(|r| r.database_kind.clone()))
                .context("No 'backup' or 'restore' section to take the database kind from")?;
            let kind = DatabaseKind::parse(&tag)?;
            backend_for(kind)
                .test_connection(&app_config.connection)
                .await
                .context("Connection test failed")?;
        }
        _ => {
            println!("❌ Invalid choice. Please enter '1' (backup), '2' (restore), or '3' (test).");
            anyhow::bail!("Invalid operation choice");
        }
    }
    Ok(())
}

/// Warns about missing native tools before any subprocess is attempted.
fn preflight_tools(kind: DatabaseKind) {
    for tool in required_tools(kind) {
        match which::which(tool) {
            Ok(path) => println!("✓ Found {} at {}", tool, path.display()),
            Err(_) => eprintln!("⚠ {tool} not found in PATH; operations needing it will fail"),
        }
    }
}

/// Prompts the user to select an operation. Returns the choice as String.
fn prompt_choice() -> Result<String> {
    use std::io::{stdin, stdout, Write};

    println!("Select an operation:");
    println!("1. Take Backup (or type 'backup')");
    println!("2. Restore Backup (or type 'restore')");
    println!("3. Test Connection (or type 'test')");
    print!("Enter your choice: ");
    stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    Ok(input.trim().to_string())
}
