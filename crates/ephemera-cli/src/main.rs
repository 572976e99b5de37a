use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ephemera_core::app::AppBuilder;
use ephemera_core::config::StoreConfig;
use ephemera_core::domain::NewArtifact;
use ephemera_core::store::RenameService;

#[derive(Debug, Parser)]
#[command(name = "ephemera", about = "Ephemeral artifact store", version)]
struct Cli {
    /// JSON config file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one session through its whole lifecycle and print each step as JSON
    Demo {
        /// Override the session TTL
        #[arg(long)]
        ttl_secs: Option<u64>,

        /// Skip the manual purge and wait for the expiry scheduler instead
        #[arg(long)]
        wait_expiry: bool,
    },
    /// Run the rename validation pipeline on a name without a store
    CheckName {
        name: String,

        /// Extension of the artifact being renamed, e.g. ".pdf"
        #[arg(long, default_value = "")]
        extension: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<StoreConfig> {
    match path {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(StoreConfig::default()),
    }
}

fn print_step<T: Serialize>(step: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing step output")?;
    println!("== {step}\n{json}");
    Ok(())
}

async fn demo(mut config: StoreConfig, ttl_secs: Option<u64>, wait_expiry: bool) -> Result<()> {
    if let Some(ttl) = ttl_secs {
        config.ttl_secs = ttl;
    }
    let app = AppBuilder::new()
        .config(config)
        .build()
        .await
        .context("building artifact store")?;
    let scheduler = app.spawn_scheduler();
    let svc = &app.service;

    let session = svc.start_session();
    print_step("countdown", &svc.countdown(session).await?)?;

    // (A) 処理ツールが結果を登録
    let a = svc
        .add_artifact(
            session,
            NewArtifact::new("a.pdf", "merge", "Merge PDF", Utc::now()),
            Bytes::from(vec![0u8; 10 * 1024]),
        )
        .await?;
    svc.add_artifact(
        session,
        NewArtifact::new("b.pdf", "merge", "Merge PDF", Utc::now()),
        Bytes::from(vec![0u8; 20 * 1024]),
    )
    .await?;
    print_step("list", &svc.list_artifacts(session).await)?;

    // (B) ユーザー操作: rename → 単体削除
    let renamed = svc.rename_artifact(session, &a.internal_name, "final").await?;
    print_step("rename", &renamed)?;
    print_step("delete", &svc.delete_artifact(session, &a.internal_name).await?)?;
    print_step("stats", &svc.session_stats(session).await)?;

    let zip = svc.download_zip(session).await?;
    print_step(
        "zip",
        &serde_json::json!({ "file_name": zip.display_name, "size_bytes": zip.bytes.len() }),
    )?;

    // (C) 全削除 or 期限切れ
    if wait_expiry {
        let ttl = Duration::from_secs(app.config.ttl_secs);
        let wait = ttl + 2 * app.scheduler.tick_interval();
        tracing::info!(wait_ms = wait.as_millis() as u64, "waiting for expiry");
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            res = tokio::signal::ctrl_c() => {
                res.context("waiting for ctrl-c")?;
                tracing::info!("interrupted");
            }
        }
        print_step("list after expiry", &svc.list_artifacts(session).await)?;
        print_step("countdown", &svc.countdown(session).await?)?;
    } else {
        print_step("purge", &svc.purge_session(session).await?)?;
        print_step("purge again", &svc.purge_session(session).await?)?;
    }

    scheduler.shutdown_and_join().await;
    Ok(())
}

fn check_name(config: &StoreConfig, name: &str, extension: &str) -> Result<()> {
    let renamer = RenameService::new(config.max_name_bytes);
    match renamer.sanitize(name, extension) {
        Ok(display_name) => {
            println!("{display_name}");
            Ok(())
        }
        Err(e) => bail!("rejected: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Demo {
            ttl_secs,
            wait_expiry,
        } => demo(config, ttl_secs, wait_expiry).await,
        Command::CheckName { name, extension } => check_name(&config, &name, &extension),
    }
}
