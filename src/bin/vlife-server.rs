// ABOUTME: V-Life server binary - loads configuration, opens the database, serves HTTP
// ABOUTME: Week generation is enabled only when an LLM API key is configured
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # V-Life Server Binary
//!
//! Starts the workout backend: AI week generation, session logging,
//! personal records, and the `RevenueCat` subscription webhook.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use vlife_server::{
    cache::SystemClock,
    config::ServerConfig,
    database::SqliteWorkoutStore,
    llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider},
    logging,
    resources::ServerResources,
    server,
};

#[derive(Parser)]
#[command(name = "vlife-server")]
#[command(about = "V-Life workout backend - AI weekly plans, session logging, subscription sync")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting V-Life server");
    info!("{}", config.summary());

    ensure_database_dir(&config.database_url)?;
    let store = SqliteWorkoutStore::connect(&config.database_url).await?;

    let llm: Option<Arc<dyn LlmProvider>> = if config.llm.api_key.is_some() {
        let provider = OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::from(&config.llm))?;
        Some(Arc::new(provider))
    } else {
        warn!("No LLM API key configured; week generation will answer 503");
        None
    };

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        config,
        Arc::new(store),
        llm,
        Arc::new(SystemClock),
    )?);

    if !resources.exercise_db.is_configured() {
        warn!("No ExerciseDB API key configured; exercise metadata lookups will answer 503");
    }

    if let Err(e) = server::run(resources, port).await {
        error!("Server error: {e}");
        return Err(e.into());
    }

    Ok(())
}

/// `SQLite` creates the file but not its parent directory
fn ensure_database_dir(database_url: &str) -> Result<()> {
    if database_url.contains(":memory:") {
        return Ok(());
    }
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}
