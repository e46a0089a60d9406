//! `sneezetrack` - CLI for sneezetracker
//!
//! Runs the HTTP API, or records and inspects sneezes directly against the
//! configured database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::Parser;

use sneezetracker::cli::{
    Cli, Command, ConfigCommand, ListCommand, RecordCommand, ServeCommand, StatsCommand,
};
use sneezetracker::{
    api, init_logging, validate, Config, DashboardStats, SneezeRecord, SneezeStore, Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    if let Command::Config(ConfigCommand::Validate { file }) = cli.command {
        let path = file
            .or(cli.config)
            .unwrap_or_else(Config::default_config_path);
        return validate_config_file(&path);
    }

    let config = Config::load_from(cli.config.clone()).context("Failed to load configuration")?;

    match cli.command {
        Command::Serve(cmd) => handle_serve(&config, &cmd).await,
        Command::Record(cmd) => handle_record(&config, &cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Stats(cmd) => handle_stats(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("Failed to open database at {}", path.display()))
}

async fn handle_serve(config: &Config, cmd: &ServeCommand) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(bind) = &cmd.bind {
        config.server.bind_address.clone_from(bind);
    }
    let addr = config.bind_address()?;

    let storage = open_storage(&config)?;
    tracing::info!(
        database = %storage.path().display(),
        "sneezetrack {} starting",
        env!("CARGO_PKG_VERSION")
    );

    api::serve(Arc::new(storage), addr)
        .await
        .context("Server error")
}

fn handle_record(config: &Config, cmd: &RecordCommand) -> anyhow::Result<()> {
    let sneeze = validate(&cmd.to_candidate())?;
    let storage = open_storage(config)?;
    let record = storage.insert(&sneeze).context("Failed to record sneeze")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Recorded sneeze #{}", record.id);
        print_record(&record);
    }
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let records = storage.list().context("Failed to fetch sneezes")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No sneezes recorded yet. Run `sneezetrack record <INTENSITY>` to add one.");
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn handle_stats(config: &Config, cmd: &StatsCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let records = storage.list().context("Failed to fetch sneezes")?;
    let stats = DashboardStats::from_records(&records);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Total sneezes:   {}", stats.total_count);
        println!("Today's count:   {}", stats.today_count);
        println!("Avg. intensity:  {:.1}", stats.average_intensity);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Server]");
                println!("  Bind address:   {}", config.server.bind_address);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            validate_config_file(&file.unwrap_or_else(Config::default_config_path))?;
        }
    }
    Ok(())
}

fn validate_config_file(path: &Path) -> anyhow::Result<()> {
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path.to_path_buf()))
        .with_context(|| format!("Configuration error in {}", path.display()))?;
    println!("Configuration is valid.");
    Ok(())
}

fn print_record(record: &SneezeRecord) {
    let local = record.date.with_timezone(&Local);
    let mut line = format!(
        "#{:<5} {}  {} {} ({})",
        record.id,
        local.format("%Y-%m-%d %H:%M"),
        record.intensity.emoji(),
        record.intensity.label(),
        record.intensity,
    );
    if let Some(location) = &record.location {
        line.push_str(&format!("  📍 {location}"));
    }
    println!("{line}");
    if let Some(notes) = &record.notes {
        println!("       {notes}");
    }
}
