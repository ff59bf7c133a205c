//! `roster` - CLI for the roster record store
//!
//! Each invocation loads the collection, applies one command, and lets the
//! store write the collection back when it changed.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use roster::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand, ListCommand, OutputFormat,
};
use roster::{init_logging, Config, Entry, RecordStore, SaveOutcome, SqliteStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Add(cmd) => handle_add(&config, &cmd),
        Command::Edit(cmd) => handle_edit(&config, &cmd),
        Command::Delete(cmd) => handle_delete(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> Result<RecordStore<SqliteStore>> {
    let path = config.database_path();
    let backend = SqliteStore::open(&path)
        .with_context(|| format!("opening database {}", path.display()))?
        .with_skip_unchanged_writes(config.storage.skip_unchanged_writes);
    debug!("Using collection key {}", config.storage.collection_key);
    Ok(RecordStore::initialize_with_key(
        backend,
        config.storage.collection_key.clone(),
    )?)
}

fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let mut store = open_store(config)?;
    if let Some(term) = &cmd.search {
        store.set_search_term(term.clone());
    }
    let entries = store.visible_entries();

    match cmd.format {
        OutputFormat::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "position": entry.position,
                        "name": entry.record.name,
                        "surname": entry.record.surname,
                        "age": entry.record.age,
                        "location": entry.record.location,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}: {}", entry.position, entry.record);
            }
        }
        OutputFormat::Table => print_table(&entries),
    }

    if entries.is_empty() && cmd.format != OutputFormat::Json {
        if store.is_empty() {
            println!("No records yet. Add one with `roster add`.");
        } else {
            println!("No records match \"{}\".", store.search_term());
        }
    }
    Ok(())
}

fn print_table(entries: &[Entry<'_>]) {
    if entries.is_empty() {
        return;
    }

    let header = ["#", "Name", "Surname", "Age", "Location"];
    let rows: Vec<[String; 5]> = entries
        .iter()
        .map(|entry| {
            [
                entry.position.to_string(),
                entry.record.name.clone(),
                entry.record.surname.clone(),
                entry.record.age.clone(),
                entry.record.location.clone(),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths.map(|w| "-".repeat(w));
    println!("{}", format_row(&header, &widths));
    println!("{}", format_row(&rule, &widths));
    for row in &rows {
        println!("{}", format_row(row, &widths));
    }
}

fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn report_save(store: &RecordStore<SqliteStore>, outcome: SaveOutcome) {
    let position = outcome.position();
    let verb = match outcome {
        SaveOutcome::Appended { .. } => "Added",
        SaveOutcome::Replaced { .. } => "Updated",
    };
    if let Some(record) = store.get(position) {
        println!("{verb} record {position}: {record}");
    }
}

fn handle_add(config: &Config, cmd: &AddCommand) -> Result<()> {
    let mut store = open_store(config)?;
    store.open_form();
    store.set_fields(cmd.fields.provided());
    let outcome = store.submit_draft()?;
    report_save(&store, outcome);
    Ok(())
}

fn handle_edit(config: &Config, cmd: &EditCommand) -> Result<()> {
    let mut store = open_store(config)?;
    let outcome = store.update_at(cmd.position, cmd.fields.provided())?;
    report_save(&store, outcome);
    Ok(())
}

fn handle_delete(config: &Config, cmd: &DeleteCommand) -> Result<()> {
    let mut store = open_store(config)?;
    match store.delete_at(cmd.position)? {
        Some(record) => println!("Deleted record {}: {record}", cmd.position),
        None => println!(
            "No record at position {} ({} records stored).",
            cmd.position,
            store.len()
        ),
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.backend().stats()?;
    let last_write = store.backend().updated_at(store.key())?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "collection_key": store.key(),
            "records": store.len(),
            "last_write": last_write,
            "stored_keys": stats.total_keys,
            "stored_bytes": stats.value_bytes,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("roster status");
        println!("-------------");
        println!("Database:      {}", config.database_path().display());
        println!("Key:           {}", store.key());
        println!("Records:       {}", store.len());
        match last_write {
            Some(at) => println!("Last write:    {}", at.to_rfc3339()),
            None => println!("Last write:    never"),
        }
        println!("Database size: {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Collection key:     {}", config.storage.collection_key);
                println!(
                    "  Skip unchanged:     {}",
                    config.storage.skip_unchanged_writes
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
