//! `placectl` - CLI for placestore
//!
//! This binary provides the command-line interface for saving, editing and
//! listing places in the local place database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use placestore::cli::{
    render, AddCommand, Cli, Command, ConfigCommand, EditCommand, IdCommand, ListCommand,
    MapCommand, OutputFormat, StatsCommand,
};
use placestore::map::{annotations, Region};
use placestore::{init_logging, Config, ListQuery, Place, PlaceStore};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Some(database) = cli.database {
        config.storage.database_path = Some(database);
    }

    // Configuration commands never touch the database.
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        other => other,
    };

    let store = PlaceStore::from_config(&config)
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    debug!("Running {command:?}");

    let result = match command {
        Command::Add(cmd) => handle_add(&store, &cmd),
        Command::Edit(cmd) => handle_edit(&store, &cmd),
        Command::Favorite(cmd) => handle_favorite(&store, &cmd),
        Command::Delete(cmd) => handle_delete(&store, &cmd),
        Command::List(cmd) => handle_list(&store, &cmd, config.default_query()),
        Command::Show(cmd) => handle_show(&store, &cmd),
        Command::Map(cmd) => handle_map(&store, &cmd),
        Command::Stats(cmd) => handle_stats(&store, &cmd),
        Command::Config(_) => Ok(()),
    };

    // Close even when the command failed, but report the command's error first.
    let closed = store.close().context("closing database");
    result.and(closed)
}

fn print_place(place: &Place, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(place)?);
    } else {
        println!("{}", render::place_line(place));
    }
    Ok(())
}

fn handle_add(store: &PlaceStore, cmd: &AddCommand) -> anyhow::Result<()> {
    let draft = cmd.to_draft();
    draft.validate()?;
    let place = store.create(&draft)?;
    print_place(&place, cmd.json)
}

fn handle_edit(store: &PlaceStore, cmd: &EditCommand) -> anyhow::Result<()> {
    let patch = cmd.to_patch();
    if patch.is_empty() && !cmd.json {
        eprintln!("Nothing to change.");
    }
    let place = store.update(cmd.id, &patch)?;
    print_place(&place, cmd.json)
}

fn handle_favorite(store: &PlaceStore, cmd: &IdCommand) -> anyhow::Result<()> {
    let place = store.toggle_favorite(cmd.id)?;
    print_place(&place, cmd.json)
}

fn handle_delete(store: &PlaceStore, cmd: &IdCommand) -> anyhow::Result<()> {
    store.delete(cmd.id)?;
    if cmd.json {
        let deleted = serde_json::json!({ "deleted": cmd.id });
        println!("{}", serde_json::to_string_pretty(&deleted)?);
    } else {
        println!("Deleted place {}.", cmd.id);
    }
    Ok(())
}

fn handle_list(store: &PlaceStore, cmd: &ListCommand, default: ListQuery) -> anyhow::Result<()> {
    let places = store.list_with(&cmd.to_query(default))?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&places)?),
        OutputFormat::Table => print!("{}", render::places_table(&places)),
        OutputFormat::Plain => {
            for place in &places {
                println!("{}", render::place_line(place));
            }
        }
    }
    Ok(())
}

fn handle_show(store: &PlaceStore, cmd: &IdCommand) -> anyhow::Result<()> {
    let place = store.get(cmd.id)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&place)?);
    } else {
        print!("{}", render::place_detail(&place));
    }
    Ok(())
}

fn handle_map(store: &PlaceStore, cmd: &MapCommand) -> anyhow::Result<()> {
    let places = store.list_with(&ListQuery::new().favorites_only(cmd.favorites))?;
    let annotations = annotations(&places);
    let region = Region::overview(&places);

    if cmd.json {
        let map = serde_json::json!({
            "region": region,
            "annotations": annotations,
        });
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else if places.is_empty() {
        println!("No places to show.");
    } else {
        print!("{}", render::map_text(&annotations, region.as_ref()));
    }
    Ok(())
}

fn handle_stats(store: &PlaceStore, cmd: &StatsCommand) -> anyhow::Result<()> {
    let stats = store.stats()?;
    if cmd.json {
        let mut value = serde_json::to_value(&stats)?;
        value["database_path"] = serde_json::json!(store.path());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let database = store.path().display().to_string();
        print!("{}", render::stats_text(&stats, &database));
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
                println!("  Database path:      {}", config.database_path().display());
                println!("  Write-ahead log:    {}", config.storage.wal);
                println!();
                println!("[Events]");
                println!("  Channel capacity:   {}", config.events.channel_capacity);
                println!();
                println!("[List]");
                println!("  Sort by:            {}", config.list.sort_by);
                println!("  Order:              {}", config.list.order);
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
                Err(e) => anyhow::bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
