//! Command implementations for the qdl CLI.
//!
//! Each run resolves configuration once, performs at most one operation
//! (API fetch or config file management) and writes its result. The client
//! and cache handler are built per run from the resolved settings; nothing
//! is held as process-wide state.

use std::path::Path;

use crate::cache::FileCache;
use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::resolver::{self, Locations, Resolved, TemplateOutcome, CONFIG_FILE_NAME};
use crate::config::schema::Settings;
use crate::output;
use crate::quandl::{Client, QueryOptions, GET_OPTION_NAMES};
use crate::Result;

/// Resolve configuration and dispatch the parsed command.
pub fn run(cli: Cli) -> Result<()> {
    let locations = Locations::discover()?;
    let resolved = resolver::resolve(cli.to_config_map(), &locations)?;
    let settings = resolved.settings()?;

    match &cli.command {
        Some(Commands::Get { symbols, .. }) => get(symbols, &resolved, &settings)?,
        Some(Commands::List { source, .. }) => list(source, &settings)?,
        Some(Commands::Search { query, .. }) => search(query, &settings)?,
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init => config_init(&locations),
            ConfigCommands::Show => config_show(&locations),
        },
        None => {
            // Bare `qdl --debug` resolves and dumps; anything else gets help.
            if !settings.debug {
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
            }
        }
    }

    if settings.debug {
        show_args(&resolved);
    }
    Ok(())
}

/// Download symbol data and write it to stdout or file.
fn get(symbols: &[String], resolved: &Resolved, settings: &Settings) -> Result<()> {
    let mut client = client_for(settings);
    let opts = QueryOptions::from_config(&resolved.values, GET_OPTION_NAMES);

    let payload = if symbols.len() == 1 {
        client.get_symbol(&symbols[0], settings.format, &opts)?
    } else {
        client.get_symbols(symbols, settings.format, &opts)?
    };

    output::write_payload(&payload, settings.format, settings.out.as_deref())?;
    show_last_url(settings, &client);
    Ok(())
}

/// Download the dataset list for a source.
fn list(source: &str, settings: &Settings) -> Result<()> {
    let mut client = client_for(settings);

    let payload = client.get_list(source, settings.format, settings.page, settings.per_page)?;

    output::write_payload(&payload, settings.format, settings.out.as_deref())?;
    show_last_url(settings, &client);
    Ok(())
}

/// Download search results for a query.
fn search(query: &str, settings: &Settings) -> Result<()> {
    let mut client = client_for(settings);

    let payload = client.get_search(query, settings.format, settings.page, settings.per_page)?;

    output::write_payload(&payload, settings.format, settings.out.as_deref())?;
    show_last_url(settings, &client);
    Ok(())
}

fn client_for(settings: &Settings) -> Client {
    let cache = FileCache::new(&settings.cache_dir, settings.cache_minutes);
    Client::new(settings.apikey.clone(), cache)
}

fn show_last_url(settings: &Settings, client: &Client) {
    if settings.show_url {
        if let Some(url) = &client.last_url {
            println!("\nQuandl URL:\n{}", url);
        }
    }
}

/// Create the sample config file in the working directory.
///
/// None of the outcomes is fatal; each is reported as a summary message.
fn config_init(locations: &Locations) {
    match resolver::write_template(locations) {
        TemplateOutcome::Created => {
            println!("Sample config file created here:");
            println!("{}", locations.working.display());
        }
        TemplateOutcome::AlreadyExists => {
            println!("Config file already exists:");
            println!("{}", locations.working.display());
        }
        TemplateOutcome::Failed(reason) => {
            println!("Error - cannot create config file: {}", reason);
        }
    }
    println!();
    println!("You may edit it and use any of the long-form options (--options) in it.");
    println!("Arguments given on the command line override any config file value.");
}

/// Show the three config file locations and whether each exists.
fn config_show(locations: &Locations) {
    println!(
        "qdl looks for {} in three folders. Working-directory values",
        CONFIG_FILE_NAME
    );
    println!("take precedence over home-directory values, and home-directory");
    println!("values take precedence over values next to the executable.");
    println!();
    print_location("Working Directory", &locations.working);
    print_location("Home Directory", &locations.home);
    print_location("Executable Directory", &locations.executable);
}

fn print_location(label: &str, path: &Path) {
    let status = if path.exists() { "Found" } else { "Not Found" };
    println!("  {}: ({})", label, status);
    println!("  {}", path.display());
    println!();
}

/// Dump every resolved argument with its value and provenance (`--debug`).
fn show_args(resolved: &Resolved) {
    println!("\nRegistered Arguments:");
    for (key, value) in resolved.values.iter() {
        let source = resolved
            .source_of(key)
            .map(|s| s.to_string())
            .unwrap_or_default();
        println!("  {:<20} {:<16} ({})", key, value.to_string(), source);
    }
}
