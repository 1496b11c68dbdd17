//! `commsheet` - CLI for the comm-sheet engine
//!
//! Generates radio-phraseology sheets for a route, layered with the user's
//! personal library of edits, and manages that library from the terminal.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;
use tracing::warn;

use commsheet::call::{CallKind, FlightRules};
use commsheet::cli::{
    AirportsCommand, Cli, Command, ConfigCommand, GenerateCommand, LibraryCommand, SheetsCommand,
};
use commsheet::dataset::{AirportDirectory, MasterLibrary};
use commsheet::engine::Engine;
use commsheet::route::{Intention, Route, Stop};
use commsheet::sheet::{row_spacing, RowSpacing, Sheet};
use commsheet::store::Store;
use commsheet::{init_logging, Config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Generate(cmd) => handle_generate(&config, &cmd),
        Command::Library(cmd) => handle_library(&config, &cmd),
        Command::Sheets(cmd) => handle_sheets(&config, &cmd),
        Command::Airports(cmd) => {
            handle_airports(&config, &cmd);
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Open the override store, degrading to an in-memory store rather than
/// refusing to run.
fn open_store(config: &Config) -> Result<Store, Box<dyn std::error::Error>> {
    match Store::open(config.store_path()) {
        Ok(store) => Ok(store),
        Err(err) => {
            warn!("failed to open store, customizations will not persist: {err}");
            Ok(Store::open_in_memory()?)
        }
    }
}

fn resolve_airport(
    directory: &AirportDirectory,
    id: &str,
) -> Result<commsheet::dataset::Airport, Box<dyn std::error::Error>> {
    directory
        .get(id)
        .cloned()
        .ok_or_else(|| format!("unknown airport: {id}").into())
}

fn parse_via(
    directory: &AirportDirectory,
    entry: &str,
) -> Result<Stop, Box<dyn std::error::Error>> {
    let (id, intention) = match entry.split_once(':') {
        Some((id, raw)) => {
            let intention = match raw {
                "touch_and_go" => Intention::TouchAndGo,
                "stop_and_go" => Intention::StopAndGo,
                "full_stop" => Intention::FullStop,
                "taxi_back" => Intention::TaxiBack,
                other => {
                    return Err(format!(
                        "unknown intention '{other}' (expected touch_and_go, \
                         stop_and_go, full_stop, or taxi_back)"
                    )
                    .into())
                }
            };
            (id, Some(intention))
        }
        None => (entry, None),
    };
    Ok(Stop::intermediate(resolve_airport(directory, id)?, intention))
}

fn handle_generate(
    config: &Config,
    cmd: &GenerateCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let rules = FlightRules::parse(&cmd.rules)
        .ok_or_else(|| format!("unknown flight rules '{}' (expected vfr or ifr)", cmd.rules))?;

    let store = open_store(config)?;
    let library = MasterLibrary::load(config.master_calls_path());
    let directory = AirportDirectory::load(config.airports_path());

    let mut stops = vec![Stop::departure(resolve_airport(&directory, &cmd.from)?)];
    for entry in &cmd.via {
        stops.push(parse_via(&directory, entry)?);
    }
    stops.push(Stop::arrival(resolve_airport(&directory, &cmd.to)?));
    let route = Route::new(stops);

    let generation = Engine::new(&library, &store).generate(&route, rules);
    let sheet = Sheet::from_generation(generation, cmd.callsign.clone(), rules, route);

    if !cmd.callsign.trim().is_empty() {
        store.add_call_sign(&cmd.callsign, config.sheet.callsign_history_limit);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&sheet)?);
    } else {
        print!("{}", render_sheet(&sheet, cmd.atc));
    }
    Ok(())
}

/// Render a sheet as plain text, substituting template variables and
/// keeping grouped calls tight.
fn render_sheet(sheet: &Sheet, include_atc: bool) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let route_ids: Vec<&str> = sheet
        .route
        .stops
        .iter()
        .filter_map(|s| s.airport.as_ref())
        .map(|a| a.id.as_str())
        .collect();
    let call_sign = if sheet.call_sign.trim().is_empty() {
        "[Call Sign]"
    } else {
        sheet.call_sign.trim()
    };
    let _ = writeln!(
        out,
        "Comm Sheet - {} ({}) {}",
        call_sign,
        sheet.flight_rules.to_string().to_uppercase(),
        route_ids.join(" -> ")
    );

    for block in &sheet.blocks {
        if sheet.hidden_blocks.contains(&block.key) {
            continue;
        }
        let calls = sheet.block_calls(block.key);
        let vars = sheet.vars_for(block);

        let _ = writeln!(out);
        match &block.context_label {
            Some(label) => {
                let _ = writeln!(out, "== {} {} [{}]", block.name, label, block.target);
            }
            None => {
                let _ = writeln!(out, "== {} [{}]", block.name, block.target);
            }
        }

        let mut prev = None;
        for call in calls {
            if sheet.hidden.contains(&call.id) {
                continue;
            }
            if call.kind == CallKind::Atc && !include_atc {
                continue;
            }
            if row_spacing(prev, call) == RowSpacing::GroupGap {
                let _ = writeln!(out);
            }
            let text = commsheet::callsign::substitute(&call.text, &vars);
            let prefix = match call.kind {
                CallKind::Radio => "  ",
                CallKind::Atc => "      ATC: ",
                CallKind::Note => "  NOTE: ",
                CallKind::Brief => "  BRIEF: ",
            };
            for (i, line) in text.lines().enumerate() {
                if i == 0 {
                    let _ = writeln!(out, "{prefix}{line}");
                } else {
                    let _ = writeln!(out, "  {line}");
                }
            }
            prev = Some(call);
        }
    }
    out
}

fn handle_library(
    config: &Config,
    cmd: &LibraryCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    match cmd {
        LibraryCommand::Show { block, json } => {
            let library = MasterLibrary::load(config.master_calls_path());
            let engine = Engine::new(&library, &store);
            let calls: Vec<_> = engine
                .effective_calls()
                .into_iter()
                .filter(|c| block.as_ref().map_or(true, |b| &c.block == b))
                .collect();

            if *json {
                println!("{}", serde_json::to_string_pretty(&calls)?);
                return Ok(());
            }

            let mut current_block = String::new();
            for call in &calls {
                if call.block != current_block {
                    current_block.clone_from(&call.block);
                    println!("\n== {current_block}");
                }
                let mut flags = String::new();
                if call.has_override {
                    flags.push_str(" (modified)");
                }
                if call.origin == commsheet::call::Origin::User {
                    flags.push_str(" (user-added)");
                }
                if call.hidden {
                    flags.push_str(" (hidden)");
                }
                println!("  [{:>6.2}] {:<5} {}{}", call.seq, call.kind, call.text, flags);
            }
        }
        LibraryCommand::Export { output } => {
            let bundle = store.snapshot();
            std::fs::write(output, serde_json::to_string_pretty(&bundle)?)?;
            println!(
                "Exported {} overrides, {} user calls, {} user blocks to {}",
                bundle.call_overrides.len(),
                bundle.user_calls.len(),
                bundle.user_blocks.len(),
                output.display()
            );
        }
        LibraryCommand::Import { input, yes } => {
            if !*yes {
                println!("Importing replaces all current customizations.");
                println!("Re-run with --yes to confirm.");
                return Ok(());
            }
            let raw = std::fs::read_to_string(input)?;
            let bundle = serde_json::from_str(&raw)?;
            store.restore(&bundle);
            println!("Library imported from {}", input.display());
        }
        LibraryCommand::RestoreDefaults { yes } => {
            if !*yes {
                println!("This resets all edits, reorderings, hides, and block changes.");
                println!("User-added calls and blocks are kept. Re-run with --yes to confirm.");
                return Ok(());
            }
            store.restore_defaults();
            println!("Library restored to defaults.");
        }
        LibraryCommand::SetDefault => {
            store.set_default_bundle(&store.snapshot());
            println!("Current library promoted as the session default.");
        }
        LibraryCommand::ClearDefault => {
            store.clear_default_bundle();
            println!("Default library cleared.");
        }
    }
    Ok(())
}

fn handle_sheets(
    config: &Config,
    cmd: &SheetsCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    match cmd {
        SheetsCommand::List => {
            let sheets = store.saved_sheets();
            if sheets.is_empty() {
                println!("No saved sheets.");
                return Ok(());
            }
            for sheet in sheets {
                println!(
                    "{}  {}  ({}, {})",
                    sheet.id,
                    sheet.name,
                    sheet.call_sign,
                    sheet.saved_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        SheetsCommand::Delete { id } => {
            store.delete_sheet(id);
            println!("Deleted sheet {id} (if it existed).");
        }
    }
    Ok(())
}

fn handle_airports(config: &Config, cmd: &AirportsCommand) {
    let directory = AirportDirectory::load(config.airports_path());
    let results = directory.search(&cmd.query);
    if results.is_empty() {
        println!("No airports match \"{}\".", cmd.query);
        return;
    }
    for airport in results {
        println!(
            "{:<5} {} ({}, {}) - {}, runways {}",
            airport.id,
            airport.name,
            airport.city,
            airport.state,
            if airport.towered { "towered" } else { "non-towered" },
            airport.runways.join("/")
        );
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Data]");
                println!("  Store path:         {}", config.store_path().display());
                println!(
                    "  Master calls path:  {}",
                    config.master_calls_path().display()
                );
                println!("  Airports path:      {}", config.airports_path().display());
                println!();
                println!("[Sheet]");
                println!("  Undo depth:         {}", config.sheet.undo_depth);
                println!(
                    "  Call sign history:  {}",
                    config.sheet.callsign_history_limit
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
