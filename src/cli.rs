use crate::{config::Config, console};

use anyhow::Result;
use clap::{Parser, Subcommand};
use raydb_application::{
    prelude::reindex,
    reports::{self, BuildingNote},
    transfer,
};
use raydb_chat::Bot;
use raydb_core::{gateways::messenger::Messenger, usecases};
use raydb_db_sqlite::Connections;
use raydb_db_tantivy::SearchEngine;
use raydb_gateways::{JsonFileOutbox, LogMessenger};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write as _},
    path::PathBuf,
    time::Duration,
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "raydb", version, about = "Directory of places in a residential block")]
struct Args {
    /// Configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// URL to the database
    #[arg(long, global = true, value_name = "DATABASE_URL")]
    db_url: Option<String>,
    /// File system directory for the full-text search index
    #[arg(long, global = true, value_name = "INDEX_DIR")]
    idx_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer chat events read from stdin
    Chat,
    /// Rebuild the search index from the database
    Reindex,
    /// Write all places into a GeoJSON file
    ExportGeojson { file: PathBuf },
    /// Replace all places with the contents of a GeoJSON file
    ImportGeojson { file: PathBuf },
    /// Write a tab-separated sheet for tagging places
    ExportTags { file: PathBuf },
    /// Apply the tags of an edited sheet
    ImportTags {
        file: PathBuf,
        /// Where to write tags missing from the configuration
        #[arg(long, value_name = "FILE")]
        unknown: Option<PathBuf>,
    },
    /// List places with missing values
    Missing,
    /// Check apartment lists and building photos
    Buildings,
    /// Count places and pending changes
    Stats,
}

pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = Config::try_load_from_file_or_default(args.config.as_ref())?;
    if let Some(db_url) = args.db_url {
        cfg.db.conn_sqlite = db_url;
    }
    if let Some(idx_dir) = args.idx_dir {
        cfg.db.index_dir = Some(idx_dir);
    }

    info!("Connecting to SQLite database {}", cfg.db.conn_sqlite);
    let connections = Connections::init(&cfg.db.conn_sqlite, cfg.db.conn_pool_size.into())?;
    raydb_db_sqlite::run_embedded_database_migrations(connections.exclusive()?)?;
    let mut search_engine = SearchEngine::init_with_path(cfg.db.index_dir.as_ref())?;

    match args.command {
        Command::Chat => {
            let messenger: Box<dyn Messenger> = match &cfg.outbox_dir {
                Some(dir) => {
                    let outbox = JsonFileOutbox::try_new(dir)?;
                    info!("Writing outgoing messages to {}", outbox.path().display());
                    Box::new(outbox)
                }
                None => Box::new(LogMessenger::new()),
            };
            let bot = Bot::new(connections, search_engine, messenger, cfg.bot_config());
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(console::run(bot, SWEEP_INTERVAL))?;
        }
        Command::Reindex => {
            let count = reindex(&connections, &mut search_engine, &cfg.tags)?;
            println!("Indexed {count} places.");
        }
        Command::ExportGeojson { file } => {
            let writer = BufWriter::new(File::create(&file)?);
            let count = transfer::export_geojson(&connections, writer)?;
            println!("Exported {count} places to {}.", file.display());
        }
        Command::ImportGeojson { file } => {
            let reader = BufReader::new(File::open(&file)?);
            let count =
                transfer::import_geojson(&connections, &mut search_engine, &cfg.tags, reader)?;
            println!("Imported {count} places.");
        }
        Command::ExportTags { file } => {
            let writer = BufWriter::new(File::create(&file)?);
            let count = transfer::export_tags(&connections, &cfg.tags, writer)?;
            println!("Exported {count} places to {}.", file.display());
        }
        Command::ImportTags { file, unknown } => {
            let reader = BufReader::new(File::open(&file)?);
            let result =
                transfer::import_tags(&connections, &mut search_engine, &cfg.tags, reader)?;
            eprintln!("Updated the tag of {} places.", result.updated.len());
            if !result.unknown.is_empty() {
                let table = unknown_tags_table(result.unknown)?;
                match unknown {
                    Some(path) => File::create(path)?.write_all(table.as_bytes())?,
                    None => io::stdout().write_all(table.as_bytes())?,
                }
            }
        }
        Command::Missing => {
            for missing in reports::missing_values(&connections)? {
                print!("{missing}");
            }
        }
        Command::Buildings => {
            let mut notes = reports::check_apartments(&cfg.address);
            match &cfg.photos_dir {
                Some(dir) => notes.extend(reports::check_building_photos(
                    &connections,
                    &cfg.address,
                    dir,
                )?),
                None => warn!("No photo directory configured, skipping the photo check"),
            }
            print_notes(&notes);
        }
        Command::Stats => {
            let stats = usecases::get_stats(&connections.shared()?)?;
            println!(
                "{} places, {} buildings, {} entrances, {} changes waiting",
                stats.pois.pois, stats.pois.buildings, stats.pois.entrances, stats.queue
            );
        }
    }
    Ok(())
}

/// Renders tags in the form of the `[tags]` configuration section,
/// with the sheet type as the only keyword.
fn unknown_tags_table(unknown: BTreeMap<String, String>) -> Result<String> {
    let tags: BTreeMap<_, _> = unknown
        .into_iter()
        .map(|(tag, kind)| {
            let keywords: Vec<_> = Some(kind).filter(|k| !k.is_empty()).into_iter().collect();
            (tag, keywords)
        })
        .collect();
    let section = BTreeMap::from([("tags", tags)]);
    Ok(toml::to_string(&section)?)
}

fn print_notes(notes: &[BuildingNote]) {
    for note in notes {
        println!("{note}");
    }
}
