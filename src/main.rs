use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use agency_directory::{
    initialize, logging, Config, DirectoryError, DirectoryService, Person, SearchQuery,
};

#[derive(Parser)]
#[command(name = "agency-directory", version, about = "Clearance-gated people directory")]
struct Cli {
    /// SQLite database path (overrides DIRECTORY_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the schema and seed reference data if empty
    Init,
    /// Free-text search over people
    Search { query: String },
    /// Show one person by id
    Show {
        id: i64,
        /// Caller clearance level
        #[arg(long, default_value_t = 1)]
        level: i64,
    },
    /// Look a person up by alias
    Alias { alias: String },
    /// Show one location by id
    Location { id: i64 },
    /// List protocols for a location
    Protocols {
        location_id: i64,
        #[arg(long)]
        agent: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    logging::init(&config.log);

    let store = config.open_store().context("Failed to open record store")?;
    let report = initialize(&*store).context("Failed to initialize record store")?;
    let directory = DirectoryService::new(Arc::clone(&store));

    match cli.command {
        Command::Init => {
            if report.skipped() {
                println!("✓ Store already populated ({} people)", store.person_count()?);
            } else {
                println!(
                    "✓ Seeded {} locations, {} people, {} protocols",
                    report.locations, report.people, report.protocols
                );
            }
        }
        Command::Search { query } => {
            let hits = directory.search(&query, None)?;
            println!("🔎 {} match(es) for {:?}", hits.len(), query);
            let needle = SearchQuery::new(&query);
            for hit in hits {
                print_person(&hit.person);
                if !needle.is_empty() {
                    println!("        matched on {}", needle.matching_fields(&hit.person).join(", "));
                }
            }
        }
        Command::Show { id, level } => match directory.get_by_id(id, level) {
            Ok(person) => print_person(&person),
            Err(DirectoryError::AccessDenied { required, provided }) => {
                eprintln!("⛔ Access denied: level {} required, {} provided", required, provided);
                std::process::exit(3);
            }
            Err(DirectoryError::NotFound(message)) => {
                eprintln!("❌ {}", message);
                std::process::exit(2);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Alias { alias } => match directory.get_by_alias(&alias) {
            Ok(person) => print_person(&person),
            Err(DirectoryError::NotFound(message)) => {
                eprintln!("❌ {}", message);
                std::process::exit(2);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Location { id } => match directory.get_location(id) {
            Ok(location) => println!(
                "{} #{} {} ({}, {})",
                if location.is_venue() { "🏨" } else { "🏙️" },
                location.id,
                location.display_name(),
                location.country,
                location.currency
            ),
            Err(DirectoryError::NotFound(message)) => {
                eprintln!("❌ {}", message);
                std::process::exit(2);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Protocols { location_id, agent } => {
            let protocols = directory.list_protocols_by_location(location_id, agent.as_deref())?;
            println!("📜 {} protocol(s) for location {}", protocols.len(), location_id);
            for protocol in protocols {
                println!("  [{}] {} - {}", protocol.id, protocol.title, protocol.concise_guideline);
            }
        }
    }

    Ok(())
}

fn print_person(person: &Person) {
    let alias = person
        .alias
        .as_deref()
        .map(|a| format!(" \"{}\"", a))
        .unwrap_or_default();
    println!(
        "  #{:<3} {}{} | {} | {} | level {}",
        person.id, person.full_name, alias, person.affiliation, person.category, person.access_level
    );
}
