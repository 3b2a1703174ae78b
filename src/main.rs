//! eavstore CLI - inspect and maintain an attribute store

use clap::{Parser, Subcommand};
use eavstore::attribute::{LocalizedValue, TypeDefinition, TypeMap};
use eavstore::config::{self, EavConfig};
use eavstore::storage::SqliteStore;
use eavstore::{ui, Locale};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "eavstore")]
#[command(version)]
#[command(about = "Entity-Attribute-Value store for typed, multi-valued, multi-lingual attributes")]
#[command(long_about = r#"
eavstore keeps schema-less attributes for arbitrary owners in SQLite:
  • Class-wide attribute types with per-instance overrides
  • Multi-valued and multi-lingual values
  • Locale resolution against a ranked list of preferred locales

Example usage:
  eavstore import-types --class Product --file types.json
  eavstore show --class Product --id 42 --locale fr_CA --locale en
  eavstore find --class Product --name sku --value A-1001
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Init,

    /// Show the effective types of an owner class or instance
    Types {
        /// Owner class
        #[arg(long)]
        class: String,

        /// Owner instance id (class-wide types only when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Replace the types of one scope from a JSON file
    ImportTypes {
        /// Owner class
        #[arg(long)]
        class: String,

        /// Owner instance id (class-wide scope when omitted)
        #[arg(long)]
        id: Option<String>,

        /// JSON array of type definitions
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the attributes of an owner as JSON
    Show {
        /// Owner class
        #[arg(long)]
        class: String,

        /// Owner id
        #[arg(long)]
        id: String,

        /// Preferred locales; translations are resolved when given
        #[arg(short, long)]
        locale: Vec<String>,
    },

    /// Find owners by attribute value
    Find {
        /// Owner class
        #[arg(long)]
        class: String,

        /// Attribute name
        #[arg(short, long)]
        name: String,

        /// Exact stored value
        #[arg(long)]
        value: String,
    },

    /// Remove every attribute of an owner
    Remove {
        /// Owner class
        #[arg(long)]
        class: String,

        /// Owner id
        #[arg(long)]
        id: String,
    },

    /// Resolve a localized text for the preferred locales
    Localize {
        /// Text group
        #[arg(short, long)]
        group: String,

        /// Text code
        #[arg(long)]
        code: String,

        /// Preferred locales
        #[arg(short, long)]
        locale: Vec<String>,
    },
}

fn parse_locales(locales: &[String]) -> anyhow::Result<Vec<Locale>> {
    locales
        .iter()
        .map(|l| Locale::parse(l).map_err(Into::into))
        .collect()
}

fn open_store(cli_database: Option<PathBuf>, config: &EavConfig) -> anyhow::Result<SqliteStore> {
    let database = cli_database
        .or_else(|| config.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_database_path);
    config::ensure_db_dir(&database)?;
    tracing::debug!("Opening {:?}", database);
    Ok(SqliteStore::open(&database, config.store_options()?)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let mut store = open_store(cli.database, &config)?;

    match cli.command {
        Commands::Init => {
            let stats = store.stats()?;
            ui::header("Attribute store ready");
            let types = stats.types.to_string();
            let attributes = stats.attributes.to_string();
            let translations = stats.translations.to_string();
            let localized = stats.localized_texts.to_string();
            println!(
                "{}",
                ui::stats_table(&[
                    ("Types", types.as_str()),
                    ("Attribute rows", attributes.as_str()),
                    ("Translations", translations.as_str()),
                    ("Localized texts", localized.as_str()),
                ])
            );
            ui::info("Default locale", &store.resolver().default_locale().to_string());
        }

        Commands::Types { class, id } => {
            let types = store.load_types(&class, id.as_deref())?;
            if types.is_empty() {
                ui::warn(&format!("No types defined for {}", class));
            } else {
                ui::section(&format!(" {} ", class));
                println!("{}", ui::types_table(&types));
            }
        }

        Commands::ImportTypes { class, id, file } => {
            let contents = std::fs::read_to_string(&file)?;
            let definitions: Vec<TypeDefinition> = serde_json::from_str(&contents)?;
            let types = definitions
                .iter()
                .map(|def| def.resolve(&store.options().registry))
                .collect::<eavstore::Result<TypeMap>>()?;
            store.save_types(&class, id.as_deref(), &types)?;
            ui::success(&format!("Imported {} types for {}", types.len(), class));
        }

        Commands::Show { class, id, locale } => {
            let attrs = store.load_attributes(&class, &id)?;
            if attrs.is_empty() {
                ui::warn(&format!("No attributes stored for {}/{}", class, id));
                return Ok(());
            }

            let json = if locale.is_empty() {
                serde_json::to_string_pretty(&attrs)?
            } else {
                let preferred = parse_locales(&locale)?;
                let resolved: BTreeMap<&String, LocalizedValue> = attrs
                    .iter()
                    .map(|(name, value)| (name, value.localize(&preferred, store.resolver())))
                    .collect();
                serde_json::to_string_pretty(&resolved)?
            };
            println!("{}", json);
        }

        Commands::Find { class, name, value } => {
            let owners = store.find_owner_id(&class, &name, &value)?;
            if owners.is_empty() {
                ui::warn("No matching owners");
            }
            for owner in owners {
                println!("{}", owner);
            }
        }

        Commands::Remove { class, id } => {
            store.remove_attributes(&class, &id)?;
            ui::success(&format!("Removed attributes of {}/{}", class, id));
        }

        Commands::Localize { group, code, locale } => {
            let preferred = parse_locales(&locale)?;
            match store.localize(&group, &code, &preferred)? {
                Some(message) => println!("{} {}", ui::Icons::GLOBE, message),
                None => ui::error(&format!("No localized text for {}:{}", group, code)),
            }
        }
    }

    Ok(())
}
