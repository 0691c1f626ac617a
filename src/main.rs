use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warbler::config::{AppConfig, CliConfig, FileConfig};
use warbler::scanner::{ScanReport, Scanner};
use warbler::store::{Library, MediaStore, NullText};

/// Resolve a CLI path argument to an absolute path. A path that does not
/// exist yet (a fresh database file) is kept as given and anchored to the
/// current directory.
fn parse_path(s: &str) -> Result<PathBuf> {
    let given = PathBuf::from(s);
    let resolved = match given.canonicalize() {
        Ok(path) => path,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => given,
        Err(err) => {
            return Err(err).with_context(|| format!("Error resolving path: {}", s));
        }
    };
    if resolved.is_absolute() {
        Ok(resolved)
    } else {
        Ok(std::env::current_dir()?.join(resolved))
    }
}

#[derive(Parser, Debug)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")))]
struct CliArgs {
    /// Path to the SQLite catalogue database file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// External inspector invoked to probe media durations.
    #[clap(long)]
    pub probe_command: Option<String>,

    /// Default logging level; the LOG_LEVEL env var still takes precedence.
    #[clap(long)]
    pub logging_level: Option<String>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a library root for ingestion. The path must be absolute.
    AddLibrary {
        name: String,
        #[clap(value_parser = parse_path)]
        path: PathBuf,
    },
    /// List registered libraries.
    Libraries,
    /// Scan one library by name, or every library when no name is given.
    Scan { name: Option<String> },
    /// Count rows in one catalogue table.
    Count { table: String },
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: cli_args.db_path.clone(),
        probe_command: cli_args.probe_command.clone(),
        logging_level: cli_args.logging_level.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let default_level = config
        .logging_level
        .as_deref()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("Opening catalogue database at {:?}...", config.db_path);
    let store = MediaStore::open(&config.db_path)?;

    match cli_args.command {
        Command::AddLibrary { name, path } => {
            let library = store.add_library(&name, &path)?;
            println!(
                "registered library {} ({}) at {}",
                library.name, library.id, library.fs_path
            );
        }
        Command::Libraries => {
            for library in store.libraries()? {
                println!("{}\t{}\t{}", library.id, library.name, library.fs_path);
            }
        }
        Command::Scan { name } => {
            let scanner = Scanner::with_default_tooling(&store, &config.probe_command)?;
            match name {
                Some(name) => {
                    let filter = Library {
                        name: NullText::new(name.as_str()),
                        ..Default::default()
                    };
                    let library = store
                        .read(&filter, &[])?
                        .pop()
                        .ok_or_else(|| anyhow::anyhow!("no library named {:?}", name))?;
                    let report = scanner.scan_library(&library)?;
                    print_report(&library, &report);
                }
                None => {
                    for (library, report) in scanner.scan_all()? {
                        print_report(&library, &report);
                    }
                }
            }
        }
        Command::Count { table } => {
            println!("{}", store.count_table(&table)?);
        }
    }

    Ok(())
}

fn print_report(library: &Library, report: &ScanReport) {
    println!(
        "{}: {} songs added, {} skipped, {} images, {} failures",
        library.name,
        report.songs_added,
        report.songs_skipped,
        report.images_added,
        report.failures
    );
}
