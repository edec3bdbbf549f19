//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::adapters::csv_adapter::CsvBarParser;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_store::MemoryStore;
use crate::adapters::source_adapter::{FileSource, HttpSource};
use crate::domain::config_validation::{
    Backend, backend, default_instrument, fetch_timeout, strategy_from_config, validate_config,
};
use crate::domain::error::CrossoverError;
use crate::domain::ingest::{IngestReport, ingest};
use crate::domain::signal::PerformanceSummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::record_store::RecordStore;
use crate::ports::source_port::SourcePort;

const DEFAULT_LOG_FILTER: &str = "crossover=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(name = "crossover", about = "OHLCV store and SMA crossover signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the JSON API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load bars from a CSV file or URL into the store
    Ingest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        instrument: Option<String>,
    },
    /// Run the crossover engine over stored bars and print the summary
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
        #[arg(long)]
        short: Option<i64>,
        #[arg(long)]
        long: Option<i64>,
    },
    /// Print stored bars
    List {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();

    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Ingest {
            config,
            url,
            file,
            instrument,
        } => run_ingest(&config, url, file, instrument).map(|report| {
            println!(
                "inserted {} bars ({} parsed, {} skipped, {} duplicates)",
                report.inserted, report.parsed, report.skipped, report.duplicates
            );
        }),
        Command::Signal {
            config,
            instrument,
            short,
            long,
        } => run_signal(&config, instrument, short, long).and_then(|summary| {
            let json = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
            println!("{json}");
            Ok(())
        }),
        Command::List { config, instrument } => run_list(&config, instrument.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Installs the global subscriber once. Logs go to stderr so command output
/// on stdout stays machine-readable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, CrossoverError> {
    FileConfigAdapter::from_file(path)
}

/// Opens the configured backend with its schema in place.
pub fn open_store(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn RecordStore + Send + Sync>, CrossoverError> {
    match backend(config)? {
        Backend::Memory => Ok(Arc::new(MemoryStore::new())),
        Backend::Sqlite => open_sqlite(config),
        Backend::Postgres => open_postgres(config),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn RecordStore + Send + Sync>, CrossoverError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(
    _config: &dyn ConfigPort,
) -> Result<Arc<dyn RecordStore + Send + Sync>, CrossoverError> {
    Err(feature_required("sqlite"))
}

#[cfg(feature = "postgres")]
fn open_postgres(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn RecordStore + Send + Sync>, CrossoverError> {
    use crate::adapters::postgres_adapter::PostgresAdapter;

    let store = PostgresAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(
    _config: &dyn ConfigPort,
) -> Result<Arc<dyn RecordStore + Send + Sync>, CrossoverError> {
    Err(feature_required("postgres"))
}

#[allow(dead_code)]
fn feature_required(feature: &str) -> CrossoverError {
    CrossoverError::ConfigInvalid {
        section: "database".into(),
        key: "backend".into(),
        reason: format!("built without the {feature} feature"),
    }
}

fn run_validate(config_path: &PathBuf) -> Result<(), CrossoverError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;
    println!("Config validated successfully");
    Ok(())
}

pub fn run_ingest(
    config_path: &PathBuf,
    url: Option<String>,
    file: Option<PathBuf>,
    instrument: Option<String>,
) -> Result<IngestReport, CrossoverError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let source: Box<dyn SourcePort> = match file {
        Some(path) => Box::new(FileSource::new(path)),
        None => {
            let url = match url {
                Some(url) => url,
                None => config.require_string("ingest", "source_url")?,
            };
            let timeout = fetch_timeout(&config)?;
            Box::new(HttpSource::new(url).with_timeout(timeout))
        }
    };

    let instrument = match instrument {
        Some(i) => i.trim().to_string(),
        None => default_instrument(&config)?,
    };

    let store = open_store(&config)?;
    ingest(source.as_ref(), &CsvBarParser, store.as_ref(), &instrument)
}

pub fn run_signal(
    config_path: &PathBuf,
    instrument: Option<String>,
    short: Option<i64>,
    long: Option<i64>,
) -> Result<PerformanceSummary, CrossoverError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let strategy = strategy_from_config(&config)?.with_overrides(short, long)?;
    let instrument = match instrument {
        Some(i) => i,
        None => default_instrument(&config)?,
    };

    let store = open_store(&config)?;
    let bars = store.list(&instrument)?;
    info!(instrument = %instrument, bars = bars.len(), strategy = %strategy.name(), "evaluating");

    strategy.evaluate_bars(&bars)
}

fn run_list(config_path: &PathBuf, instrument: Option<&str>) -> Result<(), CrossoverError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let store = open_store(&config)?;
    let bars = match instrument {
        Some(i) => store.list(i)?,
        None => store.list_all()?,
    };

    println!("id\ttimestamp\tinstrument\topen\thigh\tlow\tclose\tvolume");
    for stored in &bars {
        let bar = &stored.bar;
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            stored.id,
            bar.timestamp,
            bar.instrument,
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }
    eprintln!("{} bars", bars.len());
    Ok(())
}

#[cfg(feature = "web")]
fn run_serve(config_path: &PathBuf) -> Result<(), CrossoverError> {
    use crate::adapters::web::{AppState, build_router};
    use crate::domain::config_validation::listen_addr;

    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let addr = listen_addr(&config)?;
    let state = AppState {
        store: open_store(&config)?,
        strategy: strategy_from_config(&config)?,
        default_instrument: default_instrument(&config)?,
    };
    let router = build_router(state);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "listening");
        axum::serve(listener, router).await?;
        Ok::<(), CrossoverError>(())
    })
}

#[cfg(not(feature = "web"))]
fn run_serve(config_path: &PathBuf) -> Result<(), CrossoverError> {
    let _ = config_path;
    Err(CrossoverError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: "built without the web feature".into(),
    })
}
