use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use staticconf::config::DEFAULT;
use staticconf::loader::{self, FileLoader, LoaderOptions};
use staticconf::observability::init_logging;
use staticconf::reload::{ComparatorKind, ConfigFacade, WatchSettings};

#[derive(Parser)]
#[command(name = "staticconf-cli")]
#[command(about = "Inspect and watch staticconf configuration files", long_about = None)]
struct Cli {
    /// Namespace to load into
    #[arg(short, long, default_value = DEFAULT)]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file and print its flattened keys
    Show { file: PathBuf },
    /// Load a file and report every reload until interrupted
    Watch {
        file: PathBuf,

        /// Seconds between checks
        #[arg(short, long, default_value_t = 1)]
        interval: u64,

        /// Change detectors to use (mtime, inode, md5)
        #[arg(short, long, value_parser = parse_comparator, default_values = ["mtime"])]
        comparator: Vec<ComparatorKind>,
    },
}

fn parse_comparator(name: &str) -> Result<ComparatorKind, String> {
    serde_json::from_value(Value::String(name.to_ascii_lowercase()))
        .map_err(|_| format!("unknown comparator: {name}"))
}

fn file_loader(path: &Path) -> Result<FileLoader, Box<dyn std::error::Error>> {
    loader::loader_for_path(path)
        .ok_or_else(|| format!("unsupported configuration format: {}", path.display()).into())
}

fn print_data(data: &staticconf::ConfigData) {
    for (key, value) in data {
        println!("{key} = {value}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("staticconf=info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { file } => {
            let load = file_loader(&file)?;
            let data = load(&file, &LoaderOptions::for_namespace(&cli.namespace))?;
            print_data(&data);
        }
        Commands::Watch {
            file,
            interval,
            comparator,
        } => {
            let load = file_loader(&file)?;
            let settings = WatchSettings {
                min_interval_secs: interval,
                comparators: comparator,
            };
            let mut facade = ConfigFacade::load(&file, &cli.namespace, load, &settings)?;
            tracing::info!(file = %file.display(), namespace = %cli.namespace, "Watching configuration");

            loop {
                thread::sleep(Duration::from_secs(interval.max(1)));
                match facade.reload_if_changed(false) {
                    Ok(Some(data)) => print_data(&data),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                    }
                }
            }
        }
    }

    Ok(())
}
