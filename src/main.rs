use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mapmemory_wizard::collection::StationCollection;
use mapmemory_wizard::params::{self, ParamOverrides};
use mapmemory_wizard::{Result, diagnostics, view};

#[derive(Parser)]
#[command(name = "mapmemory-wizard")]
#[command(about = "Map memory station parameter wizard", long_about = None)]
struct Cli {
    /// Raise log verbosity (overridden by RUST_LOG).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract stations from a course file and report their parameters.
    Report {
        /// Course-setting event file (.ppen).
        #[arg(long)]
        ppen: String,

        /// JSON parameter overrides.
        #[arg(long)]
        params: Option<String>,

        /// Write the report here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<String>,

        /// Fail if any station is not ready to print.
        #[arg(long)]
        strict: bool,
    },

    /// Report the Defaults record, optionally with overrides applied.
    Defaults {
        #[arg(long)]
        params: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let fallback = if verbose > 0 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_overrides(path: &str) -> Result<ParamOverrides> {
    let overrides = ParamOverrides::load(path)?;
    params::ensure_not_empty(&overrides)?;
    Ok(overrides)
}

fn write_output(out: Option<&str>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| diagnostics::error_message(format!("write {}", path)))?;
            eprintln!("Wrote {}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::Report {
            ppen,
            params,
            out,
            strict,
        } => {
            // 1) Read the course file.
            let xml = std::fs::read_to_string(&ppen)
                .with_context(|| diagnostics::error_message(format!("read {}", ppen)))?;

            // 2) Replace the station list.
            let mut collection = StationCollection::new();
            collection
                .replace_from_course(&xml)
                .with_context(|| format!("extract stations from {}", ppen))?;

            // 3) Apply overrides.
            if let Some(path) = params.as_deref() {
                load_overrides(path)?.apply(&mut collection)?;
            }

            // 4) Render.
            let data = view::build_report_data(&collection)?;
            write_output(out.as_deref(), &view::render_json_report(&data)?)?;

            let invalid = data.invalid_stations();
            if !invalid.is_empty() {
                let list = invalid.join(", ");
                if strict {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!("stations not ready: {}", list))
                    );
                }
                diagnostics::warn(format!("stations not ready: {}", list));
            }
        }
        Commands::Defaults { params } => {
            let mut collection = StationCollection::new();
            if let Some(path) = params.as_deref() {
                load_overrides(path)?.apply(&mut collection)?;
            }
            let data = view::build_report_data(&collection)?;
            let json = serde_json::to_string_pretty(&data.defaults)?;
            println!("{}", json);
        }
    }

    Ok(())
}
