use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gw_predictor::data_dir::DataDir;
use gw_predictor::export;
use gw_predictor::fixtures::FixtureSource;
use gw_predictor::gameweek;
use gw_predictor::params;

#[derive(Parser)]
#[command(name = "gw_predictor")]
#[command(about = "Match probabilities, expected goals and fair odds from team ratings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict every fixture of a gameweek
    Predict {
        #[arg(short, long)]
        gameweek: u32,
        #[arg(long, env = "GWP_DATA_DIR", default_value = "data")]
        data: PathBuf,
        /// JSON file with model parameters; missing keys keep their defaults
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Exit with an error if any fixture could not be predicted
        #[arg(long)]
        strict: bool,
    },
    /// Show a gameweek's rating snapshot, strongest first
    Ratings {
        #[arg(short, long)]
        gameweek: u32,
        #[arg(long, env = "GWP_DATA_DIR", default_value = "data")]
        data: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// List gameweeks that have both fixtures and ratings
    Gameweeks {
        #[arg(long, env = "GWP_DATA_DIR", default_value = "data")]
        data: PathBuf,
    },
    /// Print the effective, validated model parameters
    Params {
        #[arg(long)]
        params: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
    Xlsx,
}

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    // stderr keeps stdout clean for csv/json output.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gw_predictor=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Predict {
            gameweek,
            data,
            params,
            format,
            out,
            strict,
        } => {
            let params = params::effective_params(params.as_deref())?;
            let source = DataDir::new(data);
            let predictions = gameweek::predict_gameweek(&source, gameweek, &params)?;

            match format {
                Format::Table => emit(out.as_ref(), export::render_table(&predictions))?,
                Format::Json => emit(out.as_ref(), export::render_json(&predictions)?)?,
                Format::Csv => match &out {
                    Some(path) => {
                        let file = File::create(path)
                            .with_context(|| format!("create {}", path.display()))?;
                        export::write_csv(&predictions, BufWriter::new(file))?;
                    }
                    None => export::write_csv(&predictions, io::stdout().lock())?,
                },
                Format::Xlsx => {
                    let Some(path) = &out else {
                        bail!("--format xlsx needs --out <file.xlsx>");
                    };
                    export::write_xlsx(&predictions, path)?;
                }
            }
            if let Some(path) = &out {
                info!(path = %path.display(), "wrote predictions");
            }

            if strict && !predictions.failures.is_empty() {
                bail!(
                    "{} of {} fixtures failed",
                    predictions.failures.len(),
                    predictions.failures.len() + predictions.total_matches
                );
            }
            Ok(())
        }
        Command::Ratings {
            gameweek,
            data,
            format,
        } => {
            let table = gameweek::rating_table(&DataDir::new(data), gameweek)?;
            match format {
                Format::Table => emit(None, export::render_ratings_table(&table)),
                Format::Json => emit(None, export::render_json(&table)?),
                other => bail!("ratings cannot be rendered as {other:?}"),
            }
        }
        Command::Gameweeks { data } => {
            let source = DataDir::new(data);
            let weeks = source.gameweeks()?;
            if weeks.is_empty() {
                bail!("no gameweeks found under {}", source.root().display());
            }
            for w in weeks {
                println!("GW{:<3} {}  {} matches", w.gameweek, w.season, w.matches);
            }
            Ok(())
        }
        Command::Params { params } => {
            let params = params::effective_params(params.as_deref())?;
            emit(None, export::render_json(&params)?)
        }
    }
}

fn emit(out: Option<&PathBuf>, text: String) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("write stdout")?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n").context("write stdout")?;
            }
            Ok(())
        }
    }
}
