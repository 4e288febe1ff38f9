use clap::{Parser, Subcommand};
use quillpress::build::build_site;
use quillpress::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Builds the listings, route manifest, feeds and sitemaps for a blog.
#[derive(Parser)]
#[command(name = "quillpress", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline once.
    Build {
        /// Project file. Defaults to the nearest `quillpress.yaml` in the
        /// current directory or any parent.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory the output files are written to.
        #[arg(short, long, default_value = "_output")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build { config, output } => build(config, output),
    }
}

fn build(config: Option<PathBuf>, output: PathBuf) -> ExitCode {
    let config = match config {
        Some(path) => Config::from_project_file(&path, &output),
        None => std::env::current_dir()
            .map_err(|err| quillpress::config::Error::Open {
                path: PathBuf::from("."),
                err,
            })
            .and_then(|dir| Config::from_directory(&dir, &output)),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "loading configuration");
            return ExitCode::FAILURE;
        }
    };

    match build_site(&config) {
        Ok(report) if report.is_success() => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            eprintln!("{}", report);
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "build aborted");
            ExitCode::FAILURE
        }
    }
}
