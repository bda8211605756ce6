use clap::Parser;
use csv_to_pdf::{Config, ReportPipeline};
use log::{LevelFilter, debug, error, info};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Creates one PDF document per group of consecutive CSV records and optionally mails it.
#[derive(Parser, Debug)]
#[command(name = "csv-to-pdf", version, about)]
struct Cli {
    /// Log the resolved configuration and outgoing mail details.
    #[arg(short, long)]
    verbose: bool,

    /// INI file with an [Options] section.
    config: PathBuf,

    /// Input file or glob pattern, e.g. "exports/*.csv".
    input: String,
}

fn init_logger(verbose: bool) {
    // Records are filtered by the global max level so that `Debug = 1` in the
    // configuration can raise it after the logger is installed.
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}:\t{}", record.level(), record.args()))
        .try_init();
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(1);
        }
        Err(e) => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };
    init_logger(cli.verbose);

    if !cli.config.is_file() {
        error!("Configuration file '{}' not found.", cli.config.display());
        return ExitCode::from(2);
    }
    info!("Using configuration file {}", cli.config.display());

    let config = match Config::load(&cli.config) {
        Ok(config) => config.with_verbose(cli.verbose),
        Err(e) => {
            error!("{}", e);
            return ExitCode::SUCCESS;
        }
    };
    if config.verbose {
        log::set_max_level(LevelFilter::Debug);
    }
    debug!("Resolved configuration: {:?}", config.redacted());

    let pipeline = match ReportPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{}", e);
            return ExitCode::SUCCESS;
        }
    };
    if let Err(e) = pipeline.run(&cli.input) {
        error!("{}", e);
    }
    ExitCode::SUCCESS
}
