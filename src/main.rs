use clap::{Parser, ValueEnum};
use inventory_shrinkage::{run_batch, MissingShrinkagePolicy, ReconConfig, UnclassifiedPolicy};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "shrinkage",
    version,
    about = "Reconstruct daily store inventory and report shrinkage against audited counts"
)]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long, env = "SHRINKAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory with <store>sell.csv, <store>supply.csv and <store>inventory.csv files
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving per-store outputs and the cross-store report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How periods without an audited count enter the cross-store report
    #[arg(long, value_enum)]
    missing_shrinkage: Option<MissingShrinkageArg>,

    /// Warn about transactions whose code matches no category
    #[arg(long)]
    warn_unclassified: bool,

    /// Do not wipe the output directory before writing
    #[arg(long)]
    keep_output: bool,

    /// Print the cross-store report to stdout when done
    #[arg(long)]
    print_report: bool,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    print_schema: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingShrinkageArg {
    Zero,
    ExcludeRow,
}

impl From<MissingShrinkageArg> for MissingShrinkagePolicy {
    fn from(arg: MissingShrinkageArg) -> Self {
        match arg {
            MissingShrinkageArg::Zero => Self::Zero,
            MissingShrinkageArg::ExcludeRow => Self::ExcludeRow,
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("SHRINKAGE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(cli: &Cli) -> inventory_shrinkage::Result<ReconConfig> {
    let mut config = match &cli.config {
        Some(path) => ReconConfig::from_path(path)?,
        None => ReconConfig::default(),
    };
    if let Some(input) = &cli.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(policy) = cli.missing_shrinkage {
        config.missing_shrinkage = policy.into();
    }
    if cli.warn_unclassified {
        config.unclassified = UnclassifiedPolicy::Warn;
    }
    if cli.keep_output {
        config.clean_output = false;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_schema {
        return match ReconConfig::schema_as_json() {
            Ok(schema) => {
                println!("{}", schema);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    init_logging();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match run_batch(&config) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Run aborted: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.print_report {
        let path = config.output_dir.join(&config.files.report_name);
        match fs::read_to_string(&path) {
            Ok(report) => print!("{}", report),
            Err(e) => {
                log::error!("Cannot read back {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    for failure in &outcome.failures {
        log::warn!("Not reconciled: \"{}\" ({})", failure.store.name(), failure.error);
    }

    ExitCode::SUCCESS
}
