//! Command-line front end for the liability audit toolkit.
//!
//! # Commands
//!
//! - `ncl analyze` - print the debt, provision and consolidated panels
//! - `ncl export --format pdf --output report.pdf` - render one audit report
//! - `ncl archive --from 2020 --to 2024` - write one archived report per year
//! - `ncl reports list` / `ncl reports show <file>` - browse the archive
//!
//! Settings resolve as defaults, then `NCL_*` variables, then flags.

mod output;

use clap::{Parser, Subcommand};
use log::{error, info};
use ncl_core::config::parse_date;
use ncl_core::{
    default_log_level, init_logging, AnalysisConfig, ExportService, ReportArchive, ReportFormat,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "ncl_audit_logs";

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Non-current liability audit toolkit
#[derive(Parser)]
#[command(name = "ncl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(long, global = true)]
    as_of: Option<String>,

    #[arg(long, global = true)]
    debt_seed: Option<u64>,

    #[arg(long, global = true)]
    debt_count: Option<usize>,

    #[arg(long, global = true)]
    provision_seed: Option<u64>,

    #[arg(long, global = true)]
    provision_count: Option<usize>,

    /// Run tag recorded with every detection
    #[arg(long, global = true)]
    detector_seed: Option<u64>,

    /// Expected outlier share in (0, 0.5]
    #[arg(long, global = true)]
    contamination: Option<f64>,

    /// Archive directory for yearly reports
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    /// Log directory (default: system temp dir)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print debt, provision and consolidated panels
    Analyze {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render the audit report for the current selection
    Export {
        /// pdf or docx
        #[arg(short, long, default_value = "pdf")]
        format: String,

        /// Target file (default: audit_report.<ext> in the working directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Period label printed on the cover
        #[arg(long)]
        period: Option<String>,
    },

    /// Generate one archived PDF per fiscal year
    Archive {
        #[arg(long)]
        from: i32,

        #[arg(long)]
        to: i32,
    },

    /// Browse archived reports
    #[command(subcommand)]
    Reports(ReportsCommands),
}

#[derive(Subcommand)]
enum ReportsCommands {
    /// List archived reports
    List,

    /// Show text statistics of one report, optionally searching it
    Show {
        /// Report file name inside the archive
        file: String,

        /// Term to count and highlight
        #[arg(short, long)]
        search: Option<String>,

        /// Match the search term case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = start_logging(&cli) {
        eprintln!("warning: logging disabled: {err}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(cli: &Cli) -> CliResult<()> {
    let dir = match &cli.log_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => std::env::current_dir()?.join(dir),
        None => std::env::temp_dir().join(LOG_DIR_NAME),
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &dir.to_string_lossy())?;
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli)?;
    info!(
        "event=cli_start module=cli status=ok as_of={} debt_seed={} provision_seed={} detector_seed={}",
        config.as_of,
        config.datasets.debt_seed,
        config.datasets.provision_seed,
        config.detector.seed
    );

    match cli.command {
        Commands::Analyze { json } => {
            let mut session = config.session()?;
            let debts =
                session.analyze_debts(config.datasets.debt_seed, config.datasets.debt_count);
            let provisions = session.analyze_provisions(
                config.datasets.provision_seed,
                config.datasets.provision_count,
            );
            let summary = session.consolidated(&config.datasets);
            if json {
                let value = serde_json::json!({
                    "as_of": config.as_of,
                    "detector": config.detector,
                    "debts": debts,
                    "provisions": provisions,
                    "consolidated": summary,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                output::print_debts(&debts);
                output::print_provisions(&provisions);
                output::print_consolidated(&summary);
            }
        }
        Commands::Export {
            format,
            output,
            period,
        } => {
            let format = ReportFormat::parse(&format)
                .ok_or_else(|| format!("unknown report format `{format}`; expected pdf|docx"))?;
            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("audit_report.{}", format.extension())));
            let period = period.unwrap_or_else(|| format!("Fiscal Year {}", config.as_of.format("%Y")));

            let mut session = config.session()?;
            let data = session.report_data(&config.datasets, period, config.as_of);
            let outcome = ExportService::new().export(format, &data, &path);
            if !outcome.is_success() {
                return Err(outcome.message.into());
            }
            println!("{}", outcome.message);
        }
        Commands::Archive { from, to } => {
            let archive = ReportArchive::create(&config.reports_dir)?;
            let written = archive.generate_yearly(from, to, &config)?;
            for path in &written {
                println!("{}", path.display());
            }
            println!("{} report(s) written to {}", written.len(), archive.dir().display());
        }
        Commands::Reports(ReportsCommands::List) => {
            let archive = ReportArchive::open(&config.reports_dir)?;
            output::print_archive(&archive.list()?);
        }
        Commands::Reports(ReportsCommands::Show {
            file,
            search,
            case_sensitive,
        }) => {
            let archive = ReportArchive::open(&config.reports_dir)?;
            let text = archive.extract(&file)?;
            output::print_stats(&file, &text.stats());
            if let Some(term) = search {
                let result = ncl_core::report::archive::search_text(
                    &text.full_text(),
                    &term,
                    !case_sensitive,
                );
                output::print_search(&result);
            }
        }
    }
    Ok(())
}

/// Environment-backed config with flag overrides applied last.
fn resolve_config(cli: &Cli) -> CliResult<AnalysisConfig> {
    let mut config = AnalysisConfig::from_env()?;
    if let Some(raw) = &cli.as_of {
        config.as_of = parse_date("--as-of", raw)?;
    }
    if let Some(seed) = cli.debt_seed {
        config.datasets.debt_seed = seed;
    }
    if let Some(count) = cli.debt_count {
        config.datasets.debt_count = count;
    }
    if let Some(seed) = cli.provision_seed {
        config.datasets.provision_seed = seed;
    }
    if let Some(count) = cli.provision_count {
        config.datasets.provision_count = count;
    }
    if let Some(seed) = cli.detector_seed {
        config.detector.seed = seed;
    }
    if let Some(contamination) = cli.contamination {
        config.detector.contamination = contamination;
    }
    if let Some(dir) = &cli.reports_dir {
        config.reports_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "ncl",
            "analyze",
            "--as-of",
            "2024-12-31",
            "--debt-seed",
            "7",
            "--contamination",
            "0.2",
        ])
        .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Analyze { json: false }));

        let config = resolve_config(&cli).expect("valid config");
        assert_eq!(config.as_of.to_string(), "2024-12-31");
        assert_eq!(config.datasets.debt_seed, 7);
        assert_eq!(config.detector.contamination, 0.2);
    }

    #[test]
    fn out_of_range_contamination_is_rejected() {
        let cli = Cli::try_parse_from(["ncl", "analyze", "--contamination", "0.9"])
            .expect("valid arguments");
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let cli = Cli::try_parse_from(["ncl", "reports", "list", "--as-of", "31/12/2024"])
            .expect("valid arguments");
        assert!(resolve_config(&cli).is_err());
    }
}
