mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::history::{ExportArgs, HistoryArgs};
use commands::rates::RatesArgs;
use commands::valuation::{
    FcffArgs, GordonArgs, ResidualIncomeArgs, RoeDdmArgs, TwoStageArgs, ValueArgs,
};
use commands::RunContext;

/// Intrinsic value per share for financial and non-financial companies
#[derive(Parser)]
#[command(
    name = "ivc",
    version,
    about = "Intrinsic value per share for financial and non-financial companies",
    long_about = "A CLI for intrinsic value calculations with decimal precision. \
                  Values banks and insurers with Gordon, ROE-based, two-stage DDM \
                  and residual income models, and other companies with an FCFF DCF. \
                  Successful valuations are appended to a CSV history log."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// History log file
    #[arg(long, default_value = "valuation_history.csv", global = true)]
    history: PathBuf,

    /// Do not append the result to the history log
    #[arg(long, global = true)]
    no_record: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive cost of equity (direct or CAPM) and WACC (direct or weighted)
    Rates(RatesArgs),
    /// Gordon Growth dividend discount model
    Gordon(GordonArgs),
    /// ROE-based dividend discount model (g = ROE x retention)
    RoeDdm(RoeDdmArgs),
    /// Two-stage dividend discount model
    TwoStage(TwoStageArgs),
    /// Residual income model
    ResidualIncome(ResidualIncomeArgs),
    /// FCFF discounted cash flow for non-financial companies
    Fcff(FcffArgs),
    /// Value a company from a full JSON/YAML valuation request
    Value(ValueArgs),
    /// Print the valuation history log
    History(HistoryArgs),
    /// Export the history log as the "Valuations" sheet (written as Valuations.csv)
    ///
    /// The sheet is a CSV file with the log's four columns, not a spreadsheet
    /// workbook. Spreadsheet applications open it as a single sheet.
    Export(ExportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "intrinsic_value_core=debug,ivc=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = RunContext {
        history: cli.history,
        record: !cli.no_record,
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Rates(args) => commands::rates::run_rates(args),
        Commands::Gordon(args) => commands::valuation::run_gordon(args, &ctx),
        Commands::RoeDdm(args) => commands::valuation::run_roe_ddm(args, &ctx),
        Commands::TwoStage(args) => commands::valuation::run_two_stage(args, &ctx),
        Commands::ResidualIncome(args) => commands::valuation::run_residual_income(args, &ctx),
        Commands::Fcff(args) => commands::valuation::run_fcff(args, &ctx),
        Commands::Value(args) => commands::valuation::run_value(args, &ctx),
        Commands::History(args) => commands::history::run_history(args, &ctx),
        Commands::Export(args) => commands::history::run_export(args, &ctx),
        Commands::Version => {
            println!("ivc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let printed = result.and_then(|value| output::format_output(&cli.output, &value));
    if let Err(e) = printed {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_help_names_csv_format() {
        let cmd = Cli::command();
        let export = cmd
            .find_subcommand("export")
            .expect("export subcommand");
        let about = export.get_about().map(|s| s.to_string()).unwrap_or_default();
        let long_about = export.get_long_about().map(|s| s.to_string()).unwrap_or_default();
        assert!(about.contains("Valuations.csv"), "about: {about}");
        assert!(long_about.contains("CSV file"), "long about: {long_about}");
    }
}
