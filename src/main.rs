use anyhow::Result;
use clap::Parser;
use pyanalyzer::adapters::CancellationToken;
use pyanalyzer::cli::{Cli, Commands};
use pyanalyzer::commands::{
    self, AnalyzeConfig, CommandOutcome, ConfigureConfig, FixCommandConfig, ReportTarget,
    SuggestConfig,
};
use pyanalyzer::formatting::FormattingConfig;
use pyanalyzer::observability::{init_tracing, install_panic_hook};

/// Exit status for fatal errors (bad arguments, unreadable config, ...).
const EXIT_FATAL: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);
    install_panic_hook();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, stopping tools...");
        trigger.cancel();
    }) {
        tracing::warn!("Could not install Ctrl-C handler: {e}");
    }

    let formatting = FormattingConfig::resolve(cli.plain);
    formatting.apply();

    let code = match run(cli, formatting, &cancel) {
        Ok(outcome) => {
            if outcome == CommandOutcome::Cancelled {
                eprintln!("Analysis cancelled; no report written");
            }
            outcome.exit_code()
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, formatting: FormattingConfig, cancel: &CancellationToken) -> Result<CommandOutcome> {
    let config_file = cli.config;
    let target = |report: pyanalyzer::cli::ReportArgs| ReportTarget {
        format: report.format,
        output: report.output,
        formatting,
    };

    match cli.command {
        Commands::Analyze {
            path,
            report,
            analysis,
            fail_on,
        } => commands::handle_analyze(
            AnalyzeConfig {
                path,
                config_file,
                overrides: analysis.into(),
                target: target(report),
                fail_on,
            },
            cancel,
        ),
        Commands::Suggest {
            path,
            report,
            analysis,
        } => commands::handle_suggest(
            SuggestConfig {
                path,
                config_file,
                overrides: analysis.into(),
                target: target(report),
            },
            cancel,
        ),
        Commands::Fix {
            path,
            dry_run,
            no_backup,
            unsafe_fixes,
            report,
        } => commands::handle_fix(
            FixCommandConfig {
                path,
                config_file,
                dry_run,
                no_backup,
                unsafe_fixes,
                target: target(report),
            },
            cancel,
        ),
        Commands::Configure { path, force, show } => {
            commands::handle_configure(ConfigureConfig {
                path,
                force,
                show,
                config_file,
                formatting,
            })
        }
    }
}
