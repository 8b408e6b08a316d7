use crate::commands::AnalysisOverrides;
use crate::config::FailOn;
use crate::io::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pyanalyzer")]
#[command(
    about = "Runs pyright and ruff over a Python project and merges their findings",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Plain output: no colors, ASCII symbols only
    #[arg(long, global = true)]
    pub plain: bool,

    /// Configuration file (defaults to the nearest .pyanalyzer.toml)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run both tools and report the merged diagnostics
    Analyze {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Exit with status 1 when a diagnostic at or above this severity exists
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
    },

    /// Report only diagnostics that are fixable or carry a suggestion
    Suggest {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Back up affected files and let the linter apply its fixes
    Fix {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Show the linter's diff without changing any file
        #[arg(long)]
        dry_run: bool,

        /// Do not back up files before fixing
        #[arg(long)]
        no_backup: bool,

        /// Also apply fixes the linter marks as unsafe
        #[arg(long)]
        unsafe_fixes: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Write a default .pyanalyzer.toml, or show the effective configuration
    Configure {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,

        /// Print the effective configuration and detected environment
        #[arg(long, conflicts_with = "force")]
        show: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Output format (defaults to output.default_format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Only report files changed relative to git HEAD (or --base-ref)
    #[arg(long)]
    pub changed_only: bool,

    /// Git revision to diff against with --changed-only
    #[arg(long, requires = "changed_only")]
    pub base_ref: Option<String>,

    /// Per-tool timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Merge near-identical messages on the same line (similarity 0.0-1.0)
    #[arg(
        long,
        value_name = "THRESHOLD",
        num_args = 0..=1,
        default_missing_value = "0.9"
    )]
    pub fuzzy_dedup: Option<f64>,

    /// Skip the type checker
    #[arg(long)]
    pub no_type_checker: bool,

    /// Skip the linter
    #[arg(long)]
    pub no_linter: bool,
}

impl From<AnalysisArgs> for AnalysisOverrides {
    fn from(args: AnalysisArgs) -> Self {
        Self {
            changed_only: args.changed_only,
            base_ref: args.base_ref,
            timeout_secs: args.timeout,
            fuzzy_threshold: args.fuzzy_dedup,
            no_type_checker: args.no_type_checker,
            no_linter: args.no_linter,
        }
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
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["pyanalyzer", "analyze"]);
        match cli.command {
            Commands::Analyze {
                path,
                report,
                analysis,
                fail_on,
            } => {
                assert_eq!(path, PathBuf::from("."));
                assert!(report.format.is_none());
                assert!(analysis.fuzzy_dedup.is_none());
                assert!(fail_on.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.verbosity, 0);
    }

    #[test]
    fn test_fuzzy_dedup_optional_value() {
        let cli = Cli::parse_from(["pyanalyzer", "analyze", "src", "--fuzzy-dedup"]);
        let Commands::Analyze { analysis, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(analysis.fuzzy_dedup, Some(0.9));

        let cli = Cli::parse_from(["pyanalyzer", "analyze", "--fuzzy-dedup=0.75", "src"]);
        let Commands::Analyze { path, analysis, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(analysis.fuzzy_dedup, Some(0.75));
        assert_eq!(path, PathBuf::from("src"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "pyanalyzer", "analyze", "-vv", "--plain", "-c", "custom.toml", "-f", "sarif",
            "--fail-on", "warning",
        ]);
        assert_eq!(cli.verbosity, 2);
        assert!(cli.plain);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        let Commands::Analyze { report, fail_on, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(report.format, Some(OutputFormat::Sarif));
        assert_eq!(fail_on, Some(FailOn::Warning));
    }

    #[test]
    fn test_base_ref_requires_changed_only() {
        assert!(Cli::try_parse_from(["pyanalyzer", "analyze", "--base-ref", "main"]).is_err());
        assert!(Cli::try_parse_from([
            "pyanalyzer", "analyze", "--changed-only", "--base-ref", "main"
        ])
        .is_ok());
    }

    #[test]
    fn test_fix_flags() {
        let cli = Cli::parse_from(["pyanalyzer", "fix", "--dry-run", "--unsafe-fixes"]);
        let Commands::Fix {
            dry_run,
            no_backup,
            unsafe_fixes,
            ..
        } = cli.command
        else {
            panic!("expected fix");
        };
        assert!(dry_run);
        assert!(!no_backup);
        assert!(unsafe_fixes);
    }

    #[test]
    fn test_analysis_args_into_overrides() {
        let overrides = AnalysisOverrides::from(AnalysisArgs {
            timeout: Some(10),
            no_linter: true,
            ..Default::default()
        });
        assert_eq!(overrides.timeout_secs, Some(10));
        assert!(overrides.no_linter);
        assert!(!overrides.changed_only);
    }
}
