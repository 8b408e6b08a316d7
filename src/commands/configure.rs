use super::{load_effective_config, resolve_project_root, CommandOutcome};
use crate::config::{default_config_toml, AnalyzerConfig, CONFIG_FILE_NAME};
use crate::formatting::{FormattingConfig, Styler, Symbol};
use crate::io;
use crate::utils::env::EnvironmentReport;
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub struct ConfigureConfig {
    pub path: PathBuf,
    pub force: bool,
    pub show: bool,
    pub config_file: Option<PathBuf>,
    pub formatting: FormattingConfig,
}

pub fn handle_configure(config: ConfigureConfig) -> Result<CommandOutcome> {
    let project_root = resolve_project_root(&config.path)?;

    if config.show {
        let analyzer_config = load_effective_config(&project_root, config.config_file.as_deref())?;
        let report = EnvironmentReport::detect(&project_root, &analyzer_config);
        let styler = Styler::new(config.formatting);
        print!("{}", render_show(&analyzer_config, &report, &styler)?);
        return Ok(CommandOutcome::Success);
    }

    let path = write_default_config(&project_root, config.force)?;
    println!("Created {}", path.display());
    Ok(CommandOutcome::Success)
}

/// Writes the commented default configuration into `project_root`.
pub fn write_default_config(project_root: &Path, force: bool) -> Result<PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }
    io::write_file(&config_path, default_config_toml())?;
    Ok(config_path)
}

fn render_show(
    config: &AnalyzerConfig,
    report: &EnvironmentReport,
    styler: &Styler,
) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", styler.header("Effective configuration"))?;
    let toml = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    writeln!(out, "{toml}")?;

    writeln!(out, "{}", styler.header("Environment"))?;
    writeln!(out, "  project:    {}", report.project_root.display())?;
    for status in &report.tools {
        let (symbol, detail) = match (&status.executable, status.enabled) {
            (_, false) => (Symbol::Info, "disabled".to_string()),
            (Some(path), true) => (
                Symbol::Ok,
                format!(
                    "{} ({})",
                    path.display(),
                    status.version.as_deref().unwrap_or("unknown version")
                ),
            ),
            (None, true) => (Symbol::Error, "not found".to_string()),
        };
        writeln!(
            out,
            "  {:<10}  {} {}",
            format!("{}:", status.engine),
            styler.symbol(symbol),
            detail
        )?;
    }

    let venv = report
        .virtualenv
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    writeln!(out, "  virtualenv: {venv}")?;
    if report.uv_project {
        writeln!(out, "  uv project: yes")?;
    }
    if !report.monorepo_packages.is_empty() {
        writeln!(out, "  packages:")?;
        for package in &report.monorepo_packages {
            writeln!(out, "    {}", styler.dim(&package.display().to_string()))?;
        }
    }
    match (&report.git_branch, &report.git_commit) {
        (Some(branch), Some(commit)) => {
            writeln!(out, "  git:        {branch} @ {}", &commit[..commit.len().min(8)])?
        }
        (None, Some(commit)) => writeln!(out, "  git:        detached @ {commit}")?,
        _ => {}
    }
    if let Some((staged, untracked)) = report.git_pending {
        writeln!(out, "  pending:    {staged} staged, {untracked} untracked")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Tool;
    use crate::utils::env::ToolStatus;
    use tempfile::TempDir;

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = write_default_config(temp.path(), false).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: AnalyzerConfig = toml::from_str(&written).unwrap();
        assert!(parsed.validate().is_ok());

        assert!(write_default_config(temp.path(), false).is_err());
        assert!(write_default_config(temp.path(), true).is_ok());
    }

    #[test]
    fn test_render_show_lists_tools() {
        let report = EnvironmentReport {
            project_root: PathBuf::from("/project"),
            tools: vec![
                ToolStatus {
                    tool: Tool::TypeChecker,
                    engine: "pyright",
                    enabled: true,
                    executable: None,
                    version: None,
                },
                ToolStatus {
                    tool: Tool::Linter,
                    engine: "ruff",
                    enabled: true,
                    executable: Some(PathBuf::from("/usr/bin/ruff")),
                    version: Some("ruff 0.6.0".to_string()),
                },
            ],
            virtualenv: None,
            uv_project: false,
            monorepo_packages: Vec::new(),
            git_branch: Some("main".to_string()),
            git_commit: Some("0123456789abcdef".to_string()),
            git_pending: Some((1, 2)),
        };

        let styler = Styler::new(FormattingConfig::plain());
        let text = render_show(&AnalyzerConfig::default(), &report, &styler).unwrap();

        assert!(text.contains("[tools.linter]"));
        assert!(text.contains("[ERROR] not found"));
        assert!(text.contains("/usr/bin/ruff (ruff 0.6.0)"));
        assert!(text.contains("virtualenv: none"));
        assert!(text.contains("main @ 01234567"));
        assert!(text.contains("1 staged, 2 untracked"));
    }
}
