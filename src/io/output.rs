use crate::formatting::FormattingConfig;
use crate::io::writers::{HtmlWriter, JsonWriter, SarifWriter, TerminalWriter};
use crate::pipeline::PipelineOutcome;
use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Html,
    Sarif,
}

pub trait OutputWriter {
    fn write_outcome(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()>;
}

/// Writer for `format`, targeting `destination` or stdout.
///
/// The terminal format ignores color settings when writing to a file.
pub fn create_writer(
    format: OutputFormat,
    destination: Option<&Path>,
    formatting: FormattingConfig,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    let (sink, formatting): (Box<dyn Write>, FormattingConfig) = match destination {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                crate::io::ensure_dir(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            (Box::new(BufWriter::new(file)), FormattingConfig::plain())
        }
        None => (Box::new(std::io::stdout()), formatting),
    };

    Ok(match format {
        OutputFormat::Terminal => Box::new(TerminalWriter::new(sink, formatting)),
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Html => Box::new(HtmlWriter::new(sink)),
        OutputFormat::Sarif => Box::new(SarifWriter::new(sink)),
    })
}
