//! Terminal styling: color and symbol selection.

use crate::core::Severity;
use colored::{ColoredString, Colorize};
use std::env;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_color(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => detect_terminal(),
        }
    }
}

/// Whether status lines use Unicode symbols or ASCII tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMode {
    Auto,
    Unicode,
    Ascii,
}

impl SymbolMode {
    pub fn should_use_unicode(&self) -> bool {
        match self {
            Self::Unicode => true,
            Self::Ascii => false,
            Self::Auto => detect_terminal(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingConfig {
    pub color: ColorMode,
    pub symbols: SymbolMode,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            symbols: SymbolMode::Auto,
        }
    }
}

impl FormattingConfig {
    /// Honors `NO_COLOR`, `CLICOLOR=0` and `CLICOLOR_FORCE=1`, in that order.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if var("NO_COLOR").is_some() {
            config.color = ColorMode::Never;
        }
        if var("CLICOLOR").as_deref() == Some("0") {
            config.color = ColorMode::Never;
        }
        if var("CLICOLOR_FORCE").as_deref() == Some("1") {
            config.color = ColorMode::Always;
        }

        config
    }

    /// ASCII only, no colors.
    pub fn plain() -> Self {
        Self {
            color: ColorMode::Never,
            symbols: SymbolMode::Ascii,
        }
    }

    /// `--plain` wins over the environment.
    pub fn resolve(plain: bool) -> Self {
        if plain {
            Self::plain()
        } else {
            Self::from_env()
        }
    }

    /// Push the color decision into `colored`'s global switch.
    pub fn apply(&self) {
        colored::control::set_override(self.color.should_use_color());
    }
}

/// Status symbols with their ASCII fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Ok,
    Error,
    Warning,
    Info,
    Fix,
}

impl Symbol {
    fn glyphs(self) -> (&'static str, &'static str) {
        match self {
            Self::Ok => ("✓", "[OK]"),
            Self::Error => ("✗", "[ERROR]"),
            Self::Warning => ("⚠", "[WARN]"),
            Self::Info => ("ℹ", "[INFO]"),
            Self::Fix => ("🔧", "[FIX]"),
        }
    }
}

/// Applies a [`FormattingConfig`] to text.
#[derive(Debug, Clone, Copy)]
pub struct Styler {
    config: FormattingConfig,
    color: bool,
}

impl Styler {
    pub fn new(config: FormattingConfig) -> Self {
        Self {
            config,
            color: config.color.should_use_color(),
        }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn severity(&self, severity: Severity, text: &str) -> String {
        match severity {
            Severity::Error => self.paint(text, |t| t.red().bold()),
            Severity::Warning => self.paint(text, |t| t.yellow()),
            Severity::Info => self.paint(text, |t| t.cyan()),
        }
    }

    pub fn header(&self, text: &str) -> String {
        self.paint(text, |t| t.blue().bold())
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |t| t.bold())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn symbol(&self, symbol: Symbol) -> &'static str {
        let (unicode, ascii) = symbol.glyphs();
        if self.config.symbols.should_use_unicode() {
            unicode
        } else {
            ascii
        }
    }

    pub fn severity_symbol(&self, severity: Severity) -> &'static str {
        self.symbol(match severity {
            Severity::Error => Symbol::Error,
            Severity::Warning => Symbol::Warning,
            Severity::Info => Symbol::Info,
        })
    }
}

fn detect_terminal() -> bool {
    if env::var("TERM").is_ok_and(|term| term == "dumb") {
        return false;
    }
    std::io::stdout().is_terminal()
}
