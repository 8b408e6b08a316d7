// Test utility module for pyanalyzer integration tests
#![allow(dead_code)]

use pyanalyzer::config::AnalyzerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Stand-in `pyright`: prints `pyright.json` from the working directory,
/// sleeping first when a `slow-pyright` marker exists.
const FAKE_PYRIGHT: &str = r#"#!/bin/sh
if [ -f slow-pyright ]; then exec sleep 30; fi
cat pyright.json
exit 1
"#;

/// Stand-in `ruff`: records its arguments in `ruff-invocations.log`, then
/// prints `ruff.json`, or an empty array.
const FAKE_RUFF: &str = r#"#!/bin/sh
echo "$*" >> ruff-invocations.log
if [ -f ruff.json ]; then cat ruff.json; else echo '[]'; fi
"#;

/// Always fails the way a broken installation does.
const BROKEN_TOOL: &str = r#"#!/bin/sh
echo "boom: interpreter not found" >&2
exit 3
"#;

/// Directory holding the fake tool scripts.
///
/// Written once per test binary, before any test spawns a process, so no
/// script is ever executed while a write handle is open.
pub fn fake_bin_dir() -> &'static Path {
    static BIN: OnceLock<TempDir> = OnceLock::new();
    BIN.get_or_init(|| {
        let dir = TempDir::new().expect("temp dir for fake tools");
        for (name, body) in [
            ("pyright", FAKE_PYRIGHT),
            ("ruff", FAKE_RUFF),
            ("broken", BROKEN_TOOL),
        ] {
            write_executable(&dir.path().join(name), body);
        }
        dir
    })
    .path()
}

fn write_executable(path: &Path, body: &str) {
    fs::write(path, body).expect("write fake tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    }
}

/// A throwaway Python project wired to the fake tools.
pub struct FakeProject {
    pub dir: TempDir,
}

impl FakeProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp project");
        fs::write(dir.path().join("app.py"), "import os\n").expect("write app.py");
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("canonical project root")
    }

    pub fn pyright_output(self, json: &str) -> Self {
        self.write("pyright.json", json)
    }

    pub fn ruff_output(self, json: &str) -> Self {
        self.write("ruff.json", json)
    }

    pub fn slow_pyright(self) -> Self {
        self.write("slow-pyright", "")
    }

    pub fn write(self, relative: &str, contents: &str) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, contents).expect("write project file");
        self
    }

    /// One line per fake ruff run, holding its arguments.
    pub fn ruff_invocations(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("ruff-invocations.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Configuration pointing both tools at the fake scripts.
    pub fn config(&self) -> AnalyzerConfig {
        let bin = fake_bin_dir();
        let mut config = AnalyzerConfig::default();
        config.tools.type_checker.executable = Some(bin.join("pyright"));
        config.tools.linter.executable = Some(bin.join("ruff"));
        config.tools.type_checker.timeout_secs = 10;
        config.tools.linter.timeout_secs = 10;
        config
    }

    /// Same configuration as TOML, for driving the binary.
    pub fn config_toml(&self) -> String {
        toml::to_string(&self.config()).expect("serialize config")
    }
}

pub fn pyright_json(entries: &[(&str, u32, &str, &str, &str)]) -> String {
    let diagnostics: Vec<serde_json::Value> = entries
        .iter()
        .map(|(file, line, severity, rule, message)| {
            serde_json::json!({
                "file": file,
                "severity": severity,
                "message": message,
                "rule": rule,
                "range": {
                    "start": { "line": line - 1, "character": 0 },
                    "end": { "line": line - 1, "character": 4 }
                }
            })
        })
        .collect();
    serde_json::json!({
        "version": "1.1.380",
        "generalDiagnostics": diagnostics,
        "summary": { "errorCount": entries.len() }
    })
    .to_string()
}

pub fn ruff_json(entries: &[(&str, u32, &str, &str, bool)]) -> String {
    let findings: Vec<serde_json::Value> = entries
        .iter()
        .map(|(file, row, code, message, fixable)| {
            let fix = fixable.then(|| {
                serde_json::json!({
                    "applicability": "safe",
                    "message": "Remove unused import",
                    "edits": []
                })
            });
            serde_json::json!({
                "code": code,
                "message": message,
                "filename": file,
                "location": { "row": row, "column": 1 },
                "end_location": { "row": row, "column": 10 },
                "fix": fix,
                "url": format!("https://docs.astral.sh/ruff/rules/{code}"),
                "noqa_row": row
            })
        })
        .collect();
    serde_json::Value::Array(findings).to_string()
}
