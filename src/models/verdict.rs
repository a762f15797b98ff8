use serde::Serialize;
use std::path::PathBuf;

/// Ordered, append-only list of problems found during one run.
///
/// Pushing a diagnostic never stops evaluation; the caller runs every check,
/// merges what each one returns, and only then looks at `is_empty()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<String>);

impl Diagnostics {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, msg: impl Into<String>) {
        self.0.push(msg.into());
    }

    /// Merge the outcome of a single check (`None` = nothing to report).
    pub fn record(&mut self, outcome: Option<String>) {
        if let Some(msg) = outcome { self.0.push(msg); }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn into_verdict(self) -> SafetyVerdict {
        SafetyVerdict { passed: self.is_empty(), diagnostics: self }
    }
}

/// Go / no-go outcome of the preflight checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyVerdict {
    pub passed:      bool,
    pub diagnostics: Diagnostics,
}

/// Machine-readable summary printed by `--check --json`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub pid:              u32,
    pub process:          Option<String>,
    pub output_file:      PathBuf,
    pub dump_estimate_kb: Option<u64>,
    pub free_space_kb:    Option<u64>,
    pub margin:           f64,
    #[serde(flatten)]
    pub verdict:          SafetyVerdict,
}
