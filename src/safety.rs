use crate::models::verdict::{Diagnostics, SafetyVerdict};
use crate::util::human::fmt_kb;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Everything the preflight checks look at, gathered before any of them run.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub pid:     u32,
    /// JVM name as reported by jps; `None` = pid not confirmed as a JVM.
    pub process: Option<String>,
    /// Estimated dump size from jstat; `None` = no reading.
    pub dump_kb: Option<u64>,
    /// Free space from df; `None` = no reading. Never treated as zero.
    pub free_kb: Option<u64>,
    pub margin:  f64,
    pub dir:     PathBuf,
    pub file:    PathBuf,
}

/// Outcome of the free-space comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum DiskSpace {
    Sufficient(String),
    Insufficient(String),
    /// One of the readings is missing; nothing to compare.
    Skipped(String),
}

/// Run every check and collect what they report. No check is skipped
/// because an earlier one failed.
pub fn evaluate(pf: &Preflight) -> SafetyVerdict {
    let mut diags = Diagnostics::new();

    diags.record(check_identity(pf.pid, pf.process.as_deref()));
    diags.record(check_directory(&pf.dir));
    diags.record(check_output_file(&pf.file));

    match check_disk_space(pf.dump_kb, pf.free_kb, pf.margin, &pf.dir) {
        DiskSpace::Sufficient(msg)   => tracing::info!("{}", msg),
        DiskSpace::Skipped(msg)      => tracing::warn!("{}", msg),
        DiskSpace::Insufficient(msg) => diags.push(msg),
    }

    diags.into_verdict()
}

pub fn check_identity(pid: u32, process: Option<&str>) -> Option<String> {
    match process {
        Some(_) => None,
        None => Some(format!(
            "Process {} could not be confirmed as a running JVM (not listed by jps)", pid,
        )),
    }
}

pub fn check_directory(dir: &Path) -> Option<String> {
    if dir.is_dir() {
        None
    } else {
        Some(format!("Output directory {} does not exist or is not a directory", dir.display()))
    }
}

/// Refuse to overwrite, then prove the path is writable by creating and
/// removing it.
pub fn check_output_file(file: &Path) -> Option<String> {
    if file.exists() {
        return Some(format!("Output file {} already exists", file.display()));
    }
    match OpenOptions::new().write(true).create_new(true).open(file) {
        Ok(probe) => {
            drop(probe);
            if let Err(e) = fs::remove_file(file) {
                tracing::warn!("could not remove write probe {}: {}", file.display(), e);
            }
            None
        }
        Err(e) => Some(format!("Cannot write to {}: {}", file.display(), e)),
    }
}

/// The dump may use at most `margin` of the free space. A missing reading on
/// either side skips the comparison instead of failing it.
pub fn check_disk_space(dump_kb: Option<u64>, free_kb: Option<u64>, margin: f64, dir: &Path) -> DiskSpace {
    let free = match free_kb {
        Some(f) => f,
        None => return DiskSpace::Skipped(format!(
            "Free space in {} could not be determined; skipping disk space check", dir.display(),
        )),
    };
    let dump = match dump_kb {
        Some(d) => d,
        None => return DiskSpace::Skipped(
            "Heap size could not be estimated; skipping disk space check".to_string(),
        ),
    };

    if dump as f64 > free as f64 * margin {
        let needed = (dump as f64 / margin).round() as u64;
        DiskSpace::Insufficient(format!(
            "Not enough free space in {}: an estimated {} dump needs at least {} free ({:.0}% margin), only {} available",
            dir.display(), fmt_kb(dump), fmt_kb(needed), margin * 100.0, fmt_kb(free),
        ))
    } else {
        DiskSpace::Sufficient(format!(
            "Estimated dump size {}, free space in {} {}",
            fmt_kb(dump), dir.display(), fmt_kb(free),
        ))
    }
}

/// What to do with a verdict, given the --check and --force flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Checks passed; dump.
    Proceed,
    /// Checks failed but --force was given; dump anyway.
    Override,
    /// Checks failed; stop before touching the JVM.
    Abort,
    CheckPassed,
    CheckFailed,
}

impl Decision {
    pub fn dumps(self) -> bool {
        matches!(self, Decision::Proceed | Decision::Override)
    }

    /// Exit code when the run ends at this decision (dumping decisions only
    /// get here if the dump succeeded).
    pub fn exit_code(self) -> i32 {
        match self {
            Decision::Abort | Decision::CheckFailed => 1,
            _ => 0,
        }
    }
}

/// --check always wins over --force: check mode never dumps.
pub fn decide(verdict: &SafetyVerdict, check_only: bool, force: bool) -> Decision {
    match (check_only, verdict.passed, force) {
        (true, true, _)       => Decision::CheckPassed,
        (true, false, _)      => Decision::CheckFailed,
        (false, true, _)      => Decision::Proceed,
        (false, false, true)  => Decision::Override,
        (false, false, false) => Decision::Abort,
    }
}
