use anyhow::{Context, Result};
use std::io::{BufRead, Cursor};
use std::process::Command;

/// Name used when jps lists the pid but cannot say what it runs.
pub const UNKNOWN_NAME: &str = "unknown";

/// Run `jps` and look for `pid` among the JVMs it can see.
///
/// `Ok(Some(name))` confirms the pid is a JVM; the name is the main class or
/// jar, lowercased. `Ok(None)` means jps ran and did not list the pid.
pub fn find_jvm(jps: &str, pid: u32) -> Result<Option<String>> {
    let out = Command::new(jps)
        .output()
        .with_context(|| format!("{} could not be started", jps))?;

    if !out.status.success() {
        tracing::debug!("{} exited with {}", jps, out.status);
    }
    Ok(parse_process_name(Cursor::new(out.stdout), pid))
}

/// Scan `pid name` lines until the pid matches. jps has no header line.
pub fn parse_process_name<R: BufRead>(reader: R, pid: u32) -> Option<String> {
    for line in reader.lines() {
        let line = match line {
            Ok(l)  => l,
            Err(e) => {
                tracing::debug!("stopped reading jps output: {}", e);
                return None;
            }
        };
        let mut fields = line.split_whitespace();
        let this_pid: u32 = match fields.next().and_then(|f| f.parse().ok()) {
            Some(p) => p,
            None    => continue,
        };
        if this_pid != pid { continue; }

        // "1234 -- process information unavailable" or a bare pid
        let name = match fields.next() {
            Some(n) if !n.starts_with("--") => n.to_lowercase(),
            _ => UNKNOWN_NAME.to_string(),
        };
        return Some(name);
    }
    None
}
