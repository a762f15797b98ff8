use crate::collectors::table::TableScanner;
use crate::models::disk::DiskUsageRecord;
use anyhow::{Context, Result};
use std::io::{BufRead, Cursor};
use std::path::Path;
use std::process::Command;

/// Run `df -k <dir>` and return the space available to unprivileged users,
/// in kB. `Ok(None)` means df ran but no row had a usable figure.
pub fn available_kb(df: &str, dir: &Path) -> Result<Option<u64>> {
    let out = Command::new(df)
        .arg("-k")
        .arg(dir)
        .output()
        .with_context(|| format!("{} could not be started", df))?;

    if !out.status.success() {
        tracing::debug!("{} -k {} exited with {}", df, dir.display(), out.status);
    }
    Ok(parse_available_kb(Cursor::new(out.stdout)))
}

/// First row whose third-from-last token is a plain number wins.
///
/// The "Available" column is found by counting from the end of the row, not
/// from the start. `df` wraps long filesystem names onto their own line:
///
/// ```text
/// Filesystem                                  1K-blocks     Used Available Use% Mounted on
/// nfs-server.example.com:/exports/very/long/path
///                                             104857600 52428800  52428800  50% /mnt/data
/// ```
///
/// The name line is skipped (too few tokens / not numeric) and the next line
/// still has Available three from the end, while counting from the start
/// would pick up 1K-blocks.
pub fn parse_available_kb<R: BufRead>(reader: R) -> Option<u64> {
    let rec = TableScanner::new(reader)
        .find_map(|tokens| DiskUsageRecord::from_tokens(&tokens))?;

    tracing::debug!(
        "{} on {}: {} of {} kB used ({}), {} kB available",
        rec.mount,
        rec.filesystem.as_deref().unwrap_or("(wrapped)"),
        rec.used_kb.map_or_else(|| "?".to_string(), |v| v.to_string()),
        rec.total_kb.map_or_else(|| "?".to_string(), |v| v.to_string()),
        rec.use_pct,
        rec.available_kb,
    );
    Some(rec.available_kb)
}
