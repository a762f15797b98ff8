use crate::collectors::table::TableScanner;
use crate::models::memory::MemoryRecord;
use anyhow::{Context, Result};
use std::io::{BufRead, Cursor};
use std::process::Command;

/// Run `jstat -gc <pid>` and estimate the heap dump size in kB.
///
/// `Ok(None)` means jstat ran but printed no usable row (the pid exited or
/// is not a JVM). `Err` means jstat itself could not be started.
pub fn estimate_dump_kb(jstat: &str, pid: u32) -> Result<Option<u64>> {
    let out = Command::new(jstat)
        .args(["-gc", &pid.to_string()])
        .output()
        .with_context(|| format!("{} could not be started", jstat))?;

    if !out.status.success() {
        tracing::debug!("{} -gc {} exited with {}", jstat, pid, out.status);
    }
    Ok(parse_dump_kb(Cursor::new(out.stdout)))
}

/// Sum the used columns of the last well-formed row. jstat normally prints a
/// single snapshot row; if it prints several, the newest one wins.
pub fn parse_dump_kb<R: BufRead>(reader: R) -> Option<u64> {
    let record = TableScanner::new(reader)
        .filter(|tokens| !tokens.is_empty())
        .filter_map(|tokens| MemoryRecord::from_tokens(&tokens))
        .last()?;

    tracing::debug!("heap regions: {:.0} kB used of {:.0} kB committed", record.used_kb(), record.capacity_kb());
    if let Some(gc) = &record.gc {
        tracing::debug!(
            "gc so far: {} young ({:.3}s), {} full ({:.3}s), {:.3}s total",
            gc.young_count, gc.young_secs, gc.full_count, gc.full_secs, gc.total_secs,
        );
    }
    Some(record.used_kb().round() as u64)
}
