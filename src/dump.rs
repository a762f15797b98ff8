use crate::config::ToolsConfig;
use crate::util::human::fmt_kb_approx;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A dump that has been cleared to run.
#[derive(Debug, Clone)]
pub struct DumpPlan {
    pub pid:                   u32,
    pub file:                  PathBuf,
    pub estimate_kb:           Option<u64>,
    pub compress:              bool,
    pub patience_threshold_kb: u64,
}

/// `<dir>/jmap.<host>.<YYYYMMDD-HHMMSS>.<name>.<pid>.bin`
pub fn output_path(dir: &Path, host: &str, when: DateTime<Local>, name: &str, pid: u32) -> PathBuf {
    // jps -l style names can carry path separators
    let name = name.replace('/', "_");
    dir.join(format!("jmap.{}.{}.{}.{}.bin", host, when.format("%Y%m%d-%H%M%S"), name, pid))
}

/// Local hostname without any domain suffix.
pub fn short_hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(h)  => short_host(&h.to_string_lossy()),
        Err(e) => {
            tracing::warn!("could not read hostname: {}", e);
            "localhost".to_string()
        }
    }
}

fn short_host(full: &str) -> String {
    let short = full.split('.').next().unwrap_or_default();
    if short.is_empty() { "localhost".to_string() } else { short.to_string() }
}

/// Run jmap and, when it succeeds, hand the file to gzip in the background.
/// A failed dump is always fatal: compression is never attempted on it.
pub fn execute(plan: &DumpPlan, tools: &ToolsConfig) -> Result<()> {
    if let Some(kb) = plan.estimate_kb.filter(|&kb| kb > plan.patience_threshold_kb) {
        tracing::info!(
            "Dumping roughly {} of heap; this can take several minutes and the JVM is paused meanwhile. Please be patient.",
            fmt_kb_approx(kb),
        );
    }

    tracing::info!("Dumping heap of process {} to {}", plan.pid, plan.file.display());
    run_jmap(&tools.jmap, plan.pid, &plan.file)?;
    tracing::info!("Heap dump written to {}", plan.file.display());

    if plan.compress {
        match spawn_compression(&tools.gzip, &plan.file) {
            Ok(())  => tracing::info!("Compressing {} in the background", plan.file.display()),
            Err(e)  => tracing::warn!("{:#}; dump left uncompressed", e),
        }
    }
    Ok(())
}

pub fn run_jmap(jmap: &str, pid: u32, file: &Path) -> Result<()> {
    let status = Command::new(jmap)
        .arg(format!("-dump:format=b,file={}", file.display()))
        .arg(pid.to_string())
        .status()
        .with_context(|| format!("{} could not be started", jmap))?;

    if !status.success() {
        match status.code() {
            Some(code) => bail!("{} exited with status {}", jmap, code),
            None       => bail!("{} was terminated by a signal", jmap),
        }
    }
    Ok(())
}

/// Start the compressor detached and return immediately. The child is never
/// waited on, so whether it finishes, or succeeds, is not observed here.
pub fn spawn_compression(gzip: &str, file: &Path) -> Result<()> {
    Command::new(gzip)
        .arg(file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("{} could not be started", gzip))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::recording_tool;
    use chrono::TimeZone;
    use std::fs;
    use std::time::{Duration, Instant};

    #[test]
    fn file_name_layout() {
        let when = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        let p = output_path(Path::new("/var/dumps"), "web01", when, "bootstrap", 1187);
        assert_eq!(p, PathBuf::from("/var/dumps/jmap.web01.20260307-090501.bootstrap.1187.bin"));

        let p = output_path(Path::new("/d"), "h", when, "lib/app.jar", 1);
        assert_eq!(p.file_name().unwrap(), "jmap.h.20260307-090501.lib_app.jar.1.bin");
    }

    #[test]
    fn strips_domain() {
        assert_eq!(short_host("web01.prod.example.com"), "web01");
        assert_eq!(short_host("web01"), "web01");
        assert_eq!(short_host(""), "localhost");
        assert!(!short_hostname().contains('.'));
    }

    #[test]
    fn jmap_arguments_and_status() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("jmap.log");
        let ok = recording_tool(tmp.path(), "jmap-ok", &log, 0);
        let file = tmp.path().join("out.bin");

        run_jmap(&ok, 321, &file).unwrap();
        let logged = fs::read_to_string(&log).unwrap();
        assert_eq!(logged.trim(), format!("-dump:format=b,file={} 321", file.display()));

        let bad = recording_tool(tmp.path(), "jmap-bad", &log, 3);
        let err = run_jmap(&bad, 321, &file).unwrap_err();
        assert!(err.to_string().contains("status 3"), "{}", err);

        assert!(run_jmap("/nonexistent/heapsafe-jmap", 321, &file).is_err());
    }

    #[test]
    fn failed_dump_never_compresses() {
        let tmp = tempfile::tempdir().unwrap();
        let jmap_log = tmp.path().join("jmap.log");
        let gzip_log = tmp.path().join("gzip.log");
        let tools = ToolsConfig {
            jmap: recording_tool(tmp.path(), "jmap", &jmap_log, 1),
            gzip: recording_tool(tmp.path(), "gzip", &gzip_log, 0),
            ..ToolsConfig::default()
        };
        let plan = DumpPlan {
            pid:                   5,
            file:                  tmp.path().join("out.bin"),
            estimate_kb:           Some(10),
            compress:              true,
            patience_threshold_kb: 1,
        };
        assert!(execute(&plan, &tools).is_err());
        assert!(jmap_log.exists());
        assert!(!gzip_log.exists());
    }

    #[test]
    fn successful_dump_schedules_compression() {
        let tmp = tempfile::tempdir().unwrap();
        let jmap_log = tmp.path().join("jmap.log");
        let gzip_log = tmp.path().join("gzip.log");
        let tools = ToolsConfig {
            jmap: recording_tool(tmp.path(), "jmap", &jmap_log, 0),
            gzip: recording_tool(tmp.path(), "gzip", &gzip_log, 0),
            ..ToolsConfig::default()
        };
        let plan = DumpPlan {
            pid:                   5,
            file:                  tmp.path().join("out.bin"),
            estimate_kb:           None,
            compress:              true,
            patience_threshold_kb: 1,
        };
        execute(&plan, &tools).unwrap();

        // compression is detached; give it a moment to show up
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut logged = String::new();
        while !logged.contains("out.bin") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            logged = fs::read_to_string(&gzip_log).unwrap_or_default();
        }
        assert!(logged.contains("out.bin"), "gzip was not started: {:?}", logged);
    }

    #[test]
    fn missing_compressor_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let tools = ToolsConfig {
            jmap: recording_tool(tmp.path(), "jmap", &tmp.path().join("jmap.log"), 0),
            gzip: "/nonexistent/heapsafe-gzip".into(),
            ..ToolsConfig::default()
        };
        let plan = DumpPlan {
            pid:                   5,
            file:                  tmp.path().join("out.bin"),
            estimate_kb:           Some(1),
            compress:              true,
            patience_threshold_kb: 1_048_576,
        };
        assert!(execute(&plan, &tools).is_ok());
        assert!(spawn_compression(&tools.gzip, &plan.file).is_err());
    }
}
