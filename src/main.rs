mod collectors;
mod config;
mod dump;
mod models;
mod safety;
#[cfg(test)]
mod testutil;
mod util;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use collectors::{df, jps, jstat};
use config::Config;
use models::verdict::CheckReport;
use safety::{Decision, Preflight};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "heapsafe", about = "Safety-checked JVM heap dumps", version)]
struct Cli {
    /// Process id of the JVM to dump
    pid: Option<String>,

    /// Only run the safety checks: exit 0 if a dump would be safe, 1 if not
    #[arg(short, long)]
    check: bool,

    /// Directory to write the dump into (default: config output_dir, else the temp dir)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Dump even if the safety checks fail
    #[arg(short, long)]
    force: bool,

    /// Leave the dump uncompressed
    #[arg(short = 'n', long)]
    no_compress: bool,

    /// Largest fraction of the free space the dump may use, in (0, 1]
    #[arg(short, long, value_name = "FRACTION")]
    margin: Option<f64>,

    /// With --check: print the verdict as JSON on stdout
    #[arg(long, requires = "check")]
    json: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    print_config: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<clap_complete::Shell>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    util::logging::init(cli.verbose, cli.quiet);

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "heapsafe", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = Config::load();
    if cli.print_config {
        return run_print_config(&cfg);
    }

    let code = match run(&cli, &cfg) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            tracing::error!("No action taken.");
            1
        }
    };
    std::process::exit(code);
}

/// Gather readings, run every check, then decide. Returns the exit code.
fn run(cli: &Cli, cfg: &Config) -> Result<i32> {
    let pid    = parse_pid(cli.pid.as_deref())?;
    let margin = config::validate_margin(cli.margin.unwrap_or(cfg.safety.margin))?;
    let dir    = resolve_dir(cli.dir.as_deref(), cfg)?;

    let process = best_effort(jps::find_jvm(&cfg.tools.jps, pid));
    if let Some(name) = &process {
        tracing::info!("Process {} is a JVM ({})", pid, name);
    }
    let dump_kb = best_effort(jstat::estimate_dump_kb(&cfg.tools.jstat, pid));
    let free_kb = if dir.is_dir() {
        best_effort(df::available_kb(&cfg.tools.df, &dir))
    } else {
        None
    };

    let name = process.as_deref().unwrap_or(jps::UNKNOWN_NAME);
    let file = dump::output_path(&dir, &dump::short_hostname(), chrono::Local::now(), name, pid);

    let pf = Preflight { pid, process, dump_kb, free_kb, margin, dir, file };
    let verdict  = safety::evaluate(&pf);
    let decision = safety::decide(&verdict, cli.check, cli.force);

    if cli.json {
        let report = CheckReport {
            pid,
            process:          pf.process.clone(),
            output_file:      pf.file.clone(),
            dump_estimate_kb: dump_kb,
            free_space_kb:    free_kb,
            margin,
            verdict:          verdict.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    for msg in verdict.diagnostics.iter() {
        if decision == Decision::Override {
            tracing::warn!("{}", msg);
        } else {
            tracing::error!("{}", msg);
        }
    }

    match decision {
        Decision::CheckPassed => {
            tracing::info!("All safety checks passed; dumping process {} to {} looks safe", pid, pf.file.display());
        }
        Decision::CheckFailed => {
            tracing::error!("{} safety check(s) failed. No action taken.", verdict.diagnostics.len());
        }
        Decision::Abort => {
            tracing::error!(
                "{} safety check(s) failed; use --force to dump anyway. No action taken.",
                verdict.diagnostics.len(),
            );
        }
        Decision::Override => {
            tracing::warn!("Safety checks failed, continuing because of --force");
        }
        Decision::Proceed => {}
    }

    if decision.dumps() {
        let plan = dump::DumpPlan {
            pid,
            file:                  pf.file.clone(),
            estimate_kb:           dump_kb,
            compress:              cfg.general.compress && !cli.no_compress,
            patience_threshold_kb: cfg.general.patience_threshold_kb,
        };
        if let Err(e) = dump::execute(&plan, &cfg.tools) {
            tracing::error!("Heap dump failed: {:#}", e);
            return Ok(1);
        }
    }
    Ok(decision.exit_code())
}

fn parse_pid(arg: Option<&str>) -> Result<u32> {
    let raw = match arg {
        Some(s) => s.trim(),
        None    => bail!("missing process id (see --help)"),
    };
    // u32::from_str accepts a leading '+'; a pid is digits only
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        bail!("invalid process id {:?}: expected a positive number", raw);
    }
    match raw.parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => bail!("invalid process id {:?}: expected a positive number", raw),
    }
}

fn resolve_dir(arg: Option<&Path>, cfg: &Config) -> Result<PathBuf> {
    let dir = arg.map(Path::to_path_buf).unwrap_or_else(|| cfg.default_output_dir());
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    Ok(cwd.join(dir))
}

/// A tool that would not start only costs us its reading.
fn best_effort<T>(reading: Result<Option<T>>) -> Option<T> {
    match reading {
        Ok(v)  => v,
        Err(e) => {
            tracing::warn!("{:#}", e);
            None
        }
    }
}

fn run_print_config(cfg: &Config) -> Result<()> {
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    let g = &cfg.general;
    let t = &cfg.tools;
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  output_dir            = {}", cfg.default_output_dir().display());
    println!("  patience_threshold_kb = {}", util::human::fmt_kb(g.patience_threshold_kb));
    println!("  compress              = {}", g.compress);
    println!();
    println!("[safety]");
    println!("  margin                = {:.4}", cfg.safety.margin);
    println!();
    println!("[tools]");
    println!("  jps   = {}", t.jps);
    println!("  jstat = {}", t.jstat);
    println!("  df    = {}", t.df);
    println!("  jmap  = {}", t.jmap);
    println!("  gzip  = {}", t.gzip);
    Ok(())
}
