use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fraction of the free space a dump may use when nothing is configured.
pub const DEFAULT_MARGIN: f64 = 2.0 / 3.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Where dumps go when --dir is not given. Empty = the system temp dir.
    pub output_dir: String,
    /// Estimated dumps above this size (kB) get a "this will take a while" notice.
    pub patience_threshold_kb: u64,
    /// gzip the dump in the background after a successful jmap run.
    pub compress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Largest share of the free space the estimated dump may take, in (0, 1].
    pub margin: f64,
}

/// Program names (or absolute paths) of the external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub jps:   String,
    pub jstat: String,
    pub df:    String,
    pub jmap:  String,
    pub gzip:  String,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir:            String::new(),
            patience_threshold_kb: 1_048_576,
            compress:              true,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self { margin: DEFAULT_MARGIN }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            jps:   "jps".into(),
            jstat: "jstat".into(),
            df:    "df".into(),
            jmap:  "jmap".into(),
            gzip:  "gzip".into(),
        }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(e) => {
                tracing::debug!("using default config: {}", e);
                // Write defaults on first run (best-effort)
                if Self::config_path().map_or(false, |p| !p.exists()) {
                    if let Err(e) = try_write_defaults() {
                        tracing::debug!("could not write default config: {}", e);
                    }
                }
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("heapsafe").join("heapsafe.toml"))
    }

    /// Configured default output directory, or the system temp dir.
    pub fn default_output_dir(&self) -> PathBuf {
        if self.general.output_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.general.output_dir)
        }
    }
}

/// Reject margins that would make the comparison meaningless.
pub fn validate_margin(margin: f64) -> Result<f64> {
    if margin.is_finite() && margin > 0.0 && margin <= 1.0 {
        Ok(margin)
    } else {
        anyhow::bail!("safety margin must be in (0, 1], got {}", margin)
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&text)?;
    Ok(cfg)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    write_defaults_to(&path)
}

fn write_defaults_to(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# heapsafe configuration\n# Generated on first run — edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: Config = toml::from_str("[safety]\nmargin = 0.5\n\n[tools]\njmap = \"/opt/jdk/bin/jmap\"\n").unwrap();
        assert_eq!(cfg.safety.margin, 0.5);
        assert_eq!(cfg.tools.jmap, "/opt/jdk/bin/jmap");
        assert_eq!(cfg.tools.jstat, "jstat");
        assert!(cfg.general.compress);
        assert_eq!(cfg.general.patience_threshold_kb, 1_048_576);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg: Config = toml::from_str(&text).unwrap();
        assert_eq!(cfg.safety.margin, DEFAULT_MARGIN);
        assert_eq!(cfg.tools.gzip, "gzip");
    }

    #[test]
    fn generated_defaults_load_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("heapsafe.toml");
        write_defaults_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# heapsafe configuration"));
        let cfg: Config = toml::from_str(&text).unwrap();
        assert_eq!(cfg.tools.jmap, "jmap");

        // a file where the parent directory should be makes the write fail
        let blocked = path.join("heapsafe.toml");
        assert!(write_defaults_to(&blocked).is_err());
    }

    #[test]
    fn output_dir_falls_back_to_temp() {
        let mut cfg = Config::default();
        assert_eq!(cfg.default_output_dir(), std::env::temp_dir());
        cfg.general.output_dir = "/var/dumps".into();
        assert_eq!(cfg.default_output_dir(), PathBuf::from("/var/dumps"));
    }

    #[test]
    fn margin_bounds() {
        assert!(validate_margin(1.0).is_ok());
        assert!(validate_margin(DEFAULT_MARGIN).is_ok());
        assert!(validate_margin(0.0).is_err());
        assert!(validate_margin(1.5).is_err());
        assert!(validate_margin(-0.2).is_err());
        assert!(validate_margin(f64::NAN).is_err());
    }
}
