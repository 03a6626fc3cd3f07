use std::path::PathBuf;

use serde::Deserialize;

/// Terminal configuration loaded from disk and merged with overrides.
#[derive(Default, Deserialize, Debug, Clone)]
pub struct Config {
    /// Jump new output into view instead of animating the scroll.
    #[serde(default)]
    pub reduced_motion: bool,
}

/// Optional overrides for user configuration (e.g., from CLI flags).
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub reduced_motion: Option<bool>,
}

impl Config {
    /// Load configuration, applying any overrides (highest precedence) on top
    /// of `~/.lorebook/config.toml`.
    pub fn load_with_overrides(overrides: ConfigOverrides) -> Self {
        let mut cfg: Config = Self::load_from_toml().unwrap_or_default();
        if let Some(reduced_motion) = overrides.reduced_motion {
            cfg.reduced_motion = reduced_motion;
        }
        cfg
    }

    fn load_from_toml() -> Option<Self> {
        let mut path = lorebook_dir().ok()?;
        path.push("config.toml");
        let contents = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&contents) {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                tracing::warn!("failed to parse {}: {err}", path.display());
                None
            }
        }
    }
}

/// Returns the path to the lorebook state directory, `LOREBOOK_HOME` if set,
/// `~/.lorebook` otherwise. Does not verify the directory exists.
pub fn lorebook_dir() -> std::io::Result<PathBuf> {
    if let Ok(home) = std::env::var("LOREBOOK_HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    let mut path = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not find home directory",
        )
    })?;
    path.push(".lorebook");
    Ok(path)
}

/// Directory for log files, under the state directory.
pub fn log_dir() -> std::io::Result<PathBuf> {
    let mut path = lorebook_dir()?;
    path.push("log");
    Ok(path)
}
