//! Application settings.
//!
//! [`Settings::load`] layers `<config dir>/weapons-sheet/config.toml` over the
//! embedded defaults. The file is optional.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG: &str = r#"
[source]
url             = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSWH5gVlpnYxhoWAG-1nJbxbHlGSsJ1NwlHjsYsCRf6Lu8WXal172tVV4ypk-LaTO_ANn3-4xvGsZu1/pub?gid=0&single=true&output=csv"
refresh_minutes = 10
timeout_secs    = 30

[window]
width  = 1600.0
height = 1000.0
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub source: SourceSettings,
    pub window: WindowSettings,
}

/// `[source]`: the published sheet polled in the background.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub url: String,
    pub refresh_minutes: u64,
    pub timeout_secs: u64,
}

impl SourceSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes.max(1) * 60)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));

        if let Some(path) = config_path() {
            tracing::debug!(path = %path.display(), "looking for settings file");
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }

        builder.build()?.try_deserialize().map_err(Into::into)
    }

    /// Built-in defaults, without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize")
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("weapons-sheet").join("config.toml"))
}
