//! Persisted dark/light preference.
//!
//! The only durable state the front end keeps: a single word in a small
//! file. Reads never fail; anything unreadable means the default theme.
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use wayfinder_common::Result;

const THEME_FILE: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Glyph shown on the toggle control.
    pub fn glyph(&self) -> &'static str {
        match self {
            Theme::Dark => "☀",
            Theme::Light => "✦",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data dir (`~/.local/share/wayfinder/theme` on Linux),
    /// unless an explicit path is configured.
    pub fn from_config(explicit: Option<&str>) -> Self {
        if let Some(p) = explicit {
            return Self::new(shellexpand::tilde(p).into_owned());
        }
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("wayfinder").join(THEME_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Theme {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Theme::parse(&raw).unwrap_or_else(|| {
                tracing::debug!(path = %self.path.display(), "theme.load.unrecognised");
                Theme::default()
            }),
            Err(_) => Theme::default(),
        }
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, theme.as_str())?;
        tracing::debug!(path = %self.path.display(), %theme, "theme.saved");
        Ok(())
    }

    /// Flip the stored theme and return the new value.
    pub fn toggle(&self) -> Result<Theme> {
        let next = self.load().toggled();
        self.save(next)?;
        Ok(next)
    }
}
