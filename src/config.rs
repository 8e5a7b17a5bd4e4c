use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::Timing;
use crate::nav::ViewLevel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CnavConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

/// [timing] section: engine delays in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_suppress_ms")]
    pub suppress_ms: u64,
    #[serde(default = "default_copy_feedback_ms")]
    pub copy_feedback_ms: u64,
    #[serde(default = "default_progress_refresh_ms")]
    pub progress_refresh_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Pixels per rendered text line
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Lines per user scroll step
    #[serde(default = "default_scroll_step")]
    pub scroll_step: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_true")]
    pub open_on_start: bool,
    #[serde(default)]
    pub view: ViewLevel,
    #[serde(default = "default_panel_width")]
    pub width: u16,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_suppress_ms() -> u64 {
    800
}

fn default_copy_feedback_ms() -> u64 {
    1200
}

fn default_progress_refresh_ms() -> u64 {
    100
}

fn default_line_height() -> f64 {
    20.0
}

fn default_scroll_step() -> u16 {
    3
}

fn default_panel_width() -> u16 {
    44
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            suppress_ms: default_suppress_ms(),
            copy_feedback_ms: default_copy_feedback_ms(),
            progress_refresh_ms: default_progress_refresh_ms(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_height: default_line_height(),
            scroll_step: default_scroll_step(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            open_on_start: true,
            view: ViewLevel::default(),
            width: default_panel_width(),
        }
    }
}

impl TimingConfig {
    pub fn timing(&self) -> Timing {
        Timing {
            debounce: Duration::from_millis(self.debounce_ms),
            suppress: Duration::from_millis(self.suppress_ms),
            copy_feedback: Duration::from_millis(self.copy_feedback_ms),
            progress_refresh: Duration::from_millis(self.progress_refresh_ms),
        }
    }
}

/// Global config file: `~/.config/cnav/config.toml` (platform config dir).
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cnav").join("config.toml"))
}

/// Load config by merging global defaults with per-snapshot overrides.
/// Priority: `.cnav.toml` next to the snapshot > global config > built-in defaults.
/// Merging is deep: individual fields within sections (e.g. `[timing]`) override independently.
pub fn load_config(snapshot: &Path) -> CnavConfig {
    load_from(global_config_path().as_deref(), &local_config_path(snapshot))
}

fn local_config_path(snapshot: &Path) -> PathBuf {
    snapshot
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(".cnav.toml")
}

fn load_from(global_path: Option<&Path>, local_path: &Path) -> CnavConfig {
    let global_table = global_path.and_then(read_table);
    let local_table = read_table(local_path);

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return CnavConfig::default(),
    };

    merged.try_into().unwrap_or_else(|err| {
        tracing::warn!(%err, "invalid config; using defaults");
        CnavConfig::default()
    })
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    match content.parse::<toml::Table>() {
        Ok(table) => Some(table),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "config is not valid TOML");
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(None, &dir.path().join(".cnav.toml"));
        assert_eq!(config.timing.debounce_ms, 500);
        assert_eq!(config.timing.suppress_ms, 800);
        assert_eq!(config.layout.line_height, 20.0);
        assert_eq!(config.panel.view, ViewLevel::All);
        assert!(config.panel.open_on_start);
    }

    #[test]
    fn local_fields_override_global_fields() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join(".cnav.toml");
        fs::write(&global, "[timing]\ndebounce_ms = 300\nsuppress_ms = 900\n[panel]\nwidth = 60\n").unwrap();
        fs::write(&local, "[timing]\nsuppress_ms = 1000\n[panel]\nview = \"stars\"\n").unwrap();

        let config = load_from(Some(&global), &local);
        assert_eq!(config.timing.debounce_ms, 300);
        assert_eq!(config.timing.suppress_ms, 1000);
        assert_eq!(config.panel.width, 60);
        assert_eq!(config.panel.view, ViewLevel::StarredOnly);
        assert_eq!(config.timing.copy_feedback_ms, 1200);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(".cnav.toml");
        fs::write(&local, "[panel]\nview = \"sideways\"\n").unwrap();
        let config = load_from(None, &local);
        assert_eq!(config.panel.view, ViewLevel::All);
    }

    #[test]
    fn local_config_sits_next_to_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".cnav.toml"), "[layout]\nscroll_step = 7\n").unwrap();
        let local = local_config_path(&dir.path().join("page.html"));
        let config = load_from(None, &local);
        assert_eq!(config.layout.scroll_step, 7);
    }

    #[test]
    fn timing_converts_to_durations() {
        let timing = TimingConfig::default().timing();
        assert_eq!(timing, Timing::default());
    }
}
