//! Game configuration (window, camera, viewport overlays). Loaded from
//! config.ron at startup.

use serde::{Deserialize, Serialize};

/// Persistent settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Enable vsync (recommended to avoid tearing).
    #[serde(default = "default_true")]
    pub vsync: bool,
    /// Main screen camera field of view in degrees, valid range (0, 180).
    #[serde(default = "default_fov")]
    pub main_screen_fov: f32,
    /// Skybox drawn outside any zone override.
    #[serde(default = "default_skybox")]
    pub default_skybox: String,
    /// Draw ship callsigns on the main screen.
    #[serde(default = "default_true")]
    pub show_callsigns: bool,
    /// Draw the heading ring around the player ship.
    #[serde(default = "default_true")]
    pub show_headings: bool,
    /// Draw space-dust motion streaks.
    #[serde(default = "default_true")]
    pub show_spacedust: bool,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}
fn default_fov() -> f32 {
    60.0
}
fn default_skybox() -> String {
    "default".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            vsync: default_true(),
            main_screen_fov: default_fov(),
            default_skybox: default_skybox(),
            show_callsigns: default_true(),
            show_headings: default_true(),
            show_spacedust: default_true(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. Missing or invalid files fall back to
    /// defaults with a warning.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_main_screen_expectations() {
        let c = GameConfig::default();
        assert_eq!(c.main_screen_fov, 60.0);
        assert_eq!(c.default_skybox, "default");
        assert!(c.show_callsigns && c.show_headings && c.show_spacedust);
    }

    #[test]
    fn partial_ron_fills_missing_fields() {
        let c: GameConfig = ron::from_str("(window_width: 1920)").unwrap();
        assert_eq!(c.window_width, 1920);
        assert_eq!(c.window_height, 720);
        assert_eq!(c.default_skybox, "default");
    }
}
