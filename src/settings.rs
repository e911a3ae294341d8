//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/tetrs/settings.toml (or platform equivalent)

use crate::game::Timing;
use crate::mode::{GameMode, RecordStore};
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Game settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
    /// Visual settings
    pub visual: VisualSettings,
    /// Personal bests
    pub records: Records,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_cw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_ccw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hold: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub abort: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub restart: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if let [key] = keys.as_slice() {
        serializer.serialize_str(key)
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            move_left: keys(&["Left"]),
            move_right: keys(&["Right"]),
            soft_drop: keys(&["Down"]),
            hard_drop: keys(&["Space"]),
            rotate_cw: keys(&["Up", "x"]),
            rotate_ccw: keys(&["z"]),
            hold: keys(&["c", "Shift"]),
            abort: keys(&["Esc"]),
            restart: keys(&["r"]),
            quit: keys(&["q"]),
        }
    }
}

/// Gameplay settings, all timers in 60 Hz ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Delayed Auto Shift
    pub das: u32,
    /// Auto Repeat Rate (0 = instant)
    pub arr: u32,
    /// Ticks per gravity step
    pub gravity: u32,
    pub lock_delay: u32,
    pub max_lock_resets: u32,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            das: timing.das,
            arr: timing.arr,
            gravity: timing.gravity,
            lock_delay: timing.lock_delay,
            max_lock_resets: timing.max_lock_resets,
        }
    }
}

impl From<&GameplaySettings> for Timing {
    fn from(settings: &GameplaySettings) -> Self {
        Self {
            das: settings.das,
            arr: settings.arr,
            gravity: settings.gravity,
            lock_delay: settings.lock_delay,
            max_lock_resets: settings.max_lock_resets,
        }
        .clamped()
    }
}

/// Visual settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Ghost piece visibility
    pub show_ghost: bool,
    /// Block style: "solid", "bracket", "round"
    pub block_style: String,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            show_ghost: true,
            block_style: "solid".to_string(),
        }
    }
}

impl VisualSettings {
    /// Get the block and ghost characters based on style
    pub fn block_chars(&self) -> (&'static str, &'static str) {
        match self.block_style.as_str() {
            "bracket" => ("[]", ".."),
            "round" => ("()", ".."),
            _ => ("██", "░░"), // "solid" or default
        }
    }
}

/// Personal best per mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Records {
    /// Highest Marathon score
    pub marathon: Option<u64>,
    /// Fastest Sprint in milliseconds
    pub sprint: Option<u64>,
}

impl RecordStore for Settings {
    fn personal_best(&self, mode: GameMode) -> Option<u64> {
        match mode {
            GameMode::Marathon => self.records.marathon,
            GameMode::Sprint => self.records.sprint,
        }
    }

    fn set_personal_best(&mut self, mode: GameMode, value: u64) {
        match mode {
            GameMode::Marathon => self.records.marathon = Some(value),
            GameMode::Sprint => self.records.sprint = Some(value),
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "tetrs", "tetrs").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, or fall back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("No config directory, using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from a specific file. A missing file is not an error;
    /// an unreadable or malformed one is logged and replaced by defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    /// Save settings to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Engine timing derived from the gameplay section
    pub fn timing(&self) -> Timing {
        Timing::from(&self.gameplay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{GameResult, Outcome};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tetrs-settings-{}-{}", std::process::id(), name))
            .join("settings.toml")
    }

    #[test]
    fn test_defaults_match_engine_timing() {
        let settings = Settings::default();
        assert_eq!(settings.timing(), Timing::default());
        assert_eq!(settings.gameplay.das, 10);
        assert_eq!(settings.gameplay.arr, 2);
    }

    #[test]
    fn test_single_key_or_list() {
        let settings: Settings = toml::from_str(
            r#"
            [keys]
            hard_drop = "Enter"
            hold = ["c", "v"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.keys.hard_drop, vec!["Enter"]);
        assert_eq!(settings.keys.hold, vec!["c", "v"]);
        // Missing entries keep their defaults
        assert_eq!(settings.keys.move_left, vec!["Left"]);
        assert_eq!(settings.gameplay, GameplaySettings::default());
    }

    #[test]
    fn test_zero_thresholds_are_clamped() {
        let gameplay = GameplaySettings {
            gravity: 0,
            lock_delay: 0,
            arr: 0,
            ..GameplaySettings::default()
        };
        let timing = Timing::from(&gameplay);
        assert_eq!(timing.gravity, 1);
        assert_eq!(timing.lock_delay, 1);
        assert_eq!(timing.arr, 0);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut settings = Settings::default();
        settings.gameplay.das = 7;
        settings.visual.show_ghost = false;
        let result = GameResult {
            mode: GameMode::Marathon,
            outcome: Outcome::Lost,
            score: 1234,
            lines: 10,
            ticks: 600,
        };
        assert!(result.submit(&mut settings));

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.personal_best(GameMode::Marathon), Some(1234));
        assert_eq!(loaded.personal_best(GameMode::Sprint), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "gameplay = [not toml").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_is_default() {
        assert_eq!(Settings::load_from(&temp_path("missing")), Settings::default());
    }

    #[test]
    fn test_block_chars() {
        let mut visual = VisualSettings::default();
        assert_eq!(visual.block_chars().0, "██");
        visual.block_style = "bracket".to_string();
        assert_eq!(visual.block_chars(), ("[]", ".."));
    }
}
