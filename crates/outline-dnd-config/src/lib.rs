use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown drop operation '{0}' (expected move, copy, embed or none)")]
    UnknownOperation(String),
}

/// What a drop does with the dragged block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Delete the block at its origin and insert it at the drop site
    Move,
    /// Insert the block at the drop site, leaving the origin untouched
    Copy,
    /// Anchor the block and insert a transclusion of it at the drop site
    Embed,
    /// Ignore the drop
    None,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Move => "move",
            OperationKind::Copy => "copy",
            OperationKind::Embed => "embed",
            OperationKind::None => "none",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(OperationKind::Move),
            "copy" => Ok(OperationKind::Copy),
            "embed" => Ok(OperationKind::Embed),
            "none" => Ok(OperationKind::None),
            _ => Err(ConfigError::UnknownOperation(s.to_string())),
        }
    }
}

/// Modifier keys held at the moment of the drop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }
}

/// Whether the drop lands in the pane the drag started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneRelation {
    Same,
    Different,
}

/// One configurable entry of the settings table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSlot {
    SimpleSamePane,
    SimpleDifferentPanes,
    Shift,
    Alt,
    Ctrl,
}

/// Persisted mapping from drop gesture to operation.
///
/// Keys missing from the stored file take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    pub simple_same_pane: OperationKind,
    pub simple_different_panes: OperationKind,
    pub shift: OperationKind,
    pub alt: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctrl: Option<OperationKind>,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            simple_same_pane: OperationKind::Move,
            simple_different_panes: OperationKind::Embed,
            shift: OperationKind::Copy,
            alt: OperationKind::None,
            ctrl: None,
        }
    }
}

impl DragSettings {
    /// Pick the operation for a drop.
    ///
    /// Shift wins over alt, alt over ctrl. A held ctrl without a configured
    /// entry behaves like an unmodified drop.
    pub fn resolve(&self, modifiers: Modifiers, relation: PaneRelation) -> OperationKind {
        if modifiers.shift {
            return self.shift;
        }
        if modifiers.alt {
            return self.alt;
        }
        if modifiers.ctrl
            && let Some(kind) = self.ctrl
        {
            return kind;
        }
        match relation {
            PaneRelation::Same => self.simple_same_pane,
            PaneRelation::Different => self.simple_different_panes,
        }
    }

    pub fn get(&self, slot: SettingSlot) -> Option<OperationKind> {
        match slot {
            SettingSlot::SimpleSamePane => Some(self.simple_same_pane),
            SettingSlot::SimpleDifferentPanes => Some(self.simple_different_panes),
            SettingSlot::Shift => Some(self.shift),
            SettingSlot::Alt => Some(self.alt),
            SettingSlot::Ctrl => self.ctrl,
        }
    }

    pub fn set(&mut self, slot: SettingSlot, kind: OperationKind) {
        match slot {
            SettingSlot::SimpleSamePane => self.simple_same_pane = kind,
            SettingSlot::SimpleDifferentPanes => self.simple_different_panes = kind,
            SettingSlot::Shift => self.shift = kind,
            SettingSlot::Alt => self.alt = kind,
            SettingSlot::Ctrl => self.ctrl = Some(kind),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let settings: DragSettings =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(settings))
    }

    /// Load from the default location, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(Self::config_path())?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/outline-dnd");
        PathBuf::from(config_dir.as_ref()).join("settings.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = DragSettings::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/outline-dnd/settings.toml"));
    }

    #[test]
    fn test_defaults() {
        let settings = DragSettings::default();
        assert_eq!(settings.simple_same_pane, OperationKind::Move);
        assert_eq!(settings.simple_different_panes, OperationKind::Embed);
        assert_eq!(settings.shift, OperationKind::Copy);
        assert_eq!(settings.alt, OperationKind::None);
        assert_eq!(settings.ctrl, None);
    }

    #[rstest]
    #[case(Modifiers::none(), PaneRelation::Same, OperationKind::Move)]
    #[case(Modifiers::none(), PaneRelation::Different, OperationKind::Embed)]
    #[case(Modifiers::shift(), PaneRelation::Same, OperationKind::Copy)]
    #[case(Modifiers::shift(), PaneRelation::Different, OperationKind::Copy)]
    #[case(Modifiers::alt(), PaneRelation::Same, OperationKind::None)]
    #[case(Modifiers::ctrl(), PaneRelation::Same, OperationKind::Move)]
    #[case(Modifiers::ctrl(), PaneRelation::Different, OperationKind::Embed)]
    fn test_resolve_with_defaults(
        #[case] modifiers: Modifiers,
        #[case] relation: PaneRelation,
        #[case] expected: OperationKind,
    ) {
        assert_eq!(DragSettings::default().resolve(modifiers, relation), expected);
    }

    #[test]
    fn test_shift_takes_precedence_over_alt() {
        let modifiers = Modifiers {
            shift: true,
            alt: true,
            ctrl: true,
        };
        assert_eq!(
            DragSettings::default().resolve(modifiers, PaneRelation::Same),
            OperationKind::Copy
        );
    }

    #[test]
    fn test_configured_ctrl_is_used() {
        let mut settings = DragSettings::default();
        settings.set(SettingSlot::Ctrl, OperationKind::Embed);

        assert_eq!(
            settings.resolve(Modifiers::ctrl(), PaneRelation::Same),
            OperationKind::Embed
        );
        assert_eq!(settings.get(SettingSlot::Ctrl), Some(OperationKind::Embed));
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let settings: DragSettings = toml::from_str("shift = \"embed\"\n").unwrap();

        assert_eq!(settings.shift, OperationKind::Embed);
        assert_eq!(settings.simple_same_pane, OperationKind::Move);
        assert_eq!(settings.simple_different_panes, OperationKind::Embed);
        assert_eq!(settings.alt, OperationKind::None);
    }

    #[test]
    fn test_unknown_value_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("settings.toml");
        std::fs::write(&config_file, "alt = \"teleport\"\n").unwrap();

        let result = DragSettings::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[rstest]
    #[case("move", OperationKind::Move)]
    #[case("Copy", OperationKind::Copy)]
    #[case(" embed ", OperationKind::Embed)]
    #[case("none", OperationKind::None)]
    fn test_operation_from_str(#[case] input: &str, #[case] expected: OperationKind) {
        assert_eq!(input.parse::<OperationKind>().unwrap(), expected);
    }

    #[test]
    fn test_operation_from_str_rejects_unknown() {
        assert!(matches!(
            "link".parse::<OperationKind>(),
            Err(ConfigError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_load_settings_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nonexistent.toml");

        let result = DragSettings::load_from_path(&missing).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("settings.toml");
        let mut settings = DragSettings::default();
        settings.set(SettingSlot::Alt, OperationKind::Copy);
        settings.set(SettingSlot::Ctrl, OperationKind::Move);

        settings.save_to_path(&config_file).unwrap();
        let loaded = DragSettings::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_unset_ctrl_is_not_written() {
        let content = toml::to_string_pretty(&DragSettings::default()).unwrap();

        assert!(content.contains("simple_same_pane = \"move\""));
        assert!(!content.contains("ctrl"));
    }
}
