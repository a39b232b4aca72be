//! User settings for the decorator.
//!
//! Settings are read from a TOML file, usually
//! `$XDG_CONFIG_HOME/roundwin/config.toml`. Every field has a default, so an
//! empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: SettingsKey, reason: String },
}

/// Names of the settings the decorator reacts to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
    EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SettingsKey {
    GlobalRoundedCornerSettings,
    FocusedShadow,
    UnfocusedShadow,
    BorderWidth,
    BorderColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Padding {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepRoundedCorners {
    pub maximized: bool,
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundedCornersConfig {
    pub border_radius: f64,
    /// Multiplicative boost applied to the radius, see [`Self::effective_radius`].
    pub smoothing: f64,
    pub padding: Padding,
    pub keep_rounded_corners: KeepRoundedCorners,
    pub enabled: bool,
}

impl Default for RoundedCornersConfig {
    fn default() -> Self {
        RoundedCornersConfig {
            border_radius: 12.0,
            smoothing: 0.0,
            padding: Padding::uniform(1.0),
            keep_rounded_corners: KeepRoundedCorners::default(),
            enabled: true,
        }
    }
}

impl RoundedCornersConfig {
    pub fn effective_radius(&self) -> f64 {
        (self.border_radius * (1.0 + self.smoothing)).max(0.0)
    }
}

/// Box shadow parameters for one focus state. Opacity is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowStyle {
    pub opacity: f64,
    pub spread_radius: f64,
    pub blur_offset: f64,
    pub vertical_offset: f64,
    pub horizontal_offset: f64,
}

impl ShadowStyle {
    pub fn focused() -> Self {
        ShadowStyle {
            opacity: 60.0,
            spread_radius: 4.0,
            blur_offset: 28.0,
            vertical_offset: 4.0,
            horizontal_offset: 0.0,
        }
    }

    pub fn unfocused() -> Self {
        ShadowStyle {
            opacity: 65.0,
            spread_radius: -1.0,
            blur_offset: 12.0,
            vertical_offset: 2.0,
            horizontal_offset: 0.0,
        }
    }
}

impl Default for ShadowStyle {
    fn default() -> Self { ShadowStyle::focused() }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderConfig {
    pub width: f64,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "border-width")]
    pub border_width: f64,
    #[serde(rename = "border-color")]
    pub border_color: [f32; 4],
    /// `None` when the corner settings are missing; style updates are skipped
    /// until they come back.
    #[serde(rename = "global-rounded-corner-settings")]
    pub rounded_corners: Option<RoundedCornersConfig>,
    #[serde(rename = "focused-shadow")]
    pub focused_shadow: ShadowStyle,
    #[serde(rename = "unfocused-shadow")]
    pub unfocused_shadow: ShadowStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            border_width: 0.0,
            border_color: [0.5, 0.5, 0.5, 1.0],
            rounded_corners: Some(RoundedCornersConfig::default()),
            focused_shadow: ShadowStyle::focused(),
            unfocused_shadow: ShadowStyle::unfocused(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("roundwin").join("config.toml"))
    }

    pub fn read(path: &Path) -> Result<Settings, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let settings = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Settings, toml::de::Error> { toml::from_str(text) }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> { toml::to_string(self) }

    pub fn shadow_for(&self, focused: bool) -> ShadowStyle {
        if focused { self.focused_shadow } else { self.unfocused_shadow }
    }

    pub fn border(&self) -> BorderConfig {
        BorderConfig {
            width: self.border_width,
            color: self.border_color,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key, reason: &str| {
            Err(ConfigError::Invalid { key, reason: reason.to_string() })
        };

        if let Some(cfg) = &self.rounded_corners {
            let key = SettingsKey::GlobalRoundedCornerSettings;
            if !cfg.border_radius.is_finite() || cfg.border_radius < 0.0 {
                return invalid(key, "border_radius must be a non-negative number");
            }
            if !cfg.smoothing.is_finite() || cfg.smoothing < 0.0 {
                return invalid(key, "smoothing must be a non-negative number");
            }
            let p = cfg.padding;
            if [p.left, p.right, p.top, p.bottom].iter().any(|v| !v.is_finite() || *v < 0.0) {
                return invalid(key, "padding must be non-negative");
            }
        }

        for (key, shadow) in [
            (SettingsKey::FocusedShadow, &self.focused_shadow),
            (SettingsKey::UnfocusedShadow, &self.unfocused_shadow),
        ] {
            let values = [
                shadow.opacity,
                shadow.spread_radius,
                shadow.blur_offset,
                shadow.vertical_offset,
                shadow.horizontal_offset,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return invalid(key, "shadow values must be finite numbers");
            }
            if !(0.0..=100.0).contains(&shadow.opacity) {
                return invalid(key, "opacity must be between 0 and 100");
            }
            if shadow.blur_offset < 0.0 {
                return invalid(key, "blur_offset must be non-negative");
            }
        }

        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return invalid(SettingsKey::BorderWidth, "border width must be non-negative");
        }
        if self.border_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return invalid(SettingsKey::BorderColor, "color components must be within 0..=1");
        }
        Ok(())
    }

    /// Keys whose values differ between `self` and `new`.
    pub fn changed_keys(&self, new: &Settings) -> Vec<SettingsKey> {
        let mut keys = Vec::new();
        if self.rounded_corners != new.rounded_corners {
            keys.push(SettingsKey::GlobalRoundedCornerSettings);
        }
        if self.focused_shadow != new.focused_shadow {
            keys.push(SettingsKey::FocusedShadow);
        }
        if self.unfocused_shadow != new.unfocused_shadow {
            keys.push(SettingsKey::UnfocusedShadow);
        }
        if self.border_width != new.border_width {
            keys.push(SettingsKey::BorderWidth);
        }
        if self.border_color != new.border_color {
            keys.push(SettingsKey::BorderColor);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::parse("").expect("parse empty config");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let settings = Settings::parse(
            r#"
            border-width = 2.0

            [global-rounded-corner-settings]
            border_radius = 20.0
            smoothing = 0.5

            [global-rounded-corner-settings.keep_rounded_corners]
            maximized = true

            [unfocused-shadow]
            opacity = 30.0
            "#,
        )
        .expect("parse config");

        let cfg = settings.rounded_corners.expect("corner settings");
        assert_eq!(cfg.border_radius, 20.0);
        assert_eq!(cfg.padding, Padding::uniform(1.0));
        assert!(cfg.keep_rounded_corners.maximized);
        assert!(!cfg.keep_rounded_corners.fullscreen);
        assert_eq!(cfg.effective_radius(), 30.0);
        assert_eq!(settings.border_width, 2.0);
        assert_eq!(settings.unfocused_shadow.opacity, 30.0);
        assert_eq!(settings.unfocused_shadow.blur_offset, 28.0);
        assert_eq!(settings.focused_shadow, ShadowStyle::focused());
    }

    #[test]
    fn default_settings_survive_toml_round_trip() {
        let text = Settings::default().to_toml().expect("serialize");
        assert_eq!(Settings::parse(&text).expect("parse"), Settings::default());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut settings = Settings::default();
        settings.focused_shadow.opacity = 140.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: SettingsKey::FocusedShadow, .. })
        ));

        let mut settings = Settings::default();
        settings.border_color = [0.0, 2.0, 0.0, 1.0];
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: SettingsKey::BorderColor, .. })
        ));

        let mut settings = Settings::default();
        if let Some(cfg) = settings.rounded_corners.as_mut() {
            cfg.border_radius = -3.0;
        }
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite_shadow_values() {
        let mut settings = Settings::default();
        settings.unfocused_shadow.blur_offset = f64::NAN;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: SettingsKey::UnfocusedShadow, .. })
        ));

        for poison in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            for field in 0..4 {
                let mut shadow = ShadowStyle::focused();
                match field {
                    0 => shadow.spread_radius = poison,
                    1 => shadow.blur_offset = poison,
                    2 => shadow.vertical_offset = poison,
                    _ => shadow.horizontal_offset = poison,
                }
                let settings = Settings { focused_shadow: shadow, ..Settings::default() };
                assert!(
                    matches!(
                        settings.validate(),
                        Err(ConfigError::Invalid { key: SettingsKey::FocusedShadow, .. })
                    ),
                    "field {field} = {poison} was accepted"
                );
            }
        }

        let mut settings = Settings::default();
        settings.focused_shadow.spread_radius = -6.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn read_errors_name_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.toml");
        let err = Settings::read(&missing).expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
        let message = err.to_string();
        assert!(message.starts_with("failed to read "), "{message}");
        assert!(message.contains("missing.toml"), "{message}");

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "border-width = [").expect("write config");
        let err = Settings::read(&broken).expect_err("broken file");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"), "{err}");
    }

    #[test]
    fn changed_keys_reports_each_differing_setting() {
        let old = Settings::default();
        let mut new = old.clone();
        assert!(old.changed_keys(&new).is_empty());

        new.border_width = 3.0;
        new.unfocused_shadow.opacity = 10.0;
        if let Some(cfg) = new.rounded_corners.as_mut() {
            cfg.keep_rounded_corners.maximized = true;
        }
        assert_eq!(
            old.changed_keys(&new),
            vec![
                SettingsKey::GlobalRoundedCornerSettings,
                SettingsKey::UnfocusedShadow,
                SettingsKey::BorderWidth,
            ]
        );
    }

    #[test]
    fn settings_keys_use_schema_names() {
        assert_eq!(
            SettingsKey::GlobalRoundedCornerSettings.as_ref(),
            "global-rounded-corner-settings"
        );
        assert_eq!(
            SettingsKey::from_str("focused-shadow").ok(),
            Some(SettingsKey::FocusedShadow)
        );
        assert!(SettingsKey::from_str("skip-libadwaita-app").is_err());
    }
}
