use tracing::{debug, info};

use super::geometry::GeometryEventHandler;
use crate::actor::decorator::Decorator;
use crate::common::config::{Settings, SettingsKey};
use crate::sys::compositor::Compositor;

pub struct SettingsEventHandler;

impl SettingsEventHandler {
    /// Re-derives what `key` feeds into. Values are read from the current
    /// settings snapshot.
    pub fn handle_settings_changed<C: Compositor>(decorator: &mut Decorator<C>, key: SettingsKey) {
        debug!(%key, "setting changed");
        match key {
            SettingsKey::FocusedShadow | SettingsKey::UnfocusedShadow => {}
            SettingsKey::GlobalRoundedCornerSettings
            | SettingsKey::BorderColor
            | SettingsKey::BorderWidth => {
                for window in decorator.window_manager.window_ids() {
                    GeometryEventHandler::handle_geometry_changed(decorator, window);
                }
            }
        }
        GeometryEventHandler::update_all_shadow_styles(decorator);
    }

    /// Swaps in a new settings snapshot and refreshes whatever depends on
    /// the keys that changed.
    pub fn handle_config_updated<C: Compositor>(decorator: &mut Decorator<C>, settings: Settings) {
        let changed = decorator.settings_manager.settings.changed_keys(&settings);
        decorator.settings_manager.settings = settings;
        if changed.is_empty() {
            debug!("config reloaded without changes");
            return;
        }
        info!(?changed, "config updated");
        for key in changed {
            Self::handle_settings_changed(decorator, key);
        }
    }
}
