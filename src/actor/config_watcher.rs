//! Reloads the config file when it changes on disk.
//!
//! The parent directory is watched rather than the file itself, since editors
//! commonly replace the file instead of writing to it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tracing::{debug, info, warn};

use crate::actor::decorator::{self, Decorator, Event};
use crate::common::config::Settings;
use crate::sys::compositor::Compositor;

const DEBOUNCE: Duration = Duration::from_millis(250);

/// Keeps the watch alive; dropping it stops watching.
pub type ConfigWatcher = Debouncer<RecommendedWatcher>;

/// Watches `path` and sends the new settings to `events_tx` whenever the file
/// changes and still validates. The watcher holds a weak sender, so it does
/// not keep the decorator's channel open.
pub fn spawn(path: PathBuf, events_tx: &decorator::Sender) -> notify::Result<ConfigWatcher> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_owned(),
        _ => PathBuf::from("."),
    };
    let watched = path.clone();
    let weak_tx = events_tx.downgrade();
    let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| match result {
        Ok(events) => {
            if !events.iter().any(|event| is_same_file(&event.path, &watched)) {
                return;
            }
            match weak_tx.upgrade() {
                Some(events_tx) => reload(&watched, &events_tx),
                None => debug!("decorator is gone, ignoring config change"),
            }
        }
        Err(err) => warn!(%err, "config watcher error"),
    })?;
    debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive)?;
    debug!(path = %path.display(), "watching config");
    Ok(debouncer)
}

/// Runs `decorator` like [`Decorator::run`], applying changes to the config
/// file at `path` as they happen. `events_tx` is only used to connect the
/// watcher; the loop ends once every other sender for `events` is dropped.
pub async fn run_with_reload<C: Compositor>(
    decorator: Decorator<C>,
    path: PathBuf,
    events_tx: decorator::Sender,
    events: decorator::Receiver,
) -> notify::Result<Decorator<C>> {
    let watcher = spawn(path, &events_tx)?;
    drop(events_tx);
    let decorator = decorator.run(events).await;
    drop(watcher);
    Ok(decorator)
}

fn is_same_file(changed: &Path, watched: &Path) -> bool {
    changed == watched
        || (changed.file_name().is_some() && changed.file_name() == watched.file_name())
}

fn reload(path: &Path, events_tx: &decorator::Sender) {
    match Settings::read(path) {
        Ok(settings) => {
            info!(path = %path.display(), "config reloaded");
            events_tx.send(Event::ConfigUpdated(settings));
        }
        Err(err) => warn!(%err, "ignoring invalid config"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor;
    use crate::sys::compositor::{ClientType, WindowId, WindowInfo};
    use crate::sys::geometry::Rect;
    use crate::sys::headless::HeadlessCompositor;

    #[test]
    fn matches_on_file_name() {
        let watched = Path::new("/home/u/.config/roundwin/config.toml");
        assert!(is_same_file(Path::new("/tmp/x/config.toml"), watched));
        assert!(!is_same_file(Path::new("/home/u/.config/roundwin/other.toml"), watched));
    }

    #[test]
    fn reload_sends_valid_settings_and_drops_invalid_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let (tx, mut rx) = actor::channel();

        std::fs::write(&path, "border-width = 3.0\n").expect("write config");
        reload(&path, &tx);
        let (_, event) = rx.try_recv().expect("config event");
        let Event::ConfigUpdated(settings) = &event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(settings.border_width, 3.0);

        std::fs::write(&path, "border-width = -1.0\n").expect("write config");
        reload(&path, &tx);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn spawn_watches_the_config_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").expect("write config");
        let (tx, mut rx) = actor::channel();

        let _watcher = spawn(path.clone(), &tx).expect("watch config dir");
        std::fs::write(&path, "border-width = 2.0\n").expect("write config");

        let received = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        let Ok(Some((_, Event::ConfigUpdated(settings)))) = &received else {
            panic!("no config update received: {received:?}");
        };
        assert_eq!(settings.border_width, 2.0);
    }

    #[tokio::test]
    async fn watcher_does_not_keep_the_channel_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let (tx, mut rx) = actor::channel();

        let _watcher = spawn(path, &tx).expect("watch config dir");
        drop(tx);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_with_reload_applies_config_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").expect("write config");

        let mut compositor = HeadlessCompositor::new(vec![1.0]);
        compositor.add_window(WindowId::new(1), WindowInfo {
            wm_class_instance: Some("mpv".to_string()),
            client_type: ClientType::Wayland,
            frame_rect: Rect::new(0.0, 0.0, 640.0, 480.0),
            buffer_rect: Rect::new(0.0, 0.0, 640.0, 480.0),
            ..WindowInfo::default()
        });
        let decorator = Decorator::new(compositor, Settings::default());
        let (tx, rx) = actor::channel();
        let feed_tx = tx.clone();

        let feed = async {
            // Let the watch start before touching the file.
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&path, "border-width = 4.0\n").expect("write config");
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(feed_tx);
        };
        let (decorator, ()) = tokio::join!(run_with_reload(decorator, path.clone(), tx, rx), feed);

        let decorator = decorator.expect("watch config dir");
        assert_eq!(decorator.settings().border_width, 4.0);
        assert_eq!(decorator.tracked_count(), 0, "run undecorates on exit");
    }
}
