//! Polling-based config file watcher.
//!
//! Checks the config file's mtime every 2 seconds. When a change is detected,
//! debounces for 500ms (editors often write in stages), reloads the file,
//! and sends the result over an mpsc channel. The processing loop applies
//! reloaded parameters to the live session on the next tick.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;

use super::AppConfig;

/// Events emitted by the config watcher.
#[derive(Debug)]
pub enum ConfigEvent {
    /// Config was successfully reloaded.
    Reloaded(Box<AppConfig>),
    /// Reload was attempted but failed (old config remains active).
    Error(String),
}

/// Interval between mtime checks.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Delay before re-checking the mtime after a change.
const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Run the config file watcher loop.
///
/// Returns when the receiving side of `tx` is dropped.
pub async fn run_config_watcher(path: PathBuf, tx: mpsc::Sender<ConfigEvent>) {
    watch_with_intervals(path, tx, POLL_INTERVAL, DEBOUNCE_DELAY).await;
}

pub(crate) async fn watch_with_intervals(
    path: PathBuf,
    tx: mpsc::Sender<ConfigEvent>,
    poll: Duration,
    debounce: Duration,
) {
    tracing::info!(path = %path.display(), "Config watcher started");

    let mut last_mtime = get_mtime(&path);

    loop {
        tokio::time::sleep(poll).await;

        if tx.is_closed() {
            tracing::debug!("Config watcher channel closed, stopping");
            return;
        }

        let Some(current) = get_mtime(&path) else {
            if last_mtime.is_some() {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not accessible, keeping current config, will retry"
                );
                last_mtime = None;
            }
            continue;
        };

        let changed = last_mtime.map_or(true, |prev| current != prev);
        if !changed {
            continue;
        }

        tokio::time::sleep(debounce).await;

        if get_mtime(&path) != Some(current) {
            // Still being written
            continue;
        }

        last_mtime = Some(current);

        let event = match AppConfig::load_from_file(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Config reloaded");
                ConfigEvent::Reloaded(Box::new(config))
            }
            Err(e) => {
                tracing::error!(error = %e, "Config hot-reload failed, keeping previous config");
                ConfigEvent::Error(e.to_string())
            }
        };

        if tx.send(event).await.is_err() {
            tracing::debug!("Config watcher channel closed, stopping");
            return;
        }
    }
}

fn get_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigKey;

    #[tokio::test]
    async fn test_watcher_reports_rewritten_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accel_metrics.toml");
        std::fs::write(&path, "[parameters]\nMass = 1.0\n").unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(watch_with_intervals(
            path.clone(),
            tx,
            Duration::from_millis(20),
            Duration::from_millis(5),
        ));

        // Coarse filesystem mtimes need a visible gap between writes
        tokio::time::sleep(Duration::from_millis(1100)).await;
        std::fs::write(&path, "[parameters]\nMass = 4.0\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            ConfigEvent::Reloaded(config) => {
                assert_eq!(config.parameters.resolve(ConfigKey::Mass), 4.0);
            }
            ConfigEvent::Error(e) => panic!("unexpected reload error: {e}"),
        }

        drop(rx);
        handle.abort();
    }
}
