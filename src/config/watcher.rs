//! Hot reload of a client config file.
//!
//! A failed reload is logged and dropped; the client keeps whatever config
//! it last applied.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::Client;
use crate::config::loader::load_config;
use crate::config::schema::ClientConfig;

/// Watches one TOML file and emits every config that loads and validates.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ClientConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its reload channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ClientConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Keep the returned watcher alive.
    ///
    /// Consecutive reloads that produce the same config are sent once; a
    /// single save often raises several modify events.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let ConfigWatcher { path, update_tx } = self;
        let watched = path.clone();
        let mut last_sent: Option<ClientConfig> = None;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "Client config watch failed");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }
                match load_config(&watched) {
                    Ok(config) if last_sent == Some(config) => {}
                    Ok(config) => {
                        last_sent = Some(config);
                        let _ = update_tx.send(config);
                    }
                    Err(e) => tracing::warn!(
                        path = %watched.display(),
                        error = %e,
                        "Client config reload rejected"
                    ),
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Watching client config");
        Ok(watcher)
    }

    /// Watch `path` and apply every accepted reload to `client`.
    ///
    /// Must be called inside a tokio runtime. Reloading stops when the
    /// returned handle is dropped.
    pub fn attach(path: &Path, client: Client) -> Result<ReloadHandle, notify::Error> {
        let (watcher, updates) = ConfigWatcher::new(path);
        let watcher = watcher.run()?;
        let task = tokio::spawn(async move { apply_updates(&client, updates).await });
        Ok(ReloadHandle {
            _watcher: watcher,
            task,
        })
    }
}

/// Keeps a file-driven reload running.
pub struct ReloadHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for ReloadHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Apply every reloaded config to `client` until the sender side closes.
pub async fn apply_updates(client: &Client, mut updates: mpsc::UnboundedReceiver<ClientConfig>) {
    while let Some(config) = updates.recv().await {
        client.apply_config(config);
        tracing::info!(
            max_conns = config.max_conns,
            timeout_ms = config.timeout.as_millis() as u64,
            "Client configuration reloaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updates_are_applied_in_order() {
        let client = Client::new(ClientConfig::default(), []);
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(ClientConfig::new().max_conns(10)).unwrap();
        tx.send(ClientConfig::new().max_conns(20).disable_http2(true)).unwrap();
        drop(tx);

        apply_updates(&client, rx).await;

        let config = client.config();
        assert_eq!(config.max_conns, 20);
        assert!(config.disable_http2);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
