//! Hot-reload for `burrow serve`.
//!
//! Watches the burrow.toml config file using the `notify` crate. On each
//! detected change (with 100ms debounce), it re-parses and re-validates the
//! config and rebuilds the gateway stack. On success, the inner
//! Arc<ToolDispatcher> is swapped inside the outer Arc<RwLock<...>> —
//! existing sessions pick up the new rate limits, TTLs, and base URL on
//! their next call. The credential store handle is carried over, so a reload
//! never drops configured credentials. On reload failure, the previous
//! dispatcher is preserved and a warning is logged.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecursiveMode;
use notify::Watcher;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::BurrowConfig;
use crate::credentials::CredentialStore;
use crate::error::BurrowError;
use crate::gateway::ApiGateway;
use crate::tools::{CredentialPersist, ToolDispatcher};

/// Watch `config_path` for changes and swap the dispatcher on each change.
///
/// # Arguments
/// * `config_path` - Path to the burrow.toml config file to watch
/// * `dispatcher_handle` - Shared dispatcher handle; inner Arc is swapped on reload
/// * `cancel` - CancellationToken; function returns when cancelled
pub async fn run_hot_reload(
    config_path: PathBuf,
    dispatcher_handle: Arc<RwLock<Arc<ToolDispatcher>>>,
    cancel: CancellationToken,
) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<notify::Result<notify::Event>>();

    // notify v8's EventHandler is implemented for FnMut; tokio's
    // UnboundedSender is not an EventHandler itself, so wrap it in a closure.
    let mut watcher = match notify::recommended_watcher(move |event| {
        // Ignore send errors — if the channel is closed, hot-reload is shutting down
        let _ = tx.send(event);
    }) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(error = %e, "failed to create file watcher for hot-reload");
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive) {
        tracing::error!(
            path = %config_path.display(),
            error = %e,
            "failed to watch config file for hot-reload"
        );
        return;
    }

    // Keep the watcher alive for the duration of this task — if it is
    // dropped, the OS-level watch stops and events stop arriving silently.
    let _watcher = watcher;

    tracing::info!(
        path = %config_path.display(),
        "hot-reload watching config file"
    );

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(Ok(_)) => {
                        // Debounce: wait 100ms for burst of events to settle
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        // Drain any remaining events that arrived during the sleep
                        while rx.try_recv().is_ok() {}

                        let credentials = dispatcher_handle.read().await.gateway().credentials();
                        match reload_dispatcher(&config_path, credentials).await {
                            Ok(new_dispatcher) => {
                                {
                                    let mut guard = dispatcher_handle.write().await;
                                    *guard = Arc::new(new_dispatcher);
                                }
                                tracing::info!(
                                    path = %config_path.display(),
                                    "config reloaded, gateway rebuilt"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    path = %config_path.display(),
                                    error = %e,
                                    "config reload failed — keeping previous gateway"
                                );
                            }
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "config watcher error");
                    }
                    None => {
                        tracing::info!("config watcher channel closed, stopping hot-reload");
                        return;
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("hot-reload cancelled");
                return;
            }
        }
    }
}

/// Re-read and validate the config, then build a fresh dispatcher around the
/// existing credential store.
///
/// The cache and rate limiter start empty in the new gateway — conservative
/// for the limiter (a burst around a reload is never over-admitted beyond one
/// fresh window) and merely a cold start for the cache.
async fn reload_dispatcher(
    config_path: &Path,
    credentials: Arc<CredentialStore>,
) -> crate::Result<ToolDispatcher> {
    let content = tokio::fs::read_to_string(config_path).await.map_err(|e| {
        BurrowError::InvalidConfig {
            field: "config".to_string(),
            reason: format!("{}: {e}", config_path.display()),
        }
    })?;
    let config = BurrowConfig::from_toml(&content)?;
    config.validate()?;

    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let persist = CredentialPersist {
        path: config.credentials.resolved_file(config_dir),
        passphrase: config.credentials.resolved_passphrase(),
    };
    let gateway = ApiGateway::from_config(&config, credentials)?;
    Ok(ToolDispatcher::new(Arc::new(gateway), persist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn test_reload_from_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("burrow.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
            [api]
            base_url = "http://127.0.0.1:1"

            [rate_limit]
            max_requests = 3
            "#
        )
        .unwrap();

        let credentials = Arc::new(CredentialStore::new());
        let dispatcher = reload_dispatcher(&config_path, credentials.clone())
            .await
            .unwrap();
        // The rebuilt gateway holds the same credential store
        assert!(Arc::ptr_eq(&dispatcher.gateway().credentials(), &credentials));
    }

    #[tokio::test]
    async fn test_reload_invalid_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("burrow.toml");
        std::fs::write(
            &config_path,
            r#"
            [rate_limit]
            max_requests = 0
            "#,
        )
        .unwrap();

        let result = reload_dispatcher(&config_path, Arc::new(CredentialStore::new())).await;
        assert!(matches!(result, Err(BurrowError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_reload_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("gone.toml");
        let result = reload_dispatcher(&config_path, Arc::new(CredentialStore::new())).await;
        assert!(matches!(result, Err(BurrowError::InvalidConfig { .. })));
    }
}
