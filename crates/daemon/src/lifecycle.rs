// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde::Deserialize;
use swl_adapters::{ContextRegistry, TracedLivenessOracle};
use swl_core::SystemClock;
use swl_engine::{
    LockError, LockManager, LockService, ManagerConfig, DEFAULT_MAILBOX_CAPACITY,
    DEFAULT_SWEEP_INTERVAL,
};
use swl_storage::{StoreError, WalStore};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::server::ServerContext;

/// Lock manager with the daemon's concrete collaborators
pub type DaemonManager = LockManager<TracedLivenessOracle<ContextRegistry>, WalStore, SystemClock>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the log, pid file, settings and store
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the lock store WAL
    pub wal_path: PathBuf,
    /// Path to the optional settings file
    pub settings_path: PathBuf,
}

impl Config {
    /// Resolve paths for the given state directory, or the default one
    pub fn load(state_dir: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let state_dir = match state_dir {
            Some(dir) => dir,
            None => default_state_dir()?,
        };
        let socket_dir = match std::env::var_os("SWL_SOCKET_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => state_dir.clone(),
        };
        Ok(Self::with_dirs(&state_dir, &socket_dir))
    }

    pub fn with_dirs(state_dir: &Path, socket_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            socket_path: socket_dir.join("swld.sock"),
            lock_path: state_dir.join("swld.pid"),
            log_path: state_dir.join("swld.log"),
            wal_path: state_dir.join("locks.wal"),
            settings_path: state_dir.join("swld.toml"),
        }
    }
}

/// Tunables read from `swld.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Delay before a contended lock's holders are re-checked
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Depth of the lock service mailbox
    pub mailbox_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl Settings {
    /// Parse settings, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, LifecycleError> {
        Ok(toml::from_str(content)?)
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    /// Settings the daemon started with
    pub settings: Settings,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// Handle to the lock manager task
    pub service: LockService,
    service_task: JoinHandle<()>,
    /// Context groups with an open connection
    pub registry: ContextRegistry,
    /// Signalled when a client asks the daemon to stop
    pub shutdown_requested: Arc<Notify>,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Shared handles for connection tasks
    pub fn server_context(&self) -> ServerContext {
        ServerContext {
            service: self.service.clone(),
            registry: self.registry.clone(),
            shutdown: Arc::clone(&self.shutdown_requested),
            sweep_interval: self.settings.sweep_interval,
        }
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop the lock manager; queued requests are dropped unanswered
        if let Err(e) = self.service.shutdown().await {
            warn!("Lock service already stopped: {}", e);
        }
        if let Err(e) = self.service_task.await {
            warn!("Lock service task failed: {}", e);
        }

        // 2. Remove socket file
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 3. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Lock file is released when self.lock_file is dropped

        info!(
            "Daemon shutdown complete after {}s",
            self.start_time.elapsed().as_secs()
        );
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lock manager error: {0}")]
    Lock(#[from] LockError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            warn!("Startup failed: {}", e);
            Err(e)
        }
    }
}

/// Inner startup logic. Nothing another instance owns is touched before the
/// pid lock is held, and the socket is bound last.
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create state and socket directories
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents races. Truncate only once held.
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Settings
    let settings = Settings::load(&config.settings_path)?;

    // 4. Open the store and load the lock table before accepting clients
    let store = WalStore::open(&config.wal_path)?;
    let registry = ContextRegistry::new();
    let mut manager: DaemonManager = LockManager::new(
        TracedLivenessOracle::new(registry.clone()),
        store,
        SystemClock,
        ManagerConfig {
            sweep_interval: settings.sweep_interval,
        },
    );
    let restored = manager.bootstrap().await?;

    info!(
        "Loaded {} locks, sweep interval {:?}",
        restored, settings.sweep_interval
    );

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // 6. Hand the manager to its task
    let (service, service_task) = LockService::spawn(manager, settings.mailbox_capacity);

    info!("Daemon started in {}", config.state_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        settings,
        lock_file,
        listener,
        service,
        service_task,
        registry,
        shutdown_requested: Arc::new(Notify::new()),
        start_time: Instant::now(),
    })
}

/// Get the default state directory for swld
fn default_state_dir() -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = std::env::var_os("SWL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }

    // Use XDG_STATE_HOME or default to ~/.local/state
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("swl"));
    }

    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/swl"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
