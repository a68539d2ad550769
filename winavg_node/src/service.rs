//! The set of device sessions run by the service.

use crate::{
    bus::Bus,
    session::{Command, DeviceSession, SessionStats},
};
use indexmap::IndexMap;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};
use winavg_core::{DeviceConfig, DeviceId, LinkStatus, config::CONFIG_PARAMETERS};

struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<SessionStats>,
}

/// Owns the bus and one running session per linked device.
pub struct Service {
    id: String,
    bus: Bus,
    sessions: IndexMap<DeviceId, SessionHandle>,
    stats_interval: Duration,
}

impl Service {
    /// Start a service with a fresh bus.
    pub fn start(id: impl Into<String>, stats_interval: Duration) -> Self {
        Self::with_bus(id, Bus::new(), stats_interval)
    }

    /// Start a service on an existing bus.
    pub fn with_bus(id: impl Into<String>, bus: Bus, stats_interval: Duration) -> Self {
        let id = id.into();
        info!(service = %id, status = "Starting", "Service status");

        for param in CONFIG_PARAMETERS {
            debug!(
                service = %id,
                name = param.name,
                required = param.required,
                example = param.example,
                "{}",
                param.description
            );
        }

        info!(service = %id, status = "Started", "Service status");
        Self {
            id,
            bus,
            sessions: IndexMap::new(),
            stats_interval,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn is_linked(&self, device: &DeviceId) -> bool {
        self.sessions.contains_key(device)
    }

    pub fn linked_devices(&self) -> impl Iterator<Item = &DeviceId> {
        self.sessions.keys()
    }

    /// Link a device and start delivering its messages.
    ///
    /// A device that is already linked is unlinked first. Nothing is
    /// started if linking fails.
    pub async fn link(&mut self, device: DeviceId, config: &DeviceConfig) -> LinkStatus {
        if self.is_linked(&device) {
            self.unlink(&device).await;
        }

        let mut session = DeviceSession::new(device.clone(), self.bus.clone());
        let status = session.link(config);
        info!(service = %self.id, %device, %status, "Device link");

        if status.is_success() {
            let (commands, command_rx) = mpsc::unbounded_channel();
            let task = tokio::spawn(session.run(command_rx, self.stats_interval));
            self.sessions.insert(device, SessionHandle { commands, task });
        }

        status
    }

    /// Stop a device's session and release its channels. Returns the
    /// session's final statistics, or `None` if the device was not
    /// linked or its session failed.
    pub async fn unlink(&mut self, device: &DeviceId) -> Option<SessionStats> {
        let handle = self.sessions.shift_remove(device)?;
        stop_session(device, handle).await
    }

    /// Forward a configuration change to a device. The change is not
    /// applied.
    pub fn config_change(&self, device: &DeviceId, changes: DeviceConfig) {
        match self.sessions.get(device) {
            Some(handle) => {
                let _ = handle.commands.send(Command::ConfigChange(changes));
            }
            None => warn!(service = %self.id, %device, "Config change for unknown device"),
        }
    }

    /// Stop every session.
    pub async fn shutdown(mut self) -> IndexMap<DeviceId, SessionStats> {
        warn!(service = %self.id, status = "Shutting down", "Service status");

        let sessions = std::mem::take(&mut self.sessions);
        let stopped = futures::future::join_all(
            sessions
                .into_iter()
                .map(|(device, handle)| async move {
                    let stats = stop_session(&device, handle).await;
                    (device, stats)
                }),
        )
        .await;

        stopped
            .into_iter()
            .filter_map(|(device, stats)| Some((device, stats?)))
            .collect()
    }
}

async fn stop_session(device: &DeviceId, handle: SessionHandle) -> Option<SessionStats> {
    let SessionHandle { commands, task } = handle;
    let _ = commands.send(Command::Stop);

    match task.await {
        Ok(stats) => Some(stats),
        Err(err) => {
            error!(%device, error = %err, "Session task failed");
            None
        }
    }
}
