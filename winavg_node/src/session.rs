//! One linked device and the task that feeds it.

use crate::bus::{Bus, Inbox};
use eyre::Result;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tracing::{debug, info};
use winavg_core::{ChannelIndex, Delivery, Device, DeviceConfig, DeviceId, LinkStatus, Transport};

/// [Transport] implementation connecting one device to the [Bus].
#[derive(Debug, Clone)]
pub struct BusControl {
    device: DeviceId,
    bus: Bus,
    inbox: Inbox,
}

impl Transport for BusControl {
    fn subscribe(&mut self, topic: &str, index: ChannelIndex) -> Result<()> {
        self.bus
            .subscribe(topic, &self.device, index, self.inbox.clone())
    }

    fn unsubscribe(&mut self, topic: &str) {
        self.bus.unsubscribe(topic, &self.device);
    }

    fn publish(&mut self, topic: &str, payload: String) {
        self.bus.publish_from(&self.device, topic, payload);
    }
}

/// Requests sent to a running session.
#[derive(Debug)]
pub enum Command {
    ConfigChange(DeviceConfig),
    Stop,
}

/// Message counters of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub received: u64,
    pub published: u64,
    /// Messages dropped without producing an average.
    pub rejected: u64,
}

/// A device together with its delivery queue.
///
/// Deliveries are processed one at a time, so the device's channels are
/// never updated concurrently.
#[derive(Debug)]
pub struct DeviceSession {
    device: Device,
    control: BusControl,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    config: DeviceConfig,
    stats: SessionStats,
}

impl DeviceSession {
    pub fn new(id: DeviceId, bus: Bus) -> Self {
        let (inbox, deliveries) = mpsc::unbounded_channel();
        let control = BusControl {
            device: id.clone(),
            bus,
            inbox,
        };

        Self {
            device: Device::new(id),
            control,
            deliveries,
            config: DeviceConfig::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> &DeviceId {
        self.device.id()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn link(&mut self, config: &DeviceConfig) -> LinkStatus {
        let status = self.device.on_link(&mut self.control, config);
        if status.is_success() {
            self.config = config.clone();
        }
        status
    }

    pub fn unlink(&mut self) {
        self.device.on_unlink(&mut self.control);
    }

    /// Process one delivery.
    pub fn handle(&mut self, delivery: Delivery) {
        self.stats.received += 1;

        let publication =
            self.device
                .on_message(&mut self.control, delivery.index, &delivery.payload);

        match publication {
            Some(_) => self.stats.published += 1,
            None => self.stats.rejected += 1,
        }
    }

    /// Process deliveries until told to stop, then unlink the device.
    ///
    /// Deliveries the bus accepted before the stop are still processed.
    /// Statistics are logged every `stats_interval`.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        stats_interval: Duration,
    ) -> SessionStats {
        let mut stats_timer = time::interval_at(Instant::now() + stats_interval, stats_interval);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::ConfigChange(changes)) => {
                        self.device.on_config_change(&changes, &self.config);
                    }
                    Some(Command::Stop) | None => break,
                },
                Some(delivery) = self.deliveries.recv() => self.handle(delivery),
                _ = stats_timer.tick() => self.log_stats(),
            }
        }

        self.drain();
        self.unlink();
        self.log_stats();
        debug!(device = %self.id(), "Session ended");
        self.stats
    }

    /// Leave the bus, then process whatever is still queued.
    fn drain(&mut self) {
        if let Some(registry) = self.device.channels() {
            for (_, channel) in registry.iter() {
                self.control.bus.unsubscribe(&channel.input_topic, self.device.id());
            }
        }

        let mut drained = 0;
        while let Ok(delivery) = self.deliveries.try_recv() {
            self.handle(delivery);
            drained += 1;
        }
        debug!(device = %self.id(), drained, "Drained queued deliveries");
    }

    fn log_stats(&self) {
        info!(
            device = %self.id(),
            received = self.stats.received,
            published = self.stats.published,
            rejected = self.stats.rejected,
            "Session statistics"
        );
    }
}
