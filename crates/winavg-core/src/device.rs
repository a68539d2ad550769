//! The link lifecycle of one device.

use crate::{
    adapter::{Publication, format_average, parse_payload},
    config::ChannelLayout,
    registry::ChannelRegistry,
    types::{ChannelIndex, DeviceConfig, DeviceId, LinkStatus, Transport},
};
use tracing::{debug, info, warn};

/// Whether a device currently has channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DeviceState {
    #[default]
    Unlinked,
    Linked(ChannelRegistry),
}

/// A device handled by the service.
///
/// The device moves from [Unlinked](DeviceState::Unlinked) to
/// [Linked](DeviceState::Linked) on a successful
/// [on_link](Device::on_link) and back on [on_unlink](Device::on_unlink).
/// All methods take `&mut self`, so deliveries for one device are
/// serialized by whoever owns it.
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    state: DeviceState,
}

impl Device {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            state: DeviceState::Unlinked,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.state, DeviceState::Linked(_))
    }

    /// The channels of a linked device.
    pub fn channels(&self) -> Option<&ChannelRegistry> {
        match &self.state {
            DeviceState::Linked(registry) => Some(registry),
            DeviceState::Unlinked => None,
        }
    }

    /// Set up channels from the device's service configuration and
    /// subscribe to every input topic.
    ///
    /// Either every channel is created and subscribed, or the device is
    /// left unlinked with no subscriptions.
    pub fn on_link<T>(&mut self, transport: &mut T, config: &DeviceConfig) -> LinkStatus
    where
        T: Transport + ?Sized,
    {
        debug!(device = %self.id, ?config, "Linking with config");

        if self.is_linked() {
            debug!(device = %self.id, "Relinking an already linked device");
            self.on_unlink(transport);
        }

        let layout = match ChannelLayout::from_device_config(config) {
            Ok(layout) => layout,
            Err(err) => {
                warn!(device = %self.id, error = %err, "Rejected device config");
                return LinkStatus::Failed(err.to_string());
            }
        };
        let registry = ChannelRegistry::from_layout(layout);

        let mut subscribed: Vec<&str> = Vec::with_capacity(registry.len());
        for (index, channel) in registry.iter() {
            if let Err(err) = transport.subscribe(&channel.input_topic, index) {
                warn!(
                    device = %self.id,
                    topic = %channel.input_topic,
                    error = %err,
                    "Failed to subscribe, rolling back link"
                );
                for topic in subscribed {
                    transport.unsubscribe(topic);
                }
                return LinkStatus::Failed(format!(
                    "Failed to subscribe to \"{}\": {}",
                    channel.input_topic, err
                ));
            }
            subscribed.push(&channel.input_topic);
        }

        info!(
            device = %self.id,
            num_channels = registry.len(),
            "Finished linking"
        );
        self.state = DeviceState::Linked(registry);
        LinkStatus::Success
    }

    /// Release the device's channels and drop its subscriptions.
    pub fn on_unlink<T>(&mut self, transport: &mut T)
    where
        T: Transport + ?Sized,
    {
        if let DeviceState::Linked(registry) = std::mem::take(&mut self.state) {
            for (_, channel) in registry.iter() {
                transport.unsubscribe(&channel.input_topic);
            }
        }
        debug!(device = %self.id, "Unlinked");
    }

    /// Configuration changes are not applied; the channel topology is
    /// fixed for as long as the device stays linked.
    pub fn on_config_change(
        &mut self,
        changes: &DeviceConfig,
        _original: &DeviceConfig,
    ) -> Option<LinkStatus> {
        debug!(device = %self.id, ?changes, "Ignoring config change");
        None
    }

    /// Average a delivered sample and publish the result on the channel's
    /// output topic.
    ///
    /// A payload that is not a number is logged and dropped without
    /// touching the channel.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not name a channel of this device.
    pub fn on_message<T>(
        &mut self,
        transport: &mut T,
        index: ChannelIndex,
        payload: &[u8],
    ) -> Option<Publication>
    where
        T: Transport + ?Sized,
    {
        let DeviceState::Linked(registry) = &mut self.state else {
            warn!(device = %self.id, %index, "Dropping message for an unlinked device");
            return None;
        };

        let sample = match parse_payload(payload) {
            Ok(sample) => sample,
            Err(err) => {
                warn!(device = %self.id, %index, error = %err, "Dropping unparsable message");
                return None;
            }
        };

        let channel = registry.get_mut(index);
        let average = channel.ingest(sample);
        let payload = format_average(average);

        debug!(
            device = %self.id,
            topic = %channel.input_topic,
            value = sample,
            avg = %payload,
            "Computed average"
        );

        transport.publish(&channel.output_topic, payload.clone());

        Some(Publication {
            topic: channel.output_topic.clone(),
            payload,
        })
    }
}
