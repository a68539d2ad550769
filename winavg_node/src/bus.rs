//! In-process publish/subscribe broker.
//!
//! The bus stands in for the messaging framework: devices subscribe
//! their input topics with a channel index, and every payload published
//! on a topic is delivered to each subscriber's inbox tagged with that
//! index.

use eyre::{Result, ensure};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use winavg_core::{ChannelIndex, Delivery, DeviceId};

/// The receiving end of a device's deliveries.
pub type Inbox = mpsc::UnboundedSender<Delivery>;

/// A payload seen on the bus, as reported to taps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    /// The device that published the message, if any.
    pub origin: Option<DeviceId>,
}

#[derive(Debug)]
struct Subscriber {
    device: DeviceId,
    index: ChannelIndex,
    inbox: Inbox,
}

#[derive(Debug, Default)]
struct Topics {
    subscribers: IndexMap<String, Vec<Subscriber>>,
    taps: Vec<mpsc::UnboundedSender<BusMessage>>,
}

/// A cheaply clonable handle to a shared broker.
#[derive(Debug, Clone, Default)]
pub struct Bus {
    topics: Arc<Mutex<Topics>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Topics> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `inbox` to receive payloads published on `topic`, tagged
    /// with `index`.
    pub fn subscribe(
        &self,
        topic: &str,
        device: &DeviceId,
        index: ChannelIndex,
        inbox: Inbox,
    ) -> Result<()> {
        ensure!(!topic.is_empty(), "Cannot subscribe to an empty topic");
        ensure!(!inbox.is_closed(), "Inbox of device {} is closed", device);

        debug!(%topic, %device, %index, "Subscribe");
        self.lock()
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber {
                device: device.clone(),
                index,
                inbox,
            });
        Ok(())
    }

    /// Remove every subscription `device` holds on `topic`.
    pub fn unsubscribe(&self, topic: &str, device: &DeviceId) {
        let mut topics = self.lock();
        let Some(subscribers) = topics.subscribers.get_mut(topic) else {
            return;
        };

        subscribers.retain(|subscriber| &subscriber.device != device);
        if subscribers.is_empty() {
            topics.subscribers.shift_remove(topic);
        }
        debug!(%topic, %device, "Unsubscribe");
    }

    /// Publish a payload from outside any device.
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> usize {
        self.dispatch(topic, payload.into(), None)
    }

    /// Publish a payload on behalf of `device`.
    pub fn publish_from(
        &self,
        device: &DeviceId,
        topic: &str,
        payload: impl Into<Vec<u8>>,
    ) -> usize {
        self.dispatch(topic, payload.into(), Some(device.clone()))
    }

    /// Deliver to every subscriber of the topic and report to taps.
    /// Returns the number of inboxes the payload reached.
    fn dispatch(&self, topic: &str, payload: Vec<u8>, origin: Option<DeviceId>) -> usize {
        let mut topics = self.lock();

        let mut delivered = 0;
        if let Some(subscribers) = topics.subscribers.get_mut(topic) {
            subscribers.retain(|subscriber| {
                let delivery = Delivery::new(subscriber.index, payload.clone());
                let ok = subscriber.inbox.send(delivery).is_ok();
                if ok {
                    delivered += 1;
                } else {
                    debug!(%topic, device = %subscriber.device, "Pruning closed inbox");
                }
                ok
            });
        }
        trace!(%topic, delivered, "Dispatched");

        let message = BusMessage {
            topic: topic.to_string(),
            payload,
            origin,
        };
        topics.taps.retain(|tap| tap.send(message.clone()).is_ok());

        delivered
    }

    /// Observe every message published on the bus from now on.
    pub fn tap(&self) -> mpsc::UnboundedReceiver<BusMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().taps.push(tx);
        rx
    }

    /// The number of subscriptions held on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock()
            .subscribers
            .get(topic)
            .map_or(0, |subscribers| subscribers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_tags_with_index() {
        let bus = Bus::new();
        let device = DeviceId::new("dev");
        let (tx, mut rx) = mpsc::unbounded_channel();

        bus.subscribe("temp", &device, ChannelIndex(0), tx.clone()).unwrap();
        bus.subscribe("freq", &device, ChannelIndex(1), tx).unwrap();

        assert_eq!(bus.publish("freq", "12.5"), 1);
        assert_eq!(rx.try_recv().unwrap(), Delivery::new(ChannelIndex(1), "12.5"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = Bus::new();
        assert_eq!(bus.publish("nobody", "1"), 0);
    }

    #[test]
    fn test_fan_out_to_devices() {
        let bus = Bus::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        bus.subscribe("temp", &DeviceId::new("a"), ChannelIndex(2), tx_a).unwrap();
        bus.subscribe("temp", &DeviceId::new("b"), ChannelIndex(0), tx_b).unwrap();

        assert_eq!(bus.publish("temp", "3"), 2);
        assert_eq!(rx_a.try_recv().unwrap().index, ChannelIndex(2));
        assert_eq!(rx_b.try_recv().unwrap().index, ChannelIndex(0));
    }

    #[test]
    fn test_unsubscribe_only_affects_device() {
        let bus = Bus::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let a = DeviceId::new("a");

        bus.subscribe("temp", &a, ChannelIndex(0), tx_a).unwrap();
        bus.subscribe("temp", &DeviceId::new("b"), ChannelIndex(0), tx_b).unwrap();
        bus.unsubscribe("temp", &a);

        assert_eq!(bus.subscriber_count("temp"), 1);
    }

    #[test]
    fn test_closed_inbox_pruned() {
        let bus = Bus::new();
        let (tx, rx) = mpsc::unbounded_channel();
        bus.subscribe("temp", &DeviceId::new("a"), ChannelIndex(0), tx).unwrap();

        drop(rx);
        assert_eq!(bus.publish("temp", "1"), 0);
        assert_eq!(bus.subscriber_count("temp"), 0);
    }

    #[test]
    fn test_reject_empty_topic() {
        let bus = Bus::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(bus.subscribe("", &DeviceId::new("a"), ChannelIndex(0), tx).is_err());
    }

    #[test]
    fn test_tap_sees_origin() {
        let bus = Bus::new();
        let mut tap = bus.tap();
        let device = DeviceId::new("dev");

        bus.publish("temp", "1");
        bus.publish_from(&device, "temp_avg", "1.0000000000");

        let first = tap.try_recv().unwrap();
        assert_eq!(first.topic, "temp");
        assert_eq!(first.origin, None);

        let second = tap.try_recv().unwrap();
        assert_eq!(second.topic, "temp_avg");
        assert_eq!(second.payload, b"1.0000000000".to_vec());
        assert_eq!(second.origin, Some(device));
    }
}
