use eyre::Result;
use indexmap::IndexMap;
use std::fmt;

/// The position of a channel within a linked device.
///
/// Indices are handed to the transport at subscription time and echoed
/// back on every delivery for that topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelIndex(pub usize);

impl ChannelIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for ChannelIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ChannelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a linked device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The service configuration of one device, keyed by parameter name.
pub type DeviceConfig = IndexMap<String, String>;

/// An inbound message addressed to one channel of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub index: ChannelIndex,
    pub payload: Vec<u8>,
}

impl Delivery {
    pub fn new(index: ChannelIndex, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            index,
            payload: payload.into(),
        }
    }
}

/// The messaging framework as seen from one device.
pub trait Transport {
    /// Subscribe to a topic. Every message later delivered for the
    /// topic carries `index`.
    fn subscribe(&mut self, topic: &str, index: ChannelIndex) -> Result<()>;

    /// Drop a subscription made by [subscribe](Transport::subscribe).
    fn unsubscribe(&mut self, topic: &str);

    /// Fire-and-forget publication. Delivery failures are not reported.
    fn publish(&mut self, topic: &str, payload: String);
}

/// Outcome of linking a device, reported back to the framework as the
/// device's service status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Success,
    Failed(String),
}

impl LinkStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failed(reason) => f.write_str(reason),
        }
    }
}
