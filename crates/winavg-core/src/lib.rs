//! This library computes a sliding window average per input topic of a
//! device and hands each new average to the messaging framework for
//! publication on a matching output topic.
//!
//! Each input topic gets an averaging channel with its own fixed-size
//! circular buffer. Until a buffer fills for the first time, the average
//! is taken over the samples received so far, so output is produced from
//! the very first sample.
//!
//! # Usage
//!
//! ```rust
//! use winavg_core::{ChannelIndex, Device, DeviceConfig, DeviceId, LinkStatus, Transport};
//!
//! // A framework that simply records publications.
//! #[derive(Default)]
//! struct Recorder(Vec<(String, String)>);
//!
//! impl Transport for Recorder {
//!     fn subscribe(&mut self, _topic: &str, _index: ChannelIndex) -> eyre::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn unsubscribe(&mut self, _topic: &str) {}
//!
//!     fn publish(&mut self, topic: &str, payload: String) {
//!         self.0.push((topic.to_string(), payload));
//!     }
//! }
//!
//! let mut config = DeviceConfig::new();
//! config.insert("InputTopics".into(), "temp".into());
//! config.insert("WindowSizes".into(), "3".into());
//!
//! let mut transport = Recorder::default();
//! let mut device = Device::new(DeviceId::new("sensor-1"));
//! assert_eq!(device.on_link(&mut transport, &config), LinkStatus::Success);
//!
//! for sample in ["10", "20", "30", "40"] {
//!     device.on_message(&mut transport, ChannelIndex(0), sample.as_bytes());
//! }
//!
//! let averages: Vec<&str> = transport.0.iter().map(|(_, avg)| avg.as_str()).collect();
//! assert_eq!(
//!     averages,
//!     ["10.0000000000", "15.0000000000", "20.0000000000", "30.0000000000"]
//! );
//! assert!(transport.0.iter().all(|(topic, _)| topic == "temp_avg"));
//! ```

pub mod adapter;
pub mod buffer;
mod channel;
pub mod config;
mod device;
mod registry;
mod types;

pub use adapter::{Publication, format_average, parse_payload};
pub use buffer::Window;
pub use channel::AveragingChannel;
pub use config::{ChannelLayout, comma_list};
pub use device::{Device, DeviceState};
pub use registry::ChannelRegistry;
pub use types::*;
