//! winavg-node - Sliding window average service.
//!
//! This crate runs the [winavg-core](../winavg_core/index.html) averaging
//! engine for a set of devices on an in-process publish/subscribe bus.
//! Every device subscribes to its configured input topics and publishes
//! the running average of each on the matching output topic.
//!
//! # Configuration
//!
//! The node requires a YAML configuration file specifying:
//! - The service id and statistics interval
//! - The devices to link, each with its `InputTopics`, and optionally
//!   `OutputTopics` and `WindowSizes`
//!
//! See the `config/example.yaml` file for a complete example.
//!
//! # Delivery
//!
//! Each linked device runs in its own task fed by an unbounded queue, so
//! messages for one device are averaged strictly in arrival order.

pub mod bus;
pub mod config;
pub mod input;
pub mod service;
pub mod session;

pub use bus::{Bus, BusMessage};
pub use config::Config;
pub use service::Service;
pub use session::{DeviceSession, SessionStats};
