use eyre::{Result, bail};
use winavg_core::{
    ChannelIndex, DeviceConfig, Transport,
    config::{CONFIG_KEY_INPUT_TOPICS, CONFIG_KEY_OUTPUT_TOPICS, CONFIG_KEY_WINDOW_SIZES},
};

/// A transport that records every call made by a device.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub subscriptions: Vec<(String, ChannelIndex)>,
    pub published: Vec<(String, String)>,
    pub refused_topics: Vec<String>,
}

impl RecordingTransport {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that fails to subscribe to the given topics.
    #[allow(dead_code)]
    pub fn refusing(topics: &[&str]) -> Self {
        Self {
            refused_topics: topics.iter().map(|topic| topic.to_string()).collect(),
            ..Self::default()
        }
    }

    #[allow(dead_code)]
    pub fn payloads(&self) -> Vec<&str> {
        self.published
            .iter()
            .map(|(_, payload)| payload.as_str())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn subscribe(&mut self, topic: &str, index: ChannelIndex) -> Result<()> {
        if self.refused_topics.iter().any(|refused| refused == topic) {
            bail!("subscription to {} refused", topic);
        }
        self.subscriptions.push((topic.to_string(), index));
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) {
        self.subscriptions.retain(|(subscribed, _)| subscribed != topic);
    }

    fn publish(&mut self, topic: &str, payload: String) {
        self.published.push((topic.to_string(), payload));
    }
}

/// Build a device config from the three raw strings. `None` leaves the
/// key out.
#[allow(dead_code)]
pub fn device_config(
    inputs: &str,
    outputs: Option<&str>,
    window_sizes: Option<&str>,
) -> DeviceConfig {
    let mut config = DeviceConfig::new();
    config.insert(CONFIG_KEY_INPUT_TOPICS.to_string(), inputs.to_string());
    if let Some(outputs) = outputs {
        config.insert(CONFIG_KEY_OUTPUT_TOPICS.to_string(), outputs.to_string());
    }
    if let Some(window_sizes) = window_sizes {
        config.insert(CONFIG_KEY_WINDOW_SIZES.to_string(), window_sizes.to_string());
    }
    config
}

/// The reference mean, summed oldest first.
#[allow(dead_code)]
pub fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}
