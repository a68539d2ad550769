//! Configuration parsing and validation for the winavg node.

use eyre::{Result, WrapErr, bail, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, de::Error as _};
use std::{collections::HashSet, fs, path::Path, time::Duration};
use winavg_core::{DeviceConfig, config::CONFIG_PARAMETERS};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service-wide settings.
    pub service: ServiceConfig,

    /// Devices linked when the service starts.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .wrap_err_with(|| format!("Failed to load config file: {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).wrap_err("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        ensure!(!self.service.id.is_empty(), "service.id cannot be empty");

        ensure!(
            !self.service.stats_interval.is_zero(),
            "service.stats_interval must be greater than zero"
        );

        let mut seen = HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            ensure!(
                !device.id.is_empty(),
                "Device id at index {} cannot be empty",
                i
            );

            if !seen.insert(device.id.as_str()) {
                bail!("Duplicate device id: {}", device.id);
            }

            for param in CONFIG_PARAMETERS.iter().filter(|param| param.required) {
                ensure!(
                    device.config.contains_key(param.name),
                    "Device {} is missing required parameter {}",
                    device.id,
                    param.name
                );
            }
        }

        Ok(())
    }
}

/// Service-wide settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// The service id reported in logs.
    pub id: String,

    /// How often each device session logs its message counters.
    #[serde(with = "humantime_serde", default = "default_stats_interval")]
    pub stats_interval: Duration,
}

fn default_stats_interval() -> Duration {
    Duration::from_secs(10)
}

/// A device and its service parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub id: String,

    /// Service parameters keyed by name, e.g. `InputTopics`. Scalar
    /// values are taken as their text.
    #[serde(default, deserialize_with = "scalar_map")]
    pub config: DeviceConfig,
}

fn scalar_map<'de, D>(deserializer: D) -> Result<DeviceConfig, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;

    let raw: IndexMap<String, Value> = IndexMap::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(D::Error::custom(format!(
                        "parameter {key} must be a scalar"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_config() {
        let yaml = r#"
service:
  id: math-avg
  stats_interval: 30s

devices:
  - id: sensor-1
    config:
      InputTopics: "temp, freq"
      OutputTopics: t2
      WindowSizes: "3,5"
  - id: sensor-2
    config:
      InputTopics: humidity
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.service.id, "math-avg");
        assert_eq!(config.service.stats_interval, Duration::from_secs(30));
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].config["InputTopics"], "temp, freq");
        assert_eq!(config.devices[0].config["WindowSizes"], "3,5");
        assert!(!config.devices[1].config.contains_key("WindowSizes"));
    }

    #[test]
    fn test_default_stats_interval() {
        let yaml = r#"
service:
  id: math-avg
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.service.stats_interval, Duration::from_secs(10));
        assert!(config.devices.is_empty());
    }

    #[test]
    fn test_numeric_values_become_text() {
        let yaml = r#"
service:
  id: math-avg
devices:
  - id: sensor-1
    config:
      InputTopics: temp
      WindowSizes: 4
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.devices[0].config["WindowSizes"], "4");
    }

    #[test]
    fn test_reject_nested_values() {
        let yaml = r#"
service:
  id: math-avg
devices:
  - id: sensor-1
    config:
      InputTopics: [temp, freq]
"#;

        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_duplicate_devices() {
        let yaml = r#"
service:
  id: math-avg
devices:
  - id: sensor-1
    config:
      InputTopics: temp
  - id: sensor-1
    config:
      InputTopics: freq
"#;

        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_missing_input_topics() {
        let yaml = r#"
service:
  id: math-avg
devices:
  - id: sensor-1
    config:
      WindowSizes: "3"
"#;

        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("InputTopics"));
    }

    #[test]
    fn test_reject_zero_stats_interval() {
        let yaml = r#"
service:
  id: math-avg
  stats_interval: 0s
"#;

        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_empty_service_id() {
        let yaml = r#"
service:
  id: ""
"#;

        assert!(Config::from_yaml(yaml).is_err());
    }
}
