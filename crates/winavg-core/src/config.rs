use crate::types::DeviceConfig;
use eyre::{Result, bail, eyre};

pub const CONFIG_KEY_INPUT_TOPICS: &str = "InputTopics";
pub const CONFIG_KEY_OUTPUT_TOPICS: &str = "OutputTopics";
pub const CONFIG_KEY_WINDOW_SIZES: &str = "WindowSizes";

/// Window size used when none is given for a channel, or the given one
/// is not positive.
pub const DEFAULT_WINDOW_SIZE: usize = 2;

/// Largest accepted window size. Larger values fail the link instead of
/// allocating the window.
pub const MAX_WINDOW_SIZE: usize = 65_536;

/// Appended to an input topic to name its output topic when none is
/// given.
pub const DEFAULT_OUTPUT_TOPIC_SUFFIX: &str = "_avg";

/// A configuration parameter the service advertises to the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigParameter {
    pub name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub required: bool,
}

pub const CONFIG_PARAMETERS: &[ConfigParameter] = &[
    ConfigParameter {
        name: CONFIG_KEY_INPUT_TOPICS,
        description: "Comma separated list of input topics",
        example: "frequency, temp",
        required: true,
    },
    ConfigParameter {
        name: CONFIG_KEY_OUTPUT_TOPICS,
        description: "Comma separated list of corresponding output topics",
        example: "frequency_avg, temp_avg",
        required: false,
    },
    ConfigParameter {
        name: CONFIG_KEY_WINDOW_SIZES,
        description: "Comma separated list of corresponding window sizes",
        example: "2, 4",
        required: false,
    },
];

/// Split a comma separated list, ignoring all spaces.
///
/// An empty string yields an empty list rather than a list holding one
/// empty element.
pub fn comma_list(list: &str) -> Vec<String> {
    let stripped: String = list.chars().filter(|&c| c != ' ').collect();
    if stripped.is_empty() {
        return vec![];
    }
    stripped.split(',').map(str::to_string).collect()
}

/// The channel topology of one device as parallel lists, one entry per
/// input topic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelLayout {
    pub input_topics: Vec<String>,
    pub output_topics: Vec<String>,
    pub window_sizes: Vec<usize>,
}

impl ChannelLayout {
    /// Build the layout from the three raw configuration strings.
    ///
    /// Output topics and window sizes are matched to input topics by
    /// position and may be shorter than the input list. The whole layout
    /// is rejected if any window size fails to parse.
    pub fn parse(input_topics: &str, output_topics: &str, window_sizes: &str) -> Result<Self> {
        let inputs = comma_list(input_topics);
        let outputs = comma_list(output_topics);
        let sizes = comma_list(window_sizes);

        let mut layout = Self {
            input_topics: Vec::with_capacity(inputs.len()),
            output_topics: Vec::with_capacity(inputs.len()),
            window_sizes: Vec::with_capacity(inputs.len()),
        };

        for (i, input) in inputs.into_iter().enumerate() {
            if input.is_empty() {
                bail!("Input topic at position {} is empty", i);
            }

            let output = match outputs.get(i) {
                Some(output) if !output.is_empty() => output.clone(),
                _ => format!("{input}{DEFAULT_OUTPUT_TOPIC_SUFFIX}"),
            };

            let window_size = match sizes.get(i) {
                Some(raw) => parse_window_size(raw)?,
                None => DEFAULT_WINDOW_SIZE,
            };

            layout.input_topics.push(input);
            layout.output_topics.push(output);
            layout.window_sizes.push(window_size);
        }

        Ok(layout)
    }

    /// Build the layout from a device's service configuration. Absent
    /// keys are treated as empty lists.
    pub fn from_device_config(config: &DeviceConfig) -> Result<Self> {
        let get = |key: &str| config.get(key).map(String::as_str).unwrap_or("");
        Self::parse(
            get(CONFIG_KEY_INPUT_TOPICS),
            get(CONFIG_KEY_OUTPUT_TOPICS),
            get(CONFIG_KEY_WINDOW_SIZES),
        )
    }

    pub fn len(&self) -> usize {
        self.input_topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_topics.is_empty()
    }
}

fn parse_window_size(raw: &str) -> Result<usize> {
    let value: i32 = raw
        .parse()
        .map_err(|_| eyre!("Failed to parse WindowSize \"{}\"", raw))?;

    if value <= 0 {
        return Ok(DEFAULT_WINDOW_SIZE);
    }

    let size = value as usize;
    if size > MAX_WINDOW_SIZE {
        bail!(
            "Failed to parse WindowSize \"{}\": exceeds the maximum of {}",
            raw,
            MAX_WINDOW_SIZE
        );
    }
    Ok(size)
}
