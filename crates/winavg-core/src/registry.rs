use crate::{channel::AveragingChannel, config::ChannelLayout, types::ChannelIndex};

/// The averaging channels of one linked device, indexed by position in
/// the configured input topic list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelRegistry {
    channels: Vec<AveragingChannel>,
}

impl ChannelRegistry {
    /// Create one channel per input topic, in order. Every window starts
    /// out with no written slots.
    pub fn from_layout(layout: ChannelLayout) -> Self {
        let ChannelLayout {
            input_topics,
            output_topics,
            window_sizes,
        } = layout;

        let channels = input_topics
            .into_iter()
            .zip(output_topics)
            .zip(window_sizes)
            .map(|((input, output), window_size)| AveragingChannel::new(input, output, window_size))
            .collect();

        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `index` was not produced by this registry.
    pub fn get(&self, index: ChannelIndex) -> &AveragingChannel {
        let len = self.channels.len();
        self.channels
            .get(index.get())
            .unwrap_or_else(|| out_of_range(index, len))
    }

    /// # Panics
    ///
    /// Panics if `index` was not produced by this registry.
    pub fn get_mut(&mut self, index: ChannelIndex) -> &mut AveragingChannel {
        let len = self.channels.len();
        self.channels
            .get_mut(index.get())
            .unwrap_or_else(|| out_of_range(index, len))
    }

    /// Feed a sample to a channel and return its new average.
    pub fn ingest(&mut self, index: ChannelIndex, sample: f64) -> f64 {
        self.get_mut(index).ingest(sample)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelIndex, &AveragingChannel)> {
        self.channels
            .iter()
            .enumerate()
            .map(|(index, channel)| (ChannelIndex(index), channel))
    }
}

fn out_of_range(index: ChannelIndex, len: usize) -> ! {
    panic!("channel index {index} out of range for a device with {len} channels")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(inputs: &str, outputs: &str, sizes: &str) -> ChannelRegistry {
        ChannelRegistry::from_layout(ChannelLayout::parse(inputs, outputs, sizes).unwrap())
    }

    #[test]
    fn test_from_layout_order() {
        let registry = registry("temp,freq", "t2", "3,5");
        assert_eq!(registry.len(), 2);

        let temp = registry.get(ChannelIndex(0));
        assert_eq!(temp.input_topic, "temp");
        assert_eq!(temp.output_topic, "t2");
        assert_eq!(temp.window_size(), 3);
        assert!(temp.window().is_empty());

        let freq = registry.get(ChannelIndex(1));
        assert_eq!(freq.input_topic, "freq");
        assert_eq!(freq.output_topic, "freq_avg");
        assert_eq!(freq.window_size(), 5);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut registry = registry("a,b", "", "2,2");
        assert_eq!(registry.ingest(ChannelIndex(0), 4.0), 4.0);
        assert_eq!(registry.ingest(ChannelIndex(1), 100.0), 100.0);
        assert_eq!(registry.ingest(ChannelIndex(0), 6.0), 5.0);
        assert_eq!(registry.get(ChannelIndex(1)).window().len(), 1);
    }

    #[test]
    fn test_iter_yields_indices() {
        let registry = registry("a,b,c", "", "");
        let indices: Vec<_> = registry.iter().map(|(index, _)| index.get()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_index_panics() {
        let mut registry = registry("a", "", "");
        registry.ingest(ChannelIndex(1), 1.0);
    }
}
