use crate::buffer::Window;

/// One averaging unit: the samples of an input topic and the topic its
/// averages are published on.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragingChannel {
    pub input_topic: String,
    pub output_topic: String,
    window: Window,
}

impl AveragingChannel {
    pub fn new(input_topic: String, output_topic: String, window_size: usize) -> Self {
        Self {
            input_topic,
            output_topic,
            window: Window::with_capacity(window_size),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_size(&self) -> usize {
        self.window.capacity()
    }

    /// Record a sample and return the average of the current window.
    pub fn ingest(&mut self, sample: f64) -> f64 {
        self.window.push(sample);

        // The slot just written is always valid.
        self.window.mean().unwrap_or(sample)
    }
}
