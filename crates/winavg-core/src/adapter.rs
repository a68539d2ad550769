//! Conversion between wire payloads and averaging samples.

use eyre::{Result, WrapErr};

/// Number of digits after the decimal point in published averages.
pub const AVERAGE_PRECISION: usize = 10;

/// An average ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
}

/// Parse a text payload holding a single number. Surrounding whitespace
/// is ignored.
pub fn parse_payload(payload: &[u8]) -> Result<f64> {
    let text = std::str::from_utf8(payload).wrap_err("Payload is not valid UTF-8")?;
    text.trim()
        .parse()
        .wrap_err_with(|| format!("Failed to convert message (\"{}\") to float64", text))
}

/// Format an average as fixed-point decimal text.
pub fn format_average(average: f64) -> String {
    format!("{:.*}", AVERAGE_PRECISION, average)
}
