/// Errors that can occur while encoding requests or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A response was shorter than its decoder requires.
    #[error("short response for {command} ({actual} bytes, expected {expected})")]
    ShortResponse {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A relay number outside `1..=relay_count`.
    #[error("relay {index} out of range (module has {relay_count} relays)")]
    RelayOutOfRange { index: i64, relay_count: usize },

    /// A pulse duration outside 0-255.
    #[error("pulse {0} out of range (expected 0-255 in 100ms units)")]
    PulseOutOfRange(i64),
}

pub type Result<T> = std::result::Result<T, FrameError>;
