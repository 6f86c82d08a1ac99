use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the console engine and its façade.
///
/// Deserializable from TOML so the CLI can load a config file; every field
/// has a default so a partial file (or none at all) works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Maximum number of committed input lines kept for history browsing
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Sleep between input-loop polling iterations, in milliseconds
    #[serde(default = "default_input_poll_ms")]
    pub input_poll_ms: u64,

    /// Sleep between output-loop polling iterations, in milliseconds
    #[serde(default = "default_output_poll_ms")]
    pub output_poll_ms: u64,

    /// Flush the output queue opportunistically, without an explicit request
    #[serde(default = "default_true")]
    pub auto_flush: bool,

    /// Prefix notice lines with a HH:MM:SS timestamp
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

fn default_history_capacity() -> usize {
    50
}

fn default_input_poll_ms() -> u64 {
    10
}

fn default_output_poll_ms() -> u64 {
    40
}

fn default_true() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            input_poll_ms: default_input_poll_ms(),
            output_poll_ms: default_output_poll_ms(),
            auto_flush: true,
            timestamps: true,
        }
    }
}

impl ConsoleConfig {
    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn output_poll(&self) -> Duration {
        Duration::from_millis(self.output_poll_ms)
    }
}
