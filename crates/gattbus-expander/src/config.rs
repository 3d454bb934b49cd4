use std::time::Duration;

/// Defaults applied to every expander bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderConfig {
    /// Per-command timeout handed to the gateway.
    pub timeout: Duration,
    /// Settle time the firmware waits after powering the bus.
    pub power_wait: u8,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            power_wait: 1,
        }
    }
}
