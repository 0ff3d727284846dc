use std::time::Duration;
use crate::ping::Options;

/// Settings shared by every target.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub size:    u32,
    pub expiry:  Duration,
    pub rate:    Duration,
    pub options: Options,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size:    32,
            expiry:  Duration::from_millis(4000),
            rate:    Duration::from_millis(1000),
            options: Options::default(),
        }
    }
}
