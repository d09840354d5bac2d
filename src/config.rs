use crate::MAX_CHANNELS;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The config that determines the sample rate of the graph, as well as a few
/// sizing hints for whoever schedules the nodes.
///
/// Note: nodes run one frame at a time, so there is no block size here. If
/// your device callback wants blocks, call the scheduler in a loop.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub sample_rate: usize,
    pub max_channels: usize,
    pub initial_graph_capacity: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    ZeroSampleRate,
    ZeroChannels,
    TooManyChannels { requested: usize, max: usize },
}

impl Config {
    pub fn new(sr: usize, max_channels: usize, initial_graph_capacity: usize) -> Self {
        Self {
            sample_rate: sr,
            max_channels,
            initial_graph_capacity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.max_channels == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if self.max_channels > MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels {
                requested: self.max_channels,
                max: MAX_CHANNELS,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(48_000, MAX_CHANNELS, 8)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_channel_counts() {
        let config = Config::new(44_100, 0, 4);
        assert_eq!(config.validate(), Err(ConfigError::ZeroChannels));

        let config = Config::new(44_100, MAX_CHANNELS + 1, 4);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyChannels {
                requested: MAX_CHANNELS + 1,
                max: MAX_CHANNELS
            })
        );
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = Config::new(0, 2, 4);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleRate));
    }
}
