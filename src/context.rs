use crate::config::Config;

/// The AudioContext struct contains information about the running graph that
/// every node is handed when it generates a frame.
///
/// The scheduler owns it and calls [`AudioContext::advance_frame`] once all
/// nodes have produced the current frame.
#[derive(Clone, Debug)]
pub struct AudioContext {
    config: Config,
    frame: u64,
}

impl AudioContext {
    pub fn new(config: Config) -> Self {
        Self { config, frame: 0 }
    }
    pub fn get_config(&self) -> Config {
        self.config
    }
    /// Index of the frame currently being generated.
    pub fn frame(&self) -> u64 {
        self.frame
    }
    pub fn elapsed_secs(&self) -> f64 {
        self.frame as f64 / self.config.sample_rate as f64
    }
    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }
}
