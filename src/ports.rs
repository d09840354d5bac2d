use crate::{MAX_CHANNELS, node::Inputs};

#[cfg(feature = "serde")]
use serde::Serialize;

/// The contents of a port for the current frame, one sample per channel.
pub type Frame = heapless::Vec<f32, MAX_CHANNELS>;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PortMeta {
    pub name: &'static str,
    pub index: usize,
}

/// How many channels an output port carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ChannelPolicy {
    /// Decided when the node is built.
    Fixed(usize),
    /// Follows the channel count of an input port, frame by frame.
    ///
    /// An unconnected input counts as a single silent channel.
    Linked { input: usize },
}

#[derive(Clone, Debug)]
pub struct Ports {
    pub inputs: Vec<PortMeta>,
    pub outputs: Vec<PortMeta>,
    channels: Vec<ChannelPolicy>,
}

impl Ports {
    pub fn find_input(&self, name: &str) -> Option<&PortMeta> {
        self.inputs.iter().find(|x| x.name == name)
    }

    pub fn channel_policy(&self, output: usize) -> Option<ChannelPolicy> {
        self.channels.get(output).copied()
    }

    /// The channel count an output carries given this frame's inputs.
    #[inline(always)]
    pub fn output_channels(&self, output: usize, inputs: &Inputs) -> usize {
        let chans = match self.channels.get(output) {
            Some(ChannelPolicy::Fixed(n)) => *n,
            Some(ChannelPolicy::Linked { input }) => inputs
                .get(*input)
                .copied()
                .flatten()
                .map_or(1, |frame| frame.len()),
            None => 0,
        };
        chans.min(MAX_CHANNELS)
    }

    /// Resize every output frame to its current channel count.
    ///
    /// Frames are fixed capacity, so this never allocates.
    #[inline(always)]
    pub fn sync_outputs(&self, inputs: &Inputs, outputs: &mut [Frame]) {
        for (i, frame) in outputs.iter_mut().enumerate() {
            let chans = self.output_channels(i, inputs);
            // Cannot fail, chans is clamped to the frame capacity
            let _ = frame.resize(chans, 0.0);
        }
    }
}

impl From<PortBuilder> for Ports {
    fn from(builder: PortBuilder) -> Self {
        Ports {
            inputs: builder.inputs,
            outputs: builder.outputs,
            channels: builder.channels,
        }
    }
}

#[derive(Default)]
pub struct PortBuilder {
    inputs: Vec<PortMeta>,
    outputs: Vec<PortMeta>,
    channels: Vec<ChannelPolicy>,
}

impl PortBuilder {
    pub fn audio_in(mut self, count: usize) -> Self {
        let index = self.inputs.len();
        for i in 0..count {
            self.inputs.push(PortMeta {
                name: "in",
                index: index + i,
            });
        }
        self
    }

    /// New outputs start out as a single fixed channel.
    pub fn audio_out(mut self, count: usize) -> Self {
        let index = self.outputs.len();
        for i in 0..count {
            self.outputs.push(PortMeta {
                name: "out",
                index: index + i,
            });
            self.channels.push(ChannelPolicy::Fixed(1));
        }
        self
    }

    pub fn audio_in_named(mut self, names: &[&'static str]) -> Self {
        let index = self.inputs.len();
        for (i, &name) in names.iter().enumerate() {
            self.inputs.push(PortMeta {
                name,
                index: index + i,
            });
        }
        self
    }

    pub fn audio_out_named(mut self, names: &[&'static str]) -> Self {
        let index = self.outputs.len();
        for (i, &name) in names.iter().enumerate() {
            self.outputs.push(PortMeta {
                name,
                index: index + i,
            });
            self.channels.push(ChannelPolicy::Fixed(1));
        }
        self
    }

    pub fn fixed_channels(mut self, output: usize, chans: usize) -> Self {
        if let Some(policy) = self.channels.get_mut(output) {
            *policy = ChannelPolicy::Fixed(chans);
        }
        self
    }

    pub fn link_channels(mut self, output: usize, input: usize) -> Self {
        if let Some(policy) = self.channels.get_mut(output) {
            *policy = ChannelPolicy::Linked { input };
        }
        self
    }

    pub fn build(self) -> Ports {
        self.into()
    }
}
