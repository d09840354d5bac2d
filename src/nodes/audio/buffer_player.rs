use std::{fmt::Debug, sync::Arc};

use assert_no_alloc::permit_alloc;

use crate::{
    MAX_CHANNELS,
    context::AudioContext,
    msg::NodeMessage,
    node::{Inputs, Node, Outputs},
    params::{Param, ParamKey, Params},
    ports::{PortBuilder, Ports},
    sample::{AudioSample, AudioSampleHandle},
};

pub const PLAYBACK_RATE: ParamKey = ParamKey::new(0);
pub const RESTART_TRIGGER: ParamKey = ParamKey::new(1);
pub const START_POSITION: ParamKey = ParamKey::new(2);
pub const LOOP: ParamKey = ParamKey::new(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Stopped,
}

/// The read head of a player. All mutation happens in [`BufferPlayer::generate`].
#[derive(Clone, Debug, PartialEq)]
struct Playhead {
    // f64 keeps sub-frame steps exact far into long samples
    position: f64,
    state: PlaybackState,
    trigger_armed: bool,
}

impl Playhead {
    fn new(start: f32) -> Self {
        Self {
            position: start as f64,
            state: PlaybackState::Playing,
            trigger_armed: false,
        }
    }

    fn restart(&mut self, start: f32) {
        self.position = start as f64;
        self.state = PlaybackState::Playing;
    }

    /// Restarts on a rising edge only, holding the trigger high does nothing.
    #[inline(always)]
    fn on_trigger(&mut self, trigger: f32, start: f32) {
        if trigger > 0.0 && !self.trigger_armed {
            self.restart(start);
            self.trigger_armed = true;
        } else if trigger <= 0.0 && self.trigger_armed {
            self.trigger_armed = false;
        }
    }

    /// Index of the frame under the head, if it lies inside the buffer.
    #[inline(always)]
    fn frame_index(&self, len: usize) -> Option<usize> {
        if self.position >= 0.0 {
            let index = self.position as usize;
            (index < len).then_some(index)
        } else {
            None
        }
    }

    /// Moves the head and returns true if playback stopped on this move.
    #[inline(always)]
    fn advance(&mut self, rate: f32, len: usize, looping: bool) -> bool {
        self.position += rate as f64;

        let len = len as f64;
        if self.position >= 0.0 && self.position < len {
            return false;
        }

        if looping {
            let wrapped = self.position.rem_euclid(len);
            // rem_euclid can round up to len for tiny negative positions
            self.position = if wrapped.is_finite() && wrapped < len {
                wrapped
            } else {
                0.0
            };
            false
        } else {
            self.state = PlaybackState::Stopped;
            true
        }
    }
}

/// Plays a sample back one frame at a time, with nearest neighbour reads.
///
/// Inputs, each linked to the parameter of the same name:
///
/// - `rate`: frames advanced per output frame. `1.0` is the original speed,
///   negative values play backwards.
/// - `trigger`: a rising edge from `<= 0` to `> 0` restarts playback from
///   the start position.
/// - `start`: the frame playback restarts from.
/// - `loop`: any non-zero value wraps playback around instead of stopping.
///
/// There is a single output port, carrying one channel per sample channel.
///
/// When playback runs off the end (or the front, when playing backwards)
/// without looping, the player stops, outputs silence and calls the
/// completion callback once. A trigger edge starts it again.
pub struct BufferPlayer {
    sample: Arc<AudioSampleHandle>,
    sample_version: u64,
    params: Params,
    playhead: Playhead,
    on_complete: Option<Box<dyn FnMut() + Send>>,
    ports: Ports,
}

impl BufferPlayer {
    pub fn new(sample: Arc<AudioSample>, playback_rate: f32, start_position: f32, looping: bool) -> Self {
        let chans = sample.chans();
        let handle = Arc::new(AudioSampleHandle::new(Some(sample)));
        Self::from_handle(handle, chans, playback_rate, start_position, looping)
    }

    /// Bind to a handle whose sample may be published later.
    ///
    /// `chans` fixes the output channel count. Channels the current sample
    /// does not have are silent.
    pub fn from_handle(
        handle: Arc<AudioSampleHandle>,
        chans: usize,
        playback_rate: f32,
        start_position: f32,
        looping: bool,
    ) -> Self {
        if chans > MAX_CHANNELS {
            tracing::warn!(chans, max = MAX_CHANNELS, "buffer player truncating channels");
        }
        let chans = chans.min(MAX_CHANNELS);
        tracing::debug!(chans, playback_rate, start_position, looping, "new buffer player");

        Self {
            sample_version: handle.version(),
            sample: handle,
            params: Params::new(vec![
                Param::linked("playback_rate", 0, playback_rate),
                Param::linked("restart_trigger", 1, 0.0),
                Param::linked("start_position", 2, start_position),
                Param::linked("loop", 3, if looping { 1.0 } else { 0.0 }),
            ]),
            playhead: Playhead::new(start_position),
            on_complete: None,
            ports: PortBuilder::default()
                .audio_in_named(&["rate", "trigger", "start", "loop"])
                .audio_out(1)
                .fixed_channels(0, chans)
                .build(),
        }
    }

    /// Called once every time playback stops at either end of the sample.
    pub fn with_on_complete(mut self, on_complete: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    pub fn position(&self) -> f64 {
        self.playhead.position
    }

    pub fn state(&self) -> PlaybackState {
        self.playhead.state
    }

    pub fn is_playing(&self) -> bool {
        self.playhead.state == PlaybackState::Playing
    }

    pub fn is_trigger_armed(&self) -> bool {
        self.playhead.trigger_armed
    }

    /// Jump back to the stored start position and play.
    ///
    /// Leaves the trigger edge detection alone.
    pub fn restart(&mut self) {
        let start = self.params.get(START_POSITION).unwrap_or(0.0);
        self.playhead.restart(start);
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl Node for BufferPlayer {
    fn generate(&mut self, _: &mut AudioContext, inputs: &Inputs, outputs: &mut Outputs) {
        self.ports.sync_outputs(inputs, outputs);
        let Some(out) = outputs.first_mut() else {
            return;
        };

        // Read before the sample: a publish stores the sample first, so a
        // version seen here is never newer than the sample loaded below.
        let version = self.sample.version();

        // The guard is usually lock free, but arc-swap may allocate a debt slot
        // the first time a thread loads.
        let guard = permit_alloc(|| self.sample.sample.load());
        let sample = match guard.as_deref() {
            Some(inner) if !inner.is_empty() => inner,
            _ => {
                out.fill(0.0);
                return;
            }
        };

        if version != self.sample_version {
            // A freshly published sample plays from the start position
            self.sample_version = version;
            self.playhead.restart(self.params.resolve(START_POSITION, inputs));
        }

        let start = self.params.resolve(START_POSITION, inputs);
        let trigger = self.params.resolve(RESTART_TRIGGER, inputs);
        self.playhead.on_trigger(trigger, start);

        if self.playhead.state == PlaybackState::Stopped {
            out.fill(0.0);
            return;
        }

        let rate = self.params.resolve(PLAYBACK_RATE, inputs);
        let looping = self.params.resolve(LOOP, inputs).abs() > 0.0;

        let len = sample.len();
        match self.playhead.frame_index(len) {
            Some(index) => {
                for (chan, o) in out.iter_mut().enumerate() {
                    *o = sample.get(chan, index).unwrap_or(0.0);
                }
            }
            None => out.fill(0.0),
        }

        if self.playhead.advance(rate, len, looping) {
            if let Some(on_complete) = self.on_complete.as_mut() {
                on_complete();
            }
        }
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn handle_msg(&mut self, msg: NodeMessage) {
        if let Err(err) = self.params.apply_msg(&msg) {
            tracing::warn!(?err, ?msg, "buffer player ignored message");
        }
    }
}

impl Debug for BufferPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPlayer")
            .field("playhead", &self.playhead)
            .field("params", &self.params)
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}
