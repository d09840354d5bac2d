use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use arc_swap::ArcSwapOption;

/// Multi-channel sample data, stored one `Vec` per channel.
///
/// Immutable once built, so a single sample can be shared by any number of
/// players through an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    chans: usize,
    len: usize,
    data: Vec<Vec<f32>>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AudioSampleError {
    /// Every channel must hold the same number of frames.
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },
    ZeroChannels,
}

impl AudioSample {
    pub fn new(data: Vec<Vec<f32>>) -> Result<Self, AudioSampleError> {
        let len = data.first().map_or(0, Vec::len);
        if let Some((channel, found)) = data
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, found)| *found != len)
        {
            return Err(AudioSampleError::ChannelLengthMismatch {
                channel,
                expected: len,
                found,
            });
        }
        Ok(Self {
            chans: data.len(),
            len,
            data,
        })
    }

    pub fn mono(data: Vec<f32>) -> Self {
        Self {
            chans: 1,
            len: data.len(),
            data: vec![data],
        }
    }

    /// A sample with channels but no frames. Players bound to it stay silent.
    pub fn empty(chans: usize) -> Self {
        Self {
            chans,
            len: 0,
            data: vec![Vec::new(); chans],
        }
    }

    /// Split interleaved `[L, R, L, R, ..]` data into channels.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], chans: usize) -> Result<Self, AudioSampleError> {
        if chans == 0 {
            return Err(AudioSampleError::ZeroChannels);
        }
        let len = samples.len() / chans;
        let mut per_channel: Vec<Vec<f32>> = (0..chans).map(|_| Vec::with_capacity(len)).collect();
        for frame in samples.chunks_exact(chans) {
            for (chan, sample) in per_channel.iter_mut().zip(frame) {
                chan.push(*sample);
            }
        }
        Ok(Self {
            chans,
            len,
            data: per_channel,
        })
    }

    pub fn chans(&self) -> usize {
        self.chans
    }
    /// Length in frames.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn channel(&self, chan: usize) -> Option<&[f32]> {
        self.data.get(chan).map(Vec::as_slice)
    }
    #[inline(always)]
    pub fn get(&self, chan: usize, frame: usize) -> Option<f32> {
        self.data.get(chan)?.get(frame).copied()
    }
    pub fn data(&self) -> &[Vec<f32>] {
        &self.data
    }
}

/// Shared slot for a sample that can be swapped while the graph runs.
///
/// The version counter lets the audio side notice a new sample cheaply.
#[derive(Debug, Default)]
pub struct AudioSampleHandle {
    pub sample: ArcSwapOption<AudioSample>,
    pub sample_version: AtomicU64,
}

impl AudioSampleHandle {
    pub fn new(sample: Option<Arc<AudioSample>>) -> Self {
        Self {
            sample: ArcSwapOption::new(sample),
            sample_version: AtomicU64::new(0),
        }
    }
    pub fn invalidate(&self, sample: Option<Arc<AudioSample>>) {
        self.sample.store(sample);
        self.sample_version.fetch_add(1, Ordering::Release);
    }
    pub fn version(&self) -> u64 {
        self.sample_version.load(Ordering::Acquire)
    }
}

/// Control side of an [`AudioSampleHandle`].
///
/// Not realtime safe. Whoever decodes sample data hands it over here, and
/// every player bound to the handle picks it up on its next frame.
#[derive(Clone, Debug)]
pub struct AudioSampleFrontend {
    handle: Arc<AudioSampleHandle>,
}

impl AudioSampleFrontend {
    pub fn new(handle: Arc<AudioSampleHandle>) -> Self {
        Self { handle }
    }
    pub fn publish(&self, sample: Arc<AudioSample>) {
        tracing::info!(
            chans = sample.chans(),
            frames = sample.len(),
            "publishing audio sample"
        );
        self.handle.invalidate(Some(sample));
    }
    /// Remove the sample. Bound players output silence until the next publish.
    pub fn clear(&self) {
        tracing::info!("clearing audio sample");
        self.handle.invalidate(None);
    }
    pub fn handle(&self) -> Arc<AudioSampleHandle> {
        Arc::clone(&self.handle)
    }
}

/// Build an empty handle along with its frontend.
pub fn build_sample_slot() -> (Arc<AudioSampleHandle>, AudioSampleFrontend) {
    let handle = Arc::new(AudioSampleHandle::default());
    let frontend = AudioSampleFrontend::new(Arc::clone(&handle));
    (handle, frontend)
}
