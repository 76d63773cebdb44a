//! Real-time side of the transport clock.
//!
//! ```text
//! ┌──────────────────┐   Voice (start)   ┌─────────────────────┐
//! │  Control thread  │──push()──────────►│   Start Queue       │
//! │  (AudioContext)  │                   │  (rtrb SPSC)        │
//! └──────────────────┘                   └──────────┬──────────┘
//!     ▲    │                                        │ pop() at block start
//!     │    │ GainParam / StopSignal (atomics)       ▼
//!     │    └───────────────────────────►┌─────────────────────┐
//!     │                                 │  GraphRenderer      │
//!     │   frame counter (atomic u64) ◄──│  (audio thread)     │
//!     │                                 └──────────┬──────────┘
//!     └── finished voices (rtrb SPSC) ◄────────────┘
//! ```
//!
//! Everything is scheduled by absolute frame number on the clock timeline,
//! not by when the command arrives. A source started "at frame F" sounds its
//! sample `offset` exactly at frame F, whichever block F falls in.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

/// Capacity of the control -> audio start queue
pub const COMMAND_QUEUE_SIZE: usize = 256;

/// Voices the renderer can hold at once
const VOICE_CAPACITY: usize = 32;

/// Every voice the renderer can give back between two collections: the slots
/// plus whatever the start queue can deliver.
const RETIRED_QUEUE_SIZE: usize = VOICE_CAPACITY + COMMAND_QUEUE_SIZE;

/// Identifier of a scheduled source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) u64);

/// Gain shared between the control side and the audio thread.
///
/// Writes become audible at the start of the next rendered block.
#[derive(Debug, Clone)]
pub struct GainParam(Arc<AtomicU32>);

impl GainParam {
    pub fn new(gain: f32) -> Self {
        Self(Arc::new(AtomicU32::new(gain.to_bits())))
    }

    pub fn set(&self, gain: f32) {
        self.0.store(gain.to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }
}

/// Frame a source stops at, shared with the audio thread.
#[derive(Debug, Clone)]
pub(crate) struct StopSignal(Arc<AtomicU64>);

impl StopSignal {
    const NEVER: u64 = u64::MAX;

    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(Self::NEVER)))
    }

    pub fn stop_at(&self, frame: u64) {
        self.0.fetch_min(frame, Ordering::AcqRel);
    }

    pub fn get(&self) -> Option<u64> {
        match self.0.load(Ordering::Acquire) {
            Self::NEVER => None,
            frame => Some(frame),
        }
    }
}

pub(crate) struct Voice {
    pub samples: Arc<[f32]>,
    pub start_frame: u64,
    pub offset: usize,
    pub stop: StopSignal,
    pub gain: GainParam,
}

impl Voice {
    fn mix_into(&self, out: &mut [f32], channels: usize, base_frame: u64) {
        let gain = self.gain.get();
        let stop = self.stop.get();
        for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
            let now = base_frame + i as u64;
            if now < self.start_frame {
                continue;
            }
            if stop.is_some_and(|stop| now >= stop) {
                break;
            }
            let pos = self.offset + (now - self.start_frame) as usize;
            let Some(&sample) = self.samples.get(pos) else {
                break;
            };
            for ch in frame.iter_mut() {
                *ch += sample * gain;
            }
        }
    }

    fn finished_by(&self, frame: u64) -> bool {
        if self.stop.get().is_some_and(|stop| frame >= stop) {
            return true;
        }
        frame > self.start_frame
            && self.offset + (frame - self.start_frame) as usize >= self.samples.len()
    }
}

/// State the control side reads without touching the audio thread
#[derive(Clone)]
pub(crate) struct SharedTransport {
    pub frames: Arc<AtomicU64>,
    pub running: Arc<AtomicBool>,
}

/// Control-side ends of a renderer's queues.
pub(crate) struct GraphControl {
    pub starts: Producer<Voice>,
    /// Voices the audio thread is done with. Their buffers are freed here.
    pub retired: Consumer<Voice>,
    pub transport: SharedTransport,
}

impl GraphControl {
    /// Drop every voice the audio thread handed back.
    pub fn collect_retired(&mut self) -> usize {
        let mut count = 0;
        while self.retired.pop().is_ok() {
            count += 1;
        }
        count
    }
}

/// Owned by the audio thread; mixes every scheduled voice into the output.
///
/// Never allocates or frees: voices live in fixed slots and go back to the
/// control side once they finish.
pub struct GraphRenderer {
    starts: Consumer<Voice>,
    retired: Producer<Voice>,
    slots: Box<[Option<Voice>]>,
    transport: SharedTransport,
}

impl GraphRenderer {
    pub(crate) fn new() -> (Self, GraphControl) {
        let (start_tx, start_rx) = RingBuffer::new(COMMAND_QUEUE_SIZE);
        let (retired_tx, retired_rx) = RingBuffer::new(RETIRED_QUEUE_SIZE);
        let transport = SharedTransport {
            frames: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
        };
        let renderer = Self {
            starts: start_rx,
            retired: retired_tx,
            slots: (0..VOICE_CAPACITY).map(|_| None).collect(),
            transport: transport.clone(),
        };
        let control = GraphControl {
            starts: start_tx,
            retired: retired_rx,
            transport,
        };
        (renderer, control)
    }

    /// Render one interleaved block. While suspended the output is silent and
    /// the clock does not advance, but queued starts and stops still apply.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        out.fill(0.0);
        self.drain_starts();

        let base = self.transport.frames.load(Ordering::Relaxed);
        if !self.transport.running.load(Ordering::Acquire) {
            self.release_finished(base);
            return;
        }

        let channels = channels.max(1);
        let frames = (out.len() / channels) as u64;

        for voice in self.slots.iter().flatten() {
            voice.mix_into(out, channels, base);
        }

        let end = base + frames;
        self.release_finished(end);
        self.transport.frames.store(end, Ordering::Release);
    }

    /// Number of voices still scheduled or sounding
    pub fn active_voices(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn drain_starts(&mut self) {
        while let Ok(voice) = self.starts.pop() {
            let idx = self.allocate_slot();
            if let Some(stolen) = self.slots[idx].replace(voice) {
                self.retire(stolen);
            }
        }
    }

    /// A free slot, else the oldest stopped voice, else the oldest voice.
    fn allocate_slot(&self) -> usize {
        if let Some(idx) = self.slots.iter().position(Option::is_none) {
            return idx;
        }

        let oldest = |stopped_only: bool| {
            self.slots
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| slot.as_ref().map(|v| (idx, v)))
                .filter(|(_, v)| !stopped_only || v.stop.get().is_some())
                .min_by_key(|(_, v)| v.start_frame)
                .map(|(idx, _)| idx)
        };
        oldest(true).or_else(|| oldest(false)).unwrap_or(0)
    }

    fn release_finished(&mut self, frame: u64) {
        for idx in 0..self.slots.len() {
            if self.slots[idx].as_ref().is_some_and(|v| v.finished_by(frame)) {
                if let Some(voice) = self.slots[idx].take() {
                    self.retire(voice);
                }
            }
        }
    }

    fn retire(&mut self, voice: Voice) {
        // Only full if the control side stopped collecting; the voice is then
        // dropped here.
        let _ = self.retired.push(voice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(samples: Vec<f32>, start_frame: u64, offset: usize) -> Voice {
        Voice {
            samples: samples.into(),
            start_frame,
            offset,
            stop: StopSignal::new(),
            gain: GainParam::new(1.0),
        }
    }

    fn running() -> (GraphRenderer, GraphControl) {
        let (renderer, control) = GraphRenderer::new();
        control.transport.running.store(true, Ordering::Release);
        (renderer, control)
    }

    /// Queue a voice, returning its stop signal
    fn start(control: &mut GraphControl, voice: Voice) -> StopSignal {
        let stop = voice.stop.clone();
        assert!(control.starts.push(voice).is_ok(), "start queue full");
        stop
    }

    #[test]
    fn suspended_renderer_is_silent_and_frozen() {
        let (mut renderer, mut control) = GraphRenderer::new();
        start(&mut control, voice(vec![1.0; 8], 0, 0));

        let mut out = vec![1.0; 8];
        renderer.render(&mut out, 1);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(control.transport.frames.load(Ordering::Acquire), 0);
        assert_eq!(renderer.active_voices(), 1);
    }

    #[test]
    fn suspended_renderer_keeps_taking_restarts() {
        let (mut renderer, mut control) = GraphRenderer::new();
        let mut out = vec![0.0; 4];

        // Many more restarts than the queue or the pool hold
        let mut previous: Option<StopSignal> = None;
        let mut released = 0;
        for _ in 0..2 * COMMAND_QUEUE_SIZE {
            if let Some(stop) = previous.take() {
                stop.stop_at(0);
            }
            released += control.collect_retired();
            previous = Some(start(&mut control, voice(vec![1.0; 8], 0, 2)));
            renderer.render(&mut out, 1);
        }
        released += control.collect_retired();
        assert_eq!(renderer.active_voices(), 1);
        assert_eq!(released, 2 * COMMAND_QUEUE_SIZE - 1);

        control.transport.running.store(true, Ordering::Release);
        renderer.render(&mut out, 1);
        assert_eq!(out, [1.0; 4]);
    }

    #[test]
    fn voice_starts_on_its_frame_across_blocks() {
        let (mut renderer, mut control) = running();
        let samples: Vec<f32> = (1..=6).map(|i| i as f32).collect();
        start(&mut control, voice(samples, 6, 2));

        let mut first = vec![0.0; 4];
        let mut second = vec![0.0; 4];
        renderer.render(&mut first, 1);
        renderer.render(&mut second, 1);

        assert_eq!(first, [0.0; 4]);
        // Frame 6 plays sample offset 2 (value 3.0)
        assert_eq!(second, [0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn finished_voices_go_back_to_the_control_side() {
        let (mut renderer, mut control) = running();
        start(&mut control, voice(vec![0.5; 3], 0, 0));

        let mut out = vec![0.0; 8];
        renderer.render(&mut out, 2);
        assert_eq!(out, [0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.0, 0.0]);
        assert_eq!(renderer.active_voices(), 0);
        assert_eq!(control.collect_retired(), 1);
        assert_eq!(control.collect_retired(), 0);
    }

    #[test]
    fn stop_cuts_at_requested_frame() {
        let (mut renderer, mut control) = running();
        let stop = start(&mut control, voice(vec![1.0; 16], 0, 0));
        stop.stop_at(3);
        // A later stop never extends the source
        stop.stop_at(5);

        let mut out = vec![0.0; 6];
        renderer.render(&mut out, 1);
        assert_eq!(out, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(renderer.active_voices(), 0);
    }

    #[test]
    fn full_pool_steals_oldest_stopped_voice() {
        let (mut renderer, mut control) = running();
        let stops: Vec<StopSignal> = (0..VOICE_CAPACITY as u64)
            .map(|i| start(&mut control, voice(vec![1.0; 64], 100 + i, 0)))
            .collect();
        let mut out = vec![0.0; 1];
        renderer.render(&mut out, 1);

        // Stopped in the future, so it still holds its slot
        stops[5].stop_at(1_000);
        start(&mut control, voice(vec![1.0; 64], 500, 0));
        renderer.render(&mut out, 1);

        assert_eq!(renderer.active_voices(), VOICE_CAPACITY);
        assert!(renderer.slots.iter().flatten().all(|v| v.start_frame != 105));
        assert!(renderer.slots.iter().flatten().any(|v| v.start_frame == 500));
        assert_eq!(control.collect_retired(), 1);
    }

    #[test]
    fn gain_changes_apply_next_block() {
        let (mut renderer, mut control) = running();
        let v = voice(vec![1.0; 8], 0, 0);
        let gain = v.gain.clone();
        start(&mut control, v);

        let mut out = vec![0.0; 4];
        renderer.render(&mut out, 1);
        gain.set(0.25);
        renderer.render(&mut out, 1);
        assert_eq!(out, [0.25; 4]);
    }
}
