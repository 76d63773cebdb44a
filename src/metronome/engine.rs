use std::sync::Arc;

use super::{
    track::{render_track, MetronomeTrack, TrackParams},
    AccentPolicy, MetronomeConfig, TimeSignature,
};
use crate::{
    clicks::{load_clicks, ClickSet, ClickStyle, NoSamples, SampleSource},
    clock::{AudioContext, GainParam, SourceHandle, TransportClock},
};

/// Whether a ready engine is currently sounding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Lifecycle of a [`MetronomeEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready(PlaybackState),
    Disposed,
}

/// The live source and gain of one playback. Never reused across a seek.
struct PlaybackHandle {
    source: SourceHandle,
    gain: GainParam,
    /// Track offset the source started from
    offset: f64,
    /// Context time the source started at
    started_at: f64,
    /// Length of the track being played
    track_duration: f64,
}

/// Plays a pre-rendered click track in sync with an external player.
///
/// The player owns the timeline: the engine only ever hears "start at t",
/// "seek to t" and "stop". Because the whole track is rendered ahead of time
/// and always played from `t` seconds into it, the click grid stays at
/// `k * 60 / bpm` from track start however often playback is restarted.
///
/// Every operation is infallible from the caller's point of view. Without a
/// usable audio clock the engine logs and does nothing.
pub struct MetronomeEngine {
    clock: TransportClock,
    config: MetronomeConfig,
    samples: Box<dyn SampleSource>,

    state: EngineState,
    context: Option<AudioContext>,
    style: ClickStyle,
    clicks: Option<ClickSet>,
    track: Option<Arc<MetronomeTrack>>,
    playback: Option<PlaybackHandle>,
    enabled: bool,
    volume: f32,
}

impl MetronomeEngine {
    pub fn new(clock: TransportClock, config: MetronomeConfig) -> Self {
        Self {
            clock,
            style: config.style,
            volume: config.volume.clamp(0.0, 1.0),
            config,
            samples: Box::new(NoSamples),
            state: EngineState::Uninitialized,
            context: None,
            clicks: None,
            track: None,
            playback: None,
            enabled: false,
        }
    }

    /// Where sample-based styles load their assets from.
    pub fn with_samples(mut self, samples: impl SampleSource + 'static) -> Self {
        self.samples = Box::new(samples);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &MetronomeConfig {
        &self.config
    }

    pub fn style(&self) -> ClickStyle {
        self.style
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// The current track, if one has been generated
    pub fn track(&self) -> Option<Arc<MetronomeTrack>> {
        self.track.clone()
    }

    /// Click buffers in use; differs from [`Self::style`] after a fallback
    pub fn clicks(&self) -> Option<&ClickSet> {
        self.clicks.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bring the engine up without playing anything. Returns whether it is
    /// ready.
    pub fn warm_up(&mut self) -> bool {
        self.ensure_ready()
    }

    /// Render a click track for a song and make it current.
    ///
    /// Identical parameters return the cached track. When a different track
    /// replaces one that is playing, playback continues from the same
    /// position in the new track.
    pub fn generate_track(
        &mut self,
        duration: f64,
        bpm: f64,
        time_signature: TimeSignature,
    ) -> Option<Arc<MetronomeTrack>> {
        if !self.ensure_ready() {
            return None;
        }
        let clicks = self.clicks.as_ref()?;

        let params = TrackParams {
            duration,
            bpm,
            time_signature,
            style: clicks.style,
            accent: self.config.accent,
        };
        if let Some(track) = self.track.as_ref().filter(|t| *t.params() == params) {
            log::debug!("Reusing click track for {bpm} BPM, {duration:.1}s");
            return Some(track.clone());
        }

        let track = match render_track(clicks, params, &self.config) {
            Ok(track) => Arc::new(track),
            Err(e) => {
                log::warn!("Click track not generated: {e}");
                return None;
            }
        };

        let position = self.resume_position();
        self.track = Some(track.clone());
        if let Some(position) = position {
            self.start_playback(position);
        }
        Some(track)
    }

    /// Start (`true`) playback from `current_time` seconds into the track,
    /// or stop it (`false`). Disabling is idempotent.
    pub fn enable(&mut self, enabled: bool, current_time: f64) {
        if self.state == EngineState::Disposed {
            log::debug!("enable({enabled}) ignored: engine disposed");
            return;
        }

        if !enabled {
            self.stop_playback();
            self.enabled = false;
            return;
        }

        if !self.ensure_ready() {
            return;
        }
        if self.track.is_none() {
            log::debug!("enable ignored: no click track generated yet");
            return;
        }

        if let Err(e) = self.clock.resume() {
            log::debug!("Audio clock not resumed yet: {e}");
        }
        self.start_playback(current_time);
    }

    /// Restart playback at `current_time`. Does nothing while disabled.
    ///
    /// Unlike [`Self::enable`] this leaves a suspended clock suspended; the
    /// restart is heard once the clock resumes.
    pub fn seek(&mut self, current_time: f64) {
        if !self.enabled || self.state == EngineState::Disposed {
            log::debug!("seek ignored: metronome not playing");
            return;
        }
        // A replaced context disables playback
        if !self.ensure_ready() || !self.enabled {
            return;
        }
        self.start_playback(current_time);
    }

    /// Set volume in `0..=1`. Takes effect on the live playback immediately.
    pub fn set_volume(&mut self, volume: f32) {
        if self.state == EngineState::Disposed {
            return;
        }
        if !volume.is_finite() {
            log::warn!("Ignoring non-finite volume {volume}");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(playback) = &self.playback {
            playback.gain.set(self.config.gain_for(self.volume));
        }
    }

    /// Switch click sounds. An existing track is re-rendered with the new
    /// style and playback resumes where it was.
    pub fn set_sound_style(&mut self, style: ClickStyle) {
        if self.state == EngineState::Disposed || style == self.style {
            return;
        }
        self.style = style;

        let Some(ctx) = self.context.clone() else {
            // Picked up on initialization
            return;
        };

        let position = self.resume_position();
        let clicks = self.resolve_clicks(ctx.sample_rate());

        if let Some(old) = self.track.take() {
            let params = TrackParams {
                style: clicks.style,
                ..*old.params()
            };
            match render_track(&clicks, params, &self.config) {
                Ok(track) => self.track = Some(Arc::new(track)),
                Err(e) => {
                    log::warn!("Failed to re-render track in style {style}: {e}");
                    self.track = Some(old);
                    return;
                }
            }
        }
        self.clicks = Some(clicks);

        if let Some(position) = position {
            self.start_playback(position);
        }
    }

    /// Offset into the track of the live playback, in seconds. `None` when
    /// nothing is playing or the track has played out.
    pub fn position(&self) -> Option<f64> {
        let playback = self.playback.as_ref()?;
        let ctx = self.context.as_ref()?;
        let position = playback.offset + (ctx.current_time() - playback.started_at).max(0.0);
        (position < playback.track_duration).then_some(position)
    }

    /// Stop playback and release everything. The engine stays inert.
    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.stop_playback();
        self.enabled = false;
        self.track = None;
        self.clicks = None;
        self.context = None;
        self.state = EngineState::Disposed;
        log::debug!("Metronome disposed");
    }

    fn ensure_ready(&mut self) -> bool {
        match self.state {
            EngineState::Disposed => {
                log::debug!("Metronome disposed; ignoring call");
                false
            }
            EngineState::Initializing => false,
            EngineState::Ready(_) => self.check_context(),
            EngineState::Uninitialized => {
                self.state = EngineState::Initializing;
                match self.clock.context() {
                    Ok(ctx) => {
                        self.clicks = Some(self.resolve_clicks(ctx.sample_rate()));
                        self.context = Some(ctx);
                        self.state = EngineState::Ready(PlaybackState::Paused);
                        log::debug!("Metronome ready ({})", self.style);
                        true
                    }
                    Err(e) => {
                        log::warn!("Metronome unavailable: {e}");
                        self.state = EngineState::Uninitialized;
                        false
                    }
                }
            }
        }
    }

    /// Follow the clock if it replaced its context since we last looked.
    fn check_context(&mut self) -> bool {
        let ctx = match self.clock.context() {
            Ok(ctx) => ctx,
            Err(e) => {
                log::warn!("Metronome lost its audio clock: {e}");
                self.stop_playback();
                self.enabled = false;
                self.context = None;
                self.state = EngineState::Uninitialized;
                return false;
            }
        };
        if self.context.as_ref().is_some_and(|c| c.ptr_eq(&ctx)) {
            return true;
        }

        log::info!("Audio context replaced; metronome playback reset");
        // The old source died with its context
        self.playback = None;
        self.enabled = false;
        self.state = EngineState::Ready(PlaybackState::Paused);

        let rate_changed = self
            .clicks
            .as_ref()
            .map_or(true, |c| c.regular.sample_rate() != ctx.sample_rate());
        if rate_changed {
            let clicks = self.resolve_clicks(ctx.sample_rate());
            self.track = self
                .track
                .take()
                .and_then(|old| render_track(&clicks, *old.params(), &self.config).ok())
                .map(Arc::new);
            self.clicks = Some(clicks);
        }
        self.context = Some(ctx);
        true
    }

    /// Where playback continues once the track changes. Playback that already
    /// ran off the end is dropped rather than restarted.
    fn resume_position(&mut self) -> Option<f64> {
        let position = self.position();
        if position.is_none() && self.playback.is_some() {
            log::debug!("Click track played out; not restarting it");
            self.stop_playback();
        }
        position
    }

    fn resolve_clicks(&self, sample_rate: u32) -> ClickSet {
        let with_downbeat = self.config.accent == AccentPolicy::Downbeat;
        load_clicks(self.style, with_downbeat, sample_rate, &*self.samples)
    }

    fn start_playback(&mut self, current_time: f64) {
        self.stop_playback();

        let (Some(ctx), Some(track)) = (self.context.as_ref(), self.track.as_ref()) else {
            return;
        };

        let offset = if track.contains(current_time) {
            current_time
        } else {
            log::debug!(
                "Start time {current_time:.3}s outside track of {:.3}s; starting from 0",
                track.duration()
            );
            0.0
        };

        let gain = ctx.create_gain(self.config.gain_for(self.volume));
        let started_at = ctx.current_time();
        match ctx.start_source(track.buffer(), &gain, started_at, offset) {
            Ok(source) => {
                self.playback = Some(PlaybackHandle {
                    source,
                    gain,
                    offset,
                    started_at,
                    track_duration: track.duration(),
                });
                self.enabled = true;
                self.state = EngineState::Ready(PlaybackState::Playing);
            }
            Err(e) => {
                log::warn!("Failed to start metronome playback: {e}");
                self.enabled = false;
            }
        }
    }

    fn stop_playback(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.source.stop();
        }
        if let EngineState::Ready(_) = self.state {
            self.state = EngineState::Ready(PlaybackState::Paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockState, HeadlessBackend, HeadlessDriver, UnsupportedBackend};

    const SR: u32 = 8_000;

    fn engine() -> (MetronomeEngine, HeadlessDriver) {
        let (backend, driver) = HeadlessBackend::new(SR);
        let engine = MetronomeEngine::new(TransportClock::new(backend), MetronomeConfig::default());
        (engine, driver)
    }

    #[test]
    fn lifecycle_moves_through_states() {
        let (mut engine, _driver) = engine();
        assert_eq!(engine.state(), EngineState::Uninitialized);

        assert!(engine.warm_up());
        assert_eq!(engine.state(), EngineState::Ready(PlaybackState::Paused));

        engine.generate_track(4.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 1.0);
        assert_eq!(engine.state(), EngineState::Ready(PlaybackState::Playing));

        engine.enable(false, 0.0);
        assert_eq!(engine.state(), EngineState::Ready(PlaybackState::Paused));

        engine.dispose();
        assert_eq!(engine.state(), EngineState::Disposed);
        engine.enable(true, 0.0);
        assert!(!engine.is_enabled());
        assert!(engine.generate_track(4.0, 120.0, TimeSignature::FOUR_FOUR).is_none());
    }

    #[test]
    fn identical_parameters_reuse_the_track() {
        let (mut engine, _driver) = engine();
        let a = engine.generate_track(4.0, 100.0, TimeSignature::FOUR_FOUR).unwrap();
        let b = engine.generate_track(4.0, 100.0, TimeSignature::FOUR_FOUR).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = engine.generate_track(4.0, 101.0, TimeSignature::FOUR_FOUR).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn invalid_tempo_keeps_previous_track() {
        let (mut engine, _driver) = engine();
        let good = engine.generate_track(2.0, 90.0, TimeSignature::FOUR_FOUR).unwrap();
        assert!(engine.generate_track(2.0, -5.0, TimeSignature::FOUR_FOUR).is_none());
        assert!(Arc::ptr_eq(&engine.track().unwrap(), &good));
    }

    #[test]
    fn enable_without_track_is_a_no_op() {
        let (mut engine, _driver) = engine();
        engine.enable(true, 0.0);
        assert!(!engine.is_enabled());
        assert_eq!(engine.state(), EngineState::Ready(PlaybackState::Paused));
    }

    #[test]
    fn out_of_range_start_plays_from_zero() {
        let (mut engine, _driver) = engine();
        engine.generate_track(2.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();

        engine.enable(true, 5.0);
        assert_eq!(engine.position(), Some(0.0));

        engine.enable(true, -1.0);
        assert_eq!(engine.position(), Some(0.0));
    }

    #[test]
    fn position_advances_with_the_clock() {
        let (mut engine, driver) = engine();
        engine.generate_track(10.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 3.0);

        driver.render(SR as usize / 2);
        let position = engine.position().unwrap();
        assert!((position - 3.5).abs() < 1e-9, "{position}");
    }

    #[test]
    fn position_ends_with_the_track() {
        let (mut engine, driver) = engine();
        engine.generate_track(2.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 1.5);

        driver.render(SR as usize / 4);
        assert!(engine.position().is_some());
        driver.render(SR as usize / 2);
        assert_eq!(engine.position(), None);
        assert!(engine.is_enabled());
    }

    #[test]
    fn volume_updates_live_gain() {
        let (mut engine, _driver) = engine();
        engine.generate_track(2.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 0.0);

        engine.set_volume(2.0);
        assert_eq!(engine.volume(), 1.0);
        let gain = engine.playback.as_ref().map(|p| p.gain.get());
        assert_eq!(gain, Some(3.0));

        engine.set_volume(f32::NAN);
        assert_eq!(engine.volume(), 1.0);
    }

    #[test]
    fn style_switch_rerenders_and_keeps_position() {
        let (mut engine, driver) = engine();
        engine.generate_track(10.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 2.0);
        driver.render(SR as usize);

        engine.set_sound_style(ClickStyle::Wood);
        let track = engine.track().unwrap();
        assert_eq!(track.style(), ClickStyle::Wood);
        assert!((engine.position().unwrap() - 3.0).abs() < 1e-9);
        assert!(engine.is_enabled());
    }

    #[test]
    fn style_set_before_init_is_used_on_init() {
        let (mut engine, _driver) = engine();
        engine.set_sound_style(ClickStyle::Bell);
        engine.warm_up();
        assert_eq!(engine.clicks().unwrap().style, ClickStyle::Bell);
    }

    #[test]
    fn unavailable_clock_degrades_to_no_ops() {
        let clock = TransportClock::new(UnsupportedBackend::new());
        let mut engine = MetronomeEngine::new(clock, MetronomeConfig::default());

        assert!(!engine.warm_up());
        assert!(engine.generate_track(10.0, 120.0, TimeSignature::FOUR_FOUR).is_none());
        engine.enable(true, 0.0);
        engine.seek(1.0);
        engine.set_volume(0.3);
        engine.set_sound_style(ClickStyle::Digital);
        assert!(!engine.is_enabled());
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert_eq!(engine.volume(), 0.3);
    }

    #[test]
    fn seeks_while_suspended_play_only_the_last_one() {
        let (backend, driver) = HeadlessBackend::new(SR);
        let clock = TransportClock::new(backend);
        let mut engine = MetronomeEngine::new(clock.clone(), MetronomeConfig::default());
        engine.generate_track(10.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 0.0);
        clock.suspend().unwrap();

        // No audio callback runs in between
        for i in 0..200 {
            engine.seek(i as f64 * 0.01);
        }
        assert!(engine.is_enabled());
        assert_eq!(clock.context().unwrap().state(), ClockState::Suspended);

        clock.resume().unwrap();
        // Last seek was to 1.99s; the 2.0s click follows almost at once
        let out = driver.render(SR as usize / 10);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn replaced_context_resets_playback() {
        let (backend, _driver) = HeadlessBackend::new(SR);
        let clock = TransportClock::new(backend);
        let mut engine = MetronomeEngine::new(clock.clone(), MetronomeConfig::default());

        engine.generate_track(2.0, 120.0, TimeSignature::FOUR_FOUR).unwrap();
        engine.enable(true, 0.0);
        clock.close();

        assert!(engine.warm_up());
        assert!(!engine.is_enabled());
        assert!(engine.track().is_some());
        engine.enable(true, 0.5);
        assert!(engine.is_enabled());
    }
}
