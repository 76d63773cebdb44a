//! Click sounds for the metronome.
//!
//! Each [`ClickStyle`] is bound to exactly one source: a synthesis recipe
//! (a small node graph rendered once into a buffer) or a pair of recorded
//! sample assets. Adding a style means adding a variant and its binding in
//! [`ClickStyle::source`]; nothing that consumes clicks needs to change.
//!
//! # Example
//!
//! ```ignore
//! use beatsync::clicks::{self, ClickStyle, NoSamples};
//!
//! let set = clicks::load_clicks(ClickStyle::Wood, false, 48_000, &NoSamples);
//! assert_eq!(set.regular.sample_rate(), 48_000);
//! ```

mod bell;
mod digital;
mod samples;
mod traditional;
mod wood;

use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use bell::{bell, PARTIALS as BELL_PARTIALS};
pub use digital::digital;
pub use samples::{decode_wav, AssetDir, NoSamples, SampleSource};
pub use traditional::traditional;
pub use wood::wood;

use crate::{
    buffer::AudioBuffer,
    error::{AssetResult, UnknownStyle},
    graph::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/// Peak level every click buffer is normalized to
pub const CLICK_PEAK: f32 = 0.9;

/// Recorded sample variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibrosaVariant {
    Default,
    Pitched,
    Short,
    Long,
}

impl LibrosaVariant {
    fn name(self) -> &'static str {
        match self {
            LibrosaVariant::Default => "default",
            LibrosaVariant::Pitched => "pitched",
            LibrosaVariant::Short => "short",
            LibrosaVariant::Long => "long",
        }
    }
}

/// Sound profile of the metronome click
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClickStyle {
    #[default]
    Traditional,
    Digital,
    Wood,
    Bell,
    Librosa(LibrosaVariant),
}

/// Whether a click marks an ordinary beat or the first beat of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Regular,
    Downbeat,
}

/// A procedural click: which graph to strike, at which pitch, for how long
#[derive(Clone, Copy)]
pub struct SynthRecipe {
    pub regular_hz: f32,
    pub downbeat_hz: f32,
    /// Rendered length in seconds
    pub length: f32,
    pub build: fn() -> Box<dyn GraphNode>,
}

/// What a style resolves to
#[derive(Clone, Copy)]
pub enum ClickSource {
    Synth(SynthRecipe),
    Sample {
        regular: &'static str,
        downbeat: &'static str,
    },
}

impl ClickStyle {
    pub const ALL: [ClickStyle; 8] = [
        ClickStyle::Traditional,
        ClickStyle::Digital,
        ClickStyle::Wood,
        ClickStyle::Bell,
        ClickStyle::Librosa(LibrosaVariant::Default),
        ClickStyle::Librosa(LibrosaVariant::Pitched),
        ClickStyle::Librosa(LibrosaVariant::Short),
        ClickStyle::Librosa(LibrosaVariant::Long),
    ];

    pub fn source(self) -> ClickSource {
        match self {
            ClickStyle::Traditional => ClickSource::Synth(traditional::RECIPE),
            ClickStyle::Digital => ClickSource::Synth(digital::RECIPE),
            ClickStyle::Wood => ClickSource::Synth(wood::RECIPE),
            ClickStyle::Bell => ClickSource::Synth(bell::RECIPE),
            ClickStyle::Librosa(variant) => ClickSource::Sample {
                regular: librosa_asset(variant, ClickKind::Regular),
                downbeat: librosa_asset(variant, ClickKind::Downbeat),
            },
        }
    }

    pub fn is_sample_based(self) -> bool {
        matches!(self, ClickStyle::Librosa(_))
    }
}

fn librosa_asset(variant: LibrosaVariant, kind: ClickKind) -> &'static str {
    match (variant, kind) {
        (LibrosaVariant::Default, ClickKind::Regular) => "librosa_default_regular.wav",
        (LibrosaVariant::Default, ClickKind::Downbeat) => "librosa_default_downbeat.wav",
        (LibrosaVariant::Pitched, ClickKind::Regular) => "librosa_pitched_regular.wav",
        (LibrosaVariant::Pitched, ClickKind::Downbeat) => "librosa_pitched_downbeat.wav",
        (LibrosaVariant::Short, ClickKind::Regular) => "librosa_short_regular.wav",
        (LibrosaVariant::Short, ClickKind::Downbeat) => "librosa_short_downbeat.wav",
        (LibrosaVariant::Long, ClickKind::Regular) => "librosa_long_regular.wav",
        (LibrosaVariant::Long, ClickKind::Downbeat) => "librosa_long_downbeat.wav",
    }
}

impl fmt::Display for ClickStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickStyle::Traditional => f.write_str("traditional"),
            ClickStyle::Digital => f.write_str("digital"),
            ClickStyle::Wood => f.write_str("wood"),
            ClickStyle::Bell => f.write_str("bell"),
            ClickStyle::Librosa(variant) => write!(f, "librosa_{}", variant.name()),
        }
    }
}

impl FromStr for ClickStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ClickStyle::ALL
            .into_iter()
            .find(|style| style.to_string() == needle)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

impl TryFrom<String> for ClickStyle {
    type Error = UnknownStyle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClickStyle> for String {
    fn from(style: ClickStyle) -> Self {
        style.to_string()
    }
}

impl SynthRecipe {
    pub fn pitch(&self, kind: ClickKind) -> f32 {
        match kind {
            ClickKind::Regular => self.regular_hz,
            ClickKind::Downbeat => self.downbeat_hz,
        }
    }

    /// Strike the graph once and render `length` seconds, peak-normalized.
    pub fn render(&self, kind: ClickKind, sample_rate: u32) -> AudioBuffer {
        let frames = (self.length * sample_rate as f32).round().max(1.0) as usize;
        let ctx = RenderCtx::from_freq(sample_rate as f32, self.pitch(kind), 1.0);

        let mut node = (self.build)();
        node.note_on(&ctx);

        let mut samples = vec![0.0f32; frames];
        let mut rendered = 0;
        for block in samples.chunks_mut(MAX_BLOCK_SIZE) {
            // Everything after the strike rings out stays zeroed
            if !node.is_active() {
                break;
            }
            node.render_block(block, &ctx.advanced(rendered));
            rendered += block.len();
        }

        AudioBuffer::new(samples, sample_rate).normalized(CLICK_PEAK)
    }
}

/// The click buffers a metronome plays with
#[derive(Debug, Clone)]
pub struct ClickSet {
    /// Style that actually produced the buffers (differs from the requested
    /// style after a fallback)
    pub style: ClickStyle,
    pub regular: AudioBuffer,
    pub downbeat: Option<AudioBuffer>,
}

impl ClickSet {
    pub fn for_kind(&self, kind: ClickKind) -> &AudioBuffer {
        match kind {
            ClickKind::Downbeat => self.downbeat.as_ref().unwrap_or(&self.regular),
            ClickKind::Regular => &self.regular,
        }
    }
}

/// Render a procedural style's click set.
pub fn synthesize(recipe: &SynthRecipe, style: ClickStyle, with_downbeat: bool, sample_rate: u32) -> ClickSet {
    ClickSet {
        style,
        regular: recipe.render(ClickKind::Regular, sample_rate),
        downbeat: with_downbeat.then(|| recipe.render(ClickKind::Downbeat, sample_rate)),
    }
}

/// Resolve a style to click buffers at `sample_rate`.
///
/// Sample-based styles that fail to load for any reason fall back to the
/// traditional synthesized click; the failure is logged, never returned.
pub fn load_clicks(
    style: ClickStyle,
    with_downbeat: bool,
    sample_rate: u32,
    samples: &dyn SampleSource,
) -> ClickSet {
    match style.source() {
        ClickSource::Synth(recipe) => synthesize(&recipe, style, with_downbeat, sample_rate),
        ClickSource::Sample { regular, downbeat } => {
            match load_sample_set(samples, regular, with_downbeat.then_some(downbeat), sample_rate) {
                Ok((regular, downbeat)) => ClickSet {
                    style,
                    regular,
                    downbeat,
                },
                Err(err) => {
                    log::warn!("Click style {style} unavailable ({err}), using traditional");
                    synthesize(&traditional::RECIPE, ClickStyle::Traditional, with_downbeat, sample_rate)
                }
            }
        }
    }
}

fn load_sample_set(
    samples: &dyn SampleSource,
    regular: &str,
    downbeat: Option<&str>,
    sample_rate: u32,
) -> AssetResult<(AudioBuffer, Option<AudioBuffer>)> {
    let prepare = |buffer: AudioBuffer| buffer.resampled(sample_rate).normalized(CLICK_PEAK);

    let regular = prepare(samples.load(regular)?);
    let downbeat = downbeat
        .map(|asset| samples.load(asset).map(prepare))
        .transpose()?;

    Ok((regular, downbeat))
}
