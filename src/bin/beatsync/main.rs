//! beatsync - align chords to beats and play metronome tracks
//!
//! Run with: cargo run -- --help

mod analysis;

use std::{
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};

use analysis::Analysis;
use beatsync::{
    align::ChordBeatAligner,
    clicks::{self, AssetDir, ClickStyle, NoSamples, SampleSource},
    metronome::{render_track, AccentPolicy, MetronomeConfig, MetronomeEngine, TimeSignature, TrackParams},
    TransportClock,
};

#[derive(Parser)]
#[command(name = "beatsync", version, about = "Chord/beat alignment and metronome tracks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one chord per beat for an analysis JSON file
    Align {
        /// File with `chords` and `beats` arrays
        analysis: PathBuf,
        /// Matching threshold in seconds
        #[arg(long, default_value_t = beatsync::align::MATCH_THRESHOLD_SECS)]
        threshold: f64,
        /// Use the binary-search aligner
        #[arg(long)]
        search: bool,
    },
    /// Render a click track to a WAV file
    Render {
        #[command(flatten)]
        track: TrackArgs,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        #[arg(short, long, default_value = "metronome.wav")]
        output: PathBuf,
    },
    /// Play a click track on the default output device
    Play {
        #[command(flatten)]
        track: TrackArgs,
        /// Start offset in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        /// Volume between 0 and 1
        #[arg(long)]
        volume: Option<f32>,
    },
    /// List click styles
    Styles,
}

#[derive(Args)]
struct TrackArgs {
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,
    /// Track length in seconds
    #[arg(long, default_value_t = 30.0)]
    duration: f64,
    #[arg(long, default_value = "4/4")]
    time_signature: TimeSignature,
    #[arg(long)]
    style: Option<ClickStyle>,
    /// Accent the first beat of each bar
    #[arg(long)]
    accent: bool,
    /// Directory holding the recorded click samples
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Metronome config JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

impl TrackArgs {
    fn config(&self) -> EyreResult<MetronomeConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => MetronomeConfig::default(),
        };
        if let Some(style) = self.style {
            config.style = style;
        }
        if self.accent {
            config.accent = AccentPolicy::Downbeat;
        }
        Ok(config)
    }

    fn samples(&self) -> Box<dyn SampleSource> {
        match &self.assets {
            Some(dir) => Box::new(AssetDir::new(dir)),
            None => Box::new(NoSamples),
        }
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Align {
            analysis,
            threshold,
            search,
        } => align(&analysis, threshold, search),
        Command::Render {
            track,
            sample_rate,
            output,
        } => render(&track, sample_rate, &output),
        Command::Play {
            track,
            start,
            volume,
        } => play(&track, start, volume),
        Command::Styles => {
            for style in ClickStyle::ALL {
                let kind = if style.is_sample_based() { "sample" } else { "synth" };
                println!("{style:<18}{kind}");
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> EyreResult<MetronomeConfig> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("invalid config {}", path.display()))
}

fn align(path: &Path, threshold: f64, search: bool) -> EyreResult<()> {
    let analysis = Analysis::load(path)?;
    let aligner = ChordBeatAligner::with_threshold(threshold);

    let synced = if search {
        aligner.align_by_search(&analysis.chords, &analysis.beats)
    } else {
        aligner.align(&analysis.chords, &analysis.beats)
    };

    log::info!(
        "Aligned {} chords onto {} beats",
        analysis.chords.len(),
        analysis.beats.len()
    );
    println!("{}", serde_json::to_string_pretty(&synced)?);
    Ok(())
}

fn render(args: &TrackArgs, sample_rate: u32, output: &Path) -> EyreResult<()> {
    let config = args.config()?;
    let with_downbeat = config.accent == AccentPolicy::Downbeat;
    let clicks = clicks::load_clicks(config.style, with_downbeat, sample_rate, args.samples().as_ref());

    let params = TrackParams {
        duration: args.duration,
        bpm: args.bpm,
        time_signature: args.time_signature,
        style: clicks.style,
        accent: config.accent,
    };
    let track = render_track(&clicks, params, &config).wrap_err("failed to render click track")?;
    track
        .write_wav(output)
        .wrap_err_with(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} clicks, {:.1}s at {} BPM ({}) -> {}",
        track.click_frames().len(),
        track.duration(),
        track.bpm(),
        track.style(),
        output.display()
    );
    Ok(())
}

fn play(args: &TrackArgs, start: f64, volume: Option<f32>) -> EyreResult<()> {
    let config = args.config()?;
    let clock = TransportClock::system();
    let mut engine = MetronomeEngine::new(clock.clone(), config);
    if let Some(dir) = &args.assets {
        engine = engine.with_samples(AssetDir::new(dir));
    }

    let track = engine
        .generate_track(args.duration, args.bpm, args.time_signature)
        .ok_or_else(|| eyre!("no click track: audio output unavailable or invalid parameters"))?;
    if let Some(volume) = volume {
        engine.set_volume(volume);
    }

    engine.enable(true, start);
    let Some(position) = engine.position() else {
        return Err(eyre!("playback did not start"));
    };

    println!("Playing {} from {:.1}s... Press Ctrl+C to stop", track.style(), position);
    let remaining = (track.duration() - position).max(0.0);
    thread::sleep(Duration::from_secs_f64(remaining));

    engine.dispose();
    clock.close();
    Ok(())
}
