use std::collections::BTreeMap;
use std::path::PathBuf;

use bloom_visualiser_core::flags::SCENE_FLAG;
use bloom_visualiser_core::{
    assets, AppConfig, AudioFormat, EventKind, FeatureSnapshot, FlagClient, FlagFetchError,
    FrameDriver, OfflineBackend, PlaybackController, RenderGraph, SceneInstance, SessionFlags,
    StaticDeviceProbe,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> bloom_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { analysis } => run_validate(&analysis),
        Commands::Play {
            analysis,
            source,
            frames,
            fps,
            mobile,
            bloom,
        } => run_play(&analysis, source.as_deref(), frames, fps, mobile, bloom),
    }
}

fn run_validate(analysis: &PathBuf) -> bloom_visualiser_core::Result<()> {
    tracing::info!(?analysis, "validating analysis payload");

    let timeline = assets::load_timeline(analysis)?;
    let track = timeline.track();
    tracing::info!(
        duration = track.duration,
        tempo = track.tempo,
        loudness = track.loudness,
        bars = timeline.event_count(EventKind::Bar),
        beats = timeline.event_count(EventKind::Beat),
        sections = timeline.event_count(EventKind::Section),
        segments = timeline.event_count(EventKind::Segment),
        tatums = timeline.event_count(EventKind::Tatum),
        "timeline is valid"
    );
    Ok(())
}

fn run_play(
    analysis: &PathBuf,
    source: Option<&str>,
    frames: u32,
    fps: u32,
    mobile: bool,
    bloom: bool,
) -> bloom_visualiser_core::Result<()> {
    let config = AppConfig::default();
    let timeline = assets::load_timeline(analysis)?;

    let mut session = SessionFlags::new(CliFlagClient { bloom }, config.flags.endpoint.clone());
    let variant = session.variant();
    tracing::info!(?variant, "capability gate resolved");

    let mut graph = RenderGraph::mount(SceneInstance::mount(variant));
    let mut player = PlaybackController::new(
        OfflineBackend::new(),
        StaticDeviceProbe { mobile },
        config.playback.clone(),
    );
    let source = source.unwrap_or(&config.playback.source_url);
    player.load(source, AudioFormat::Mp3, 0.0);

    let mut driver = FrameDriver::new();
    let step = 1.0 / fps.max(1) as f64;
    let mut now = 0.0;

    for frame in 0..frames {
        now += step;
        player.tick(now);
        player.backend_mut().advance(step);
        driver.tick(&player, &timeline, &mut graph);
        graph.draw()?;

        if frame % fps.max(1) == 0 {
            let params = graph.latest();
            tracing::info!(
                frame,
                state = ?player.state(),
                elevation_phase = params.elevation_phase,
                color_phase = params.color_phase,
                intensity = params.intensity,
                "frame sampled"
            );
        }
    }

    if let Some(message) = player.user_message() {
        tracing::info!(message, "playback status");
    }

    player.dispose();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Flag client for the headless demo: the snapshot is decided by the command
/// line instead of a remote service.
struct CliFlagClient {
    bloom: bool,
}

impl FlagClient for CliFlagClient {
    fn fetch_snapshot(&mut self, _endpoint: &str) -> Result<FeatureSnapshot, FlagFetchError> {
        let mut values = BTreeMap::new();
        values.insert(
            SCENE_FLAG.to_string(),
            if self.bloom { "on" } else { "off" }.to_string(),
        );
        Ok(FeatureSnapshot::ok(values))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Timeline-synchronized shader driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a music-analysis payload and print track statistics.
    Validate {
        /// Path to the analysis JSON asset.
        analysis: PathBuf,
    },
    /// Run the frame loop headlessly against an offline audio clock.
    Play {
        /// Path to the analysis JSON asset.
        analysis: PathBuf,
        /// Audio source URL handed to the backend.
        #[arg(short, long)]
        source: Option<String>,
        /// Number of frames to drive.
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Frame rate of the simulated render loop.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Treat the device as mobile (gates autoplay).
        #[arg(long)]
        mobile: bool,
        /// Force the enhanced scene flag on.
        #[arg(long)]
        bloom: bool,
    },
}
