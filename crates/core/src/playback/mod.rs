use std::fmt;

use crate::config::PlaybackConfig;
use crate::error::LoadError;

/// Container format hint passed through to the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Ogg,
    Wav,
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Wav => "wav",
        };
        f.write_str(name)
    }
}

/// Result of an asynchronous load reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready,
    Failed(LoadError),
}

/// Narrow contract the controller requires from an audio backend. The core
/// never talks to audio hardware directly; anything that can load a source,
/// toggle playback, and report a clock fits here.
pub trait AudioBackend {
    /// Kicks off an asynchronous load. The outcome arrives via
    /// [`AudioBackend::poll_load`].
    fn begin_load(&mut self, source_url: &str, format: AudioFormat);

    /// Returns the load outcome once available; `None` while in flight.
    fn poll_load(&mut self) -> Option<LoadOutcome>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Current playback position. Only meaningful after a successful load.
    fn position_seconds(&self) -> f64;

    /// Releases the underlying audio resource. Idempotent.
    fn release(&mut self);
}

/// Device-class probe consulted by the autoplay gate.
pub trait DeviceProbe {
    fn is_mobile(&self) -> bool;
}

/// Probe with a fixed answer, used by the CLI demo and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDeviceProbe {
    pub mobile: bool,
}

impl DeviceProbe for StaticDeviceProbe {
    fn is_mobile(&self) -> bool {
        self.mobile
    }
}

/// Lifecycle of the audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AutoplayTimer {
    Idle,
    Armed { deadline: f64, retried: bool },
    Spent,
}

/// Owns the load/ready/playing lifecycle of the audio source and the
/// one-shot deferred autoplay policy.
///
/// All transitions happen in [`PlaybackController::tick`] or in explicit
/// user-action methods; time is injected, so the machine is driven the same
/// way by a render loop and by tests feeding synthetic clocks.
pub struct PlaybackController<B: AudioBackend, P: DeviceProbe> {
    backend: B,
    probe: P,
    config: PlaybackConfig,
    state: PlaybackState,
    frozen_position: f64,
    autoplay: AutoplayTimer,
    last_error: Option<LoadError>,
    released: bool,
}

impl<B: AudioBackend, P: DeviceProbe> PlaybackController<B, P> {
    pub fn new(backend: B, probe: P, config: PlaybackConfig) -> Self {
        Self {
            backend,
            probe,
            config,
            state: PlaybackState::Unloaded,
            frozen_position: 0.0,
            autoplay: AutoplayTimer::Idle,
            last_error: None,
            released: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    /// Starts loading the source and arms the deferred autoplay trigger.
    /// Mobile devices never get the trigger; they wait for an explicit
    /// user gesture instead.
    pub fn load(&mut self, source_url: &str, format: AudioFormat, now_seconds: f64) {
        if self.state != PlaybackState::Unloaded {
            return;
        }

        tracing::debug!(source_url, %format, "loading audio source");
        self.backend.begin_load(source_url, format);
        self.state = PlaybackState::Loading;

        if self.probe.is_mobile() {
            tracing::debug!("mobile device class, autoplay stays gated");
            self.autoplay = AutoplayTimer::Spent;
        } else {
            self.autoplay = AutoplayTimer::Armed {
                deadline: now_seconds + self.config.autoplay_delay_seconds,
                retried: false,
            };
        }
    }

    /// Advances the machine: polls an in-flight load and fires the autoplay
    /// trigger when due. Called once per frame with the current wall clock.
    pub fn tick(&mut self, now_seconds: f64) {
        if self.state == PlaybackState::Loading {
            match self.backend.poll_load() {
                Some(LoadOutcome::Ready) => {
                    tracing::debug!("audio source ready");
                    self.state = PlaybackState::Ready;
                }
                Some(LoadOutcome::Failed(error)) => {
                    tracing::warn!(%error, "audio source failed to load");
                    self.last_error = Some(error);
                    self.state = PlaybackState::Errored;
                    self.autoplay = AutoplayTimer::Spent;
                }
                None => {}
            }
        }

        if let AutoplayTimer::Armed { deadline, retried } = self.autoplay {
            if now_seconds >= deadline {
                self.autoplay = match self.state {
                    PlaybackState::Ready => {
                        tracing::debug!("deferred autoplay trigger fired");
                        self.start_playing();
                        AutoplayTimer::Spent
                    }
                    // Still loading when the trigger fired: defer once more,
                    // then give up.
                    PlaybackState::Loading if !retried => AutoplayTimer::Armed {
                        deadline: now_seconds + self.config.autoplay_delay_seconds,
                        retried: true,
                    },
                    _ => AutoplayTimer::Spent,
                };
            }
        }
    }

    /// Explicit user gesture toggling between playing and paused.
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Ready | PlaybackState::Paused => self.play(),
            PlaybackState::Playing => self.pause(),
            _ => {}
        }
    }

    pub fn play(&mut self) {
        if matches!(self.state, PlaybackState::Ready | PlaybackState::Paused) {
            self.start_playing();
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.frozen_position = self.backend.position_seconds();
            self.backend.pause();
            self.state = PlaybackState::Paused;
        }
    }

    /// Playback position read for this frame. `None` until the source is
    /// loaded; frozen (not reset) while paused.
    pub fn position_seconds(&self) -> Option<f64> {
        match self.state {
            PlaybackState::Playing | PlaybackState::Ready => {
                Some(self.backend.position_seconds())
            }
            PlaybackState::Paused => Some(self.frozen_position),
            _ => None,
        }
    }

    /// Status line for the surrounding page. Load failures surface here;
    /// nominal states say nothing.
    pub fn user_message(&self) -> Option<&'static str> {
        match self.state {
            PlaybackState::Loading => Some("Loading audio"),
            PlaybackState::Errored => Some("No audio to play"),
            _ => None,
        }
    }

    /// Cancels the pending autoplay trigger and releases the backend.
    /// Safe to call from any state; also runs on drop.
    pub fn dispose(&mut self) {
        if !self.released {
            self.autoplay = AutoplayTimer::Spent;
            self.backend.release();
            self.released = true;
            self.state = PlaybackState::Unloaded;
        }
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn start_playing(&mut self) {
        self.backend.play();
        self.state = PlaybackState::Playing;
    }
}

impl<B: AudioBackend, P: DeviceProbe> Drop for PlaybackController<B, P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Deterministic in-process backend whose clock is advanced explicitly.
///
/// Load outcomes are scripted at construction and delivered on the next
/// poll, which lets tests and the CLI demo drive the controller through its
/// whole lifecycle without audio hardware or real timers.
#[derive(Debug)]
pub struct OfflineBackend {
    scripted_failure: Option<String>,
    pending: Option<LoadOutcome>,
    playing: bool,
    position: f64,
    released: bool,
}

impl OfflineBackend {
    /// A backend whose load succeeds on the first poll.
    pub fn new() -> Self {
        Self {
            scripted_failure: None,
            pending: None,
            playing: false,
            position: 0.0,
            released: false,
        }
    }

    /// A backend whose load fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            scripted_failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Advances the internal clock; only moves while playing, matching a
    /// real audio element's behavior across pause.
    pub fn advance(&mut self, delta_seconds: f64) {
        if self.playing {
            self.position += delta_seconds;
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for OfflineBackend {
    fn begin_load(&mut self, source_url: &str, _format: AudioFormat) {
        self.pending = Some(match self.scripted_failure.take() {
            Some(message) => LoadOutcome::Failed(LoadError::new(source_url, message)),
            None => LoadOutcome::Ready,
        });
    }

    fn poll_load(&mut self) -> Option<LoadOutcome> {
        self.pending.take()
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn position_seconds(&self) -> f64 {
        self.position
    }

    fn release(&mut self) {
        self.playing = false;
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(
        backend: OfflineBackend,
        mobile: bool,
    ) -> PlaybackController<OfflineBackend, StaticDeviceProbe> {
        PlaybackController::new(
            backend,
            StaticDeviceProbe { mobile },
            PlaybackConfig::default(),
        )
    }

    #[test]
    fn failed_load_reaches_errored_and_stays_there() {
        let mut player = controller(OfflineBackend::failing("decode error"), false);
        player.load("track.mus", AudioFormat::Mp3, 0.0);
        assert_eq!(player.state(), PlaybackState::Loading);

        player.tick(0.1);
        assert_eq!(player.state(), PlaybackState::Errored);
        assert_eq!(player.user_message(), Some("No audio to play"));

        // Neither the autoplay deadline nor a user gesture revives it.
        player.tick(10.0);
        player.toggle();
        assert_eq!(player.state(), PlaybackState::Errored);
        assert!(player.position_seconds().is_none());

        let error = player.last_error().unwrap();
        assert_eq!(error.source_url, "track.mus");
    }

    #[test]
    fn autoplay_fires_after_delay_on_desktop() {
        let mut player = controller(OfflineBackend::new(), false);
        player.load("track.mus", AudioFormat::Mp3, 0.0);

        player.tick(0.1);
        assert_eq!(player.state(), PlaybackState::Ready);

        // Before the deadline nothing happens.
        player.tick(1.0);
        assert_eq!(player.state(), PlaybackState::Ready);

        player.tick(2.2);
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn autoplay_is_gated_on_mobile() {
        let mut player = controller(OfflineBackend::new(), true);
        player.load("track.mus", AudioFormat::Mp3, 0.0);

        player.tick(0.1);
        player.tick(60.0);
        assert_eq!(player.state(), PlaybackState::Ready);

        // An explicit gesture still works.
        player.toggle();
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn pause_freezes_the_reported_position() {
        let mut player = controller(OfflineBackend::new(), true);
        player.load("track.mus", AudioFormat::Mp3, 0.0);
        player.tick(0.1);
        player.toggle();

        player.backend_mut().advance(3.0);
        assert_eq!(player.position_seconds(), Some(3.0));

        player.pause();
        // The backend clock cannot move while paused, and even if it could,
        // the controller reports the captured value.
        player.backend_mut().advance(5.0);
        assert_eq!(player.position_seconds(), Some(3.0));

        player.play();
        player.backend_mut().advance(1.0);
        assert_eq!(player.position_seconds(), Some(4.0));
    }

    #[test]
    fn dispose_releases_the_backend_from_any_state() {
        let mut player = controller(OfflineBackend::new(), false);
        player.load("track.mus", AudioFormat::Mp3, 0.0);
        player.tick(0.1);
        player.toggle();

        player.dispose();
        assert_eq!(player.state(), PlaybackState::Unloaded);
        assert!(player.backend_mut().is_released());

        // A lapsed autoplay deadline after dispose must not restart playback.
        player.tick(100.0);
        assert_eq!(player.state(), PlaybackState::Unloaded);
    }

    /// Backend whose load outcome is set by the test after the fact.
    struct ManualBackend {
        outcome: Option<LoadOutcome>,
        playing: bool,
    }

    impl ManualBackend {
        fn new() -> Self {
            Self {
                outcome: None,
                playing: false,
            }
        }
    }

    impl AudioBackend for ManualBackend {
        fn begin_load(&mut self, _source_url: &str, _format: AudioFormat) {}

        fn poll_load(&mut self) -> Option<LoadOutcome> {
            self.outcome.take()
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn position_seconds(&self) -> f64 {
            0.0
        }

        fn release(&mut self) {
            self.playing = false;
        }
    }

    #[test]
    fn autoplay_retries_once_while_still_loading() {
        let mut player = PlaybackController::new(
            ManualBackend::new(),
            StaticDeviceProbe { mobile: false },
            PlaybackConfig::default(),
        );
        player.load("track.mus", AudioFormat::Mp3, 0.0);

        // First deadline lapses while the asset is still loading.
        player.tick(2.2);
        assert_eq!(player.state(), PlaybackState::Loading);

        // The asset arrives before the re-armed deadline.
        player.backend_mut().outcome = Some(LoadOutcome::Ready);
        player.tick(3.0);
        assert_eq!(player.state(), PlaybackState::Ready);

        player.tick(4.4);
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn autoplay_lapses_after_the_single_retry() {
        let mut player = PlaybackController::new(
            ManualBackend::new(),
            StaticDeviceProbe { mobile: false },
            PlaybackConfig::default(),
        );
        player.load("track.mus", AudioFormat::Mp3, 0.0);

        player.tick(2.2);
        player.tick(4.4);

        // Too late: the trigger has been spent, only a gesture plays now.
        player.backend_mut().outcome = Some(LoadOutcome::Ready);
        player.tick(5.0);
        assert_eq!(player.state(), PlaybackState::Ready);
        player.tick(60.0);
        assert_eq!(player.state(), PlaybackState::Ready);
    }

    #[test]
    fn toggle_before_ready_is_ignored() {
        let mut player = controller(OfflineBackend::new(), true);
        player.toggle();
        assert_eq!(player.state(), PlaybackState::Unloaded);

        player.load("track.mus", AudioFormat::Mp3, 0.0);
        assert_eq!(player.user_message(), Some("Loading audio"));
    }
}
