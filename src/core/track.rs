use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// An audio playback session as seen by the update loop.
pub trait Track {
    fn current_time(&self) -> Duration;
    fn length(&self) -> Duration;
    /// False until the track's data is ready to be played and measured.
    fn is_loaded(&self) -> bool;
    fn is_running(&self) -> bool;
    fn seek(&mut self, position: Duration);
    fn start(&mut self);
    fn stop(&mut self);
}

pub type SharedTrack = Rc<RefCell<dyn Track>>;

/// Read-only snapshot of a track taken at the start of an update tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_time: Duration,
    pub length: Duration,
    pub loaded: bool,
}

impl PlaybackState {
    pub fn of(track: &dyn Track) -> Self {
        Self {
            current_time: track.current_time(),
            length: track.length(),
            loaded: track.is_loaded(),
        }
    }

    /// `current_time / length`, or `None` when the track is not loaded or has no length.
    pub fn fraction(&self) -> Option<f64> {
        if !self.loaded || self.length.is_zero() {
            return None;
        }
        let fraction = self.current_time.as_secs_f64() / self.length.as_secs_f64();
        Some(fraction.clamp(0.0, 1.0))
    }
}

/// The slot holding whichever track is currently bound. Cloning shares the slot.
#[derive(Clone, Default)]
pub struct WorkingSession {
    slot: Rc<RefCell<Option<SharedTrack>>>,
}

impl WorkingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, track: SharedTrack) {
        if let Some(old) = self.slot.borrow_mut().replace(track) {
            old.borrow_mut().stop();
        }
    }

    pub fn unbind(&self) {
        if let Some(old) = self.slot.borrow_mut().take() {
            old.borrow_mut().stop();
        }
    }

    pub fn track(&self) -> Option<SharedTrack> {
        self.slot.borrow().clone()
    }
}

/// A track driven by the wall clock. Position advances while running and
/// stops at `length`.
#[derive(Debug)]
pub struct ClockTrack {
    length: Duration,
    offset: Duration,
    running_since: Option<Instant>,
}

impl ClockTrack {
    pub fn new(length: Duration) -> Self {
        Self { length, offset: Duration::ZERO, running_since: None }
    }

    fn elapsed(&self) -> Duration {
        self.running_since
            .map(|since| Instant::now().saturating_duration_since(since))
            .unwrap_or_default()
    }
}

impl Track for ClockTrack {
    fn current_time(&self) -> Duration {
        (self.offset + self.elapsed()).min(self.length)
    }

    fn length(&self) -> Duration {
        self.length
    }

    fn is_loaded(&self) -> bool {
        true
    }

    fn is_running(&self) -> bool {
        self.running_since.is_some() && self.current_time() < self.length
    }

    fn seek(&mut self, position: Duration) {
        self.offset = position.min(self.length);
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }

    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        self.offset = self.current_time();
        self.running_since = None;
    }
}
