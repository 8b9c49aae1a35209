use crate::config::{
    BAR_BACKGROUND_COLOUR, BAR_HEIGHT, FILL_COLOUR, GLOW_COLOUR, GRAPH_EMPTY_COLOUR, GRAPH_HEIGHT, HANDLE_SIZE,
    PROGRESS_HEIGHT,
};
use crate::core::track::{PlaybackState, WorkingSession};
use crate::ui::actors::Actor;
use log::debug;

/// Column histogram drawn above the bar. `progress` counts filled columns.
#[derive(Debug, Clone)]
pub struct SongProgressGraph {
    column_count: usize,
    values: Vec<f32>,
    progress: usize,
}

impl SongProgressGraph {
    pub fn new(column_count: usize) -> Self {
        let column_count = column_count.max(1);
        Self { column_count, values: vec![1.0; column_count], progress: 0 }
    }

    #[allow(dead_code)]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    #[allow(dead_code)]
    /// Filled columns, in `0..=column_count`.
    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Column heights in `[0, 1]`; resampled to `column_count` buckets.
    pub fn set_values(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            self.values = vec![1.0; self.column_count];
            return;
        }
        self.values = (0..self.column_count)
            .map(|col| {
                let start = col * samples.len() / self.column_count;
                let end = ((col + 1) * samples.len() / self.column_count).max(start + 1).min(samples.len());
                let bucket = &samples[start.min(samples.len() - 1)..end];
                (bucket.iter().sum::<f32>() / bucket.len() as f32).clamp(0.0, 1.0)
            })
            .collect();
    }

    #[allow(dead_code)]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    fn set_progress_from(&mut self, fraction: f64) {
        self.progress = (self.column_count as f64 * fraction).floor() as usize;
    }

    fn build(&self, width: f32, bottom: f32, out: &mut Vec<Actor>) {
        let col_w = width / self.column_count as f32;
        for (i, value) in self.values.iter().enumerate() {
            let h = (GRAPH_HEIGHT * value).max(1.0);
            let color = if i < self.progress { GLOW_COLOUR } else { GRAPH_EMPTY_COLOUR };
            out.push(Actor::Quad {
                align: [0.0, 1.0],
                offset: [i as f32 * col_w, bottom],
                size: [(col_w - 1.0).max(1.0), h],
                color,
                z: 1,
            });
        }
    }
}

/// The seekable bar. Input is ignored while disabled.
#[derive(Debug, Clone, Default)]
pub struct SongProgressBar {
    enabled: bool,
    position: f32,
}

impl SongProgressBar {
    #[allow(dead_code)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[allow(dead_code)]
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn update_position(&mut self, position: f32) {
        self.position = position;
    }

    /// Maps a press at `x` on a bar `width` wide to a normalized seek target.
    pub fn seek_target(&self, x: f32, width: f32) -> Option<f32> {
        if !self.enabled || width <= 0.0 {
            return None;
        }
        Some((x / width).clamp(0.0, 1.0))
    }

    fn build(&self, width: f32, bottom: f32, out: &mut Vec<Actor>) {
        out.push(Actor::Quad {
            align: [0.0, 1.0],
            offset: [0.0, bottom],
            size: [width, BAR_HEIGHT],
            color: BAR_BACKGROUND_COLOUR,
            z: 2,
        });
        out.push(Actor::Quad {
            align: [0.0, 1.0],
            offset: [0.0, bottom],
            size: [width * self.position, BAR_HEIGHT],
            color: FILL_COLOUR,
            z: 3,
        });
        if self.enabled {
            out.push(Actor::Quad {
                align: [0.5, 1.0],
                offset: [width * self.position, bottom],
                size: HANDLE_SIZE,
                color: FILL_COLOUR,
                z: 4,
            });
        }
    }
}

/// Playback progress bar and histogram following the working session's track.
pub struct SongProgress {
    session: WorkingSession,
    bar: SongProgressBar,
    graph: SongProgressGraph,
    fraction: Option<f64>,
}

impl SongProgress {
    pub fn new(session: WorkingSession, column_count: usize) -> Self {
        Self {
            session,
            bar: SongProgressBar::default(),
            graph: SongProgressGraph::new(column_count),
            fraction: None,
        }
    }

    #[allow(dead_code)]
    pub fn bar(&self) -> &SongProgressBar {
        &self.bar
    }

    #[allow(dead_code)]
    pub fn graph(&self) -> &SongProgressGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SongProgressGraph {
        &mut self.graph
    }

    #[allow(dead_code)]
    /// Fraction computed on the last tick with a ready track.
    pub fn fraction(&self) -> Option<f64> {
        self.fraction
    }

    /// Once per tick. The track is re-read every time; it may have been swapped.
    pub fn update(&mut self) {
        let state = self.session.track().map(|t| PlaybackState::of(&*t.borrow()));
        match state.and_then(|s| s.fraction()) {
            Some(fraction) => {
                self.fraction = Some(fraction);
                self.bar.enabled = true;
                self.bar.update_position(fraction as f32);
                self.graph.set_progress_from(fraction);
            }
            None => self.bar.enabled = false,
        }
    }

    /// Seeks to `position` of the track and always resumes playback, even
    /// from a paused state.
    pub fn seek(&mut self, position: f32) {
        let Some(track) = self.session.track() else { return };
        let mut track = track.borrow_mut();
        let target = track.length().mul_f64(f64::from(position.clamp(0.0, 1.0)));
        debug!("Seek requested at {:.3} -> {:?}", position, target);
        if !track.is_running() {
            debug!("Resuming paused track after seek.");
        }
        track.seek(target);
        track.start();
    }

    /// Handles a pointer press at window coordinates. Returns true if it seeked.
    pub fn handle_press(&mut self, x: f32, y: f32, window_w: f32, window_h: f32) -> bool {
        if y < window_h - PROGRESS_HEIGHT {
            return false;
        }
        match self.bar.seek_target(x, window_w) {
            Some(p) => {
                self.seek(p);
                true
            }
            None => false,
        }
    }

    /// Bottom-anchored graph and bar across the full window width.
    pub fn build(&self, window_w: f32, window_h: f32) -> Vec<Actor> {
        let mut out = Vec::with_capacity(self.graph.column_count + 3);
        self.graph.build(window_w, window_h - BAR_HEIGHT, &mut out);
        self.bar.build(window_w, window_h, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::Track;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Records commands instead of playing anything.
    #[derive(Default)]
    struct ScriptedTrack {
        current: Duration,
        length: Duration,
        loaded: bool,
        running: bool,
        seeks: Vec<Duration>,
        starts: usize,
    }

    impl Track for ScriptedTrack {
        fn current_time(&self) -> Duration {
            self.current
        }

        fn length(&self) -> Duration {
            self.length
        }

        fn is_loaded(&self) -> bool {
            self.loaded
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn seek(&mut self, position: Duration) {
            self.seeks.push(position);
            self.current = position;
        }

        fn start(&mut self) {
            self.starts += 1;
            self.running = true;
        }

        fn stop(&mut self) {
            self.running = false;
        }
    }

    fn bound(track: ScriptedTrack) -> (WorkingSession, Rc<RefCell<ScriptedTrack>>) {
        let session = WorkingSession::new();
        let track = Rc::new(RefCell::new(track));
        session.bind(track.clone());
        (session, track)
    }

    fn loaded(current: u64, length: u64) -> ScriptedTrack {
        ScriptedTrack {
            current: Duration::from_secs(current),
            length: Duration::from_secs(length),
            loaded: true,
            ..Default::default()
        }
    }

    #[test]
    fn update_follows_track_position() {
        let (session, track) = bound(loaded(30, 120));
        let mut progress = SongProgress::new(session, 100);

        progress.update();
        assert!(progress.bar().is_enabled());
        assert_eq!(progress.fraction(), Some(0.25));
        assert_eq!(progress.bar().position(), 0.25);
        assert_eq!(progress.graph().progress(), 25);

        track.borrow_mut().current = Duration::from_secs(90);
        progress.update();
        assert_eq!(progress.fraction(), Some(0.75));
        assert_eq!(progress.graph().progress(), 75);
    }

    #[test]
    fn histogram_index_floors() {
        let (session, _track) = bound(loaded(1, 3));
        let mut progress = SongProgress::new(session, 10);
        progress.update();
        assert_eq!(progress.graph().progress(), 3);
    }

    #[test]
    fn end_of_track_fills_every_column() {
        let (session, _track) = bound(loaded(200, 200));
        let mut progress = SongProgress::new(session, 64);
        progress.update();
        assert_eq!(progress.fraction(), Some(1.0));
        assert_eq!(progress.graph().progress(), 64);
    }

    #[test]
    fn unloaded_or_missing_track_disables_bar() {
        let (session, track) = bound(loaded(50, 100));
        let mut progress = SongProgress::new(session.clone(), 10);
        progress.update();
        assert!(progress.bar().is_enabled());

        track.borrow_mut().loaded = false;
        track.borrow_mut().current = Duration::from_secs(90);
        progress.update();
        assert!(!progress.bar().is_enabled());
        assert_eq!(progress.bar().position(), 0.5);

        session.unbind();
        progress.update();
        assert!(!progress.bar().is_enabled());
    }

    #[test]
    fn zero_length_track_is_not_ready() {
        let (session, _track) = bound(loaded(0, 0));
        let mut progress = SongProgress::new(session, 10);
        progress.update();
        assert!(!progress.bar().is_enabled());
        assert_eq!(progress.fraction(), None);
    }

    #[test]
    fn newly_bound_track_is_picked_up_next_tick() {
        let (session, _old) = bound(loaded(10, 100));
        let mut progress = SongProgress::new(session.clone(), 100);
        progress.update();
        assert_eq!(progress.graph().progress(), 10);

        session.bind(Rc::new(RefCell::new(loaded(50, 100))));
        progress.update();
        assert_eq!(progress.graph().progress(), 50);
    }

    #[test]
    fn seek_moves_and_always_resumes() {
        let (session, track) = bound(loaded(0, 200));
        let mut progress = SongProgress::new(session, 100);
        assert!(!track.borrow().is_running());

        progress.seek(0.5);
        let t = track.borrow();
        assert_eq!(t.seeks, vec![Duration::from_secs(100)]);
        assert_eq!(t.starts, 1);
        assert!(t.is_running());
    }

    #[test]
    fn press_seeks_only_when_enabled_and_on_the_bar() {
        let (session, track) = bound(loaded(0, 200));
        let mut progress = SongProgress::new(session, 100);

        // Not enabled until the first update.
        assert!(!progress.handle_press(400.0, 715.0, 800.0, 720.0));
        progress.update();
        assert!(!progress.handle_press(400.0, 10.0, 800.0, 720.0));
        assert!(progress.handle_press(200.0, 715.0, 800.0, 720.0));
        assert_eq!(track.borrow().seeks, vec![Duration::from_secs(50)]);
    }

    #[test]
    fn graph_values_are_resampled_to_columns() {
        let mut graph = SongProgressGraph::new(4);
        graph.set_values(&[0.0, 1.0, 0.5, 0.5, 1.0, 1.0, 0.25, 0.75]);
        assert_eq!(graph.values(), &[0.5, 0.5, 1.0, 0.5]);

        graph.set_values(&[0.5]);
        assert_eq!(graph.values(), &[0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn build_emits_columns_bar_and_handle() {
        let (session, _track) = bound(loaded(50, 100));
        let mut progress = SongProgress::new(session, 8);
        progress.update();
        let actors = progress.build(800.0, 600.0);
        assert_eq!(actors.len(), 8 + 3);

        let lit = actors
            .iter()
            .filter(|a| matches!(a, Actor::Quad { color, z: 1, .. } if *color == GLOW_COLOUR))
            .count();
        assert_eq!(lit, 4);
    }
}
