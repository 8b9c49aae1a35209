use crate::core::track::{ClockTrack, Track, WorkingSession};
use crate::gameplay::replay::Score;
use crate::screens::ScreenAction;
use crate::ui::actors::{Actor, TextAlign};
use crate::ui::components::song_progress::SongProgress;
use log::info;
use std::cell::RefCell;
use std::rc::Rc;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const TEXT_PX: f32 = 20.0;
const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

pub struct State {
    pub score: Score,
    pub progress: SongProgress,
}

/// Binds a clock track spanning the replay and starts it.
pub fn init(score: Score, session: &WorkingSession, graph_columns: usize) -> State {
    let length = score.duration();
    info!(
        "Loading replay by {} ({} points, {:?}).",
        score.player.as_deref().unwrap_or("unknown player"),
        score.total_score,
        length
    );

    let track = Rc::new(RefCell::new(ClockTrack::new(length)));
    track.borrow_mut().start();
    session.bind(track);

    let mut progress = SongProgress::new(session.clone(), graph_columns);
    let health: Vec<f32> = score.life_graph.iter().map(|p| p.health).collect();
    progress.graph_mut().set_values(&health);

    State { score, progress }
}

pub fn update(state: &mut State) {
    state.progress.update();
}

pub fn handle_key_press(_state: &mut State, event: &KeyEvent) -> ScreenAction {
    if event.state != ElementState::Pressed {
        return ScreenAction::None;
    }
    match event.physical_key {
        PhysicalKey::Code(KeyCode::Escape) => ScreenAction::Back,
        _ => ScreenAction::None,
    }
}

pub fn handle_pointer_press(state: &mut State, x: f32, y: f32, window_w: f32, window_h: f32) -> bool {
    state.progress.handle_press(x, y, window_w, window_h)
}

pub fn get_actors(state: &State, window_w: f32, window_h: f32) -> Vec<Actor> {
    let s = &state.score.statistics;
    let lines = [
        state.score.player.clone().unwrap_or_else(|| "unknown player".to_string()),
        format!("{} pts  {}x", state.score.total_score, state.score.max_combo),
        format!("{} / {} / {} / {} miss", s.count_300, s.count_100, s.count_50, s.count_miss),
    ];

    let mut actors: Vec<Actor> = lines
        .into_iter()
        .enumerate()
        .map(|(i, content)| Actor::Text {
            align: [0.0, 0.0],
            offset: [16.0, 16.0 + i as f32 * (TEXT_PX + 4.0)],
            px: TEXT_PX,
            color: TEXT_COLOR,
            content,
            align_text: TextAlign::Left,
            z: 5,
        })
        .collect();
    actors.extend(state.progress.build(window_w, window_h));
    actors
}
