use crate::config::{VERSION_TEXT_COLOR, VERSION_TEXT_PX};
use crate::ui::actors::{Actor, TextAlign};

const MARGIN: f32 = 8.0;
const FADE_SECONDS: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Build name and version in the bottom-right corner, faded in when shown.
#[derive(Debug, Clone)]
pub struct VersionOverlay {
    text: String,
    state: Visibility,
    alpha: f32,
}

impl VersionOverlay {
    pub fn new(name: &str, version: &str) -> Self {
        Self { text: format!("{} v{}", name, version), state: Visibility::Hidden, alpha: 0.0 }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn set_state(&mut self, state: Visibility) {
        self.state = state;
    }

    pub fn update(&mut self, delta_time: f32) {
        let step = delta_time / FADE_SECONDS;
        self.alpha = match self.state {
            Visibility::Visible => (self.alpha + step).min(1.0),
            Visibility::Hidden => (self.alpha - step).max(0.0),
        };
    }

    pub fn build(&self, window_w: f32, window_h: f32) -> Vec<Actor> {
        if self.alpha <= 0.0 {
            return vec![];
        }
        let mut color = VERSION_TEXT_COLOR;
        color[3] *= self.alpha;
        vec![Actor::Text {
            align: [1.0, 1.0],
            offset: [window_w - MARGIN, window_h - MARGIN],
            px: VERSION_TEXT_PX,
            color,
            content: self.text.clone(),
            align_text: TextAlign::Right,
            z: 10,
        }]
    }
}
