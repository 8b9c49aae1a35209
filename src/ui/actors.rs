#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Backend-agnostic description of one thing to draw, in window pixels with a
/// top-left origin. `align` is the pivot inside the actor's own box.
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub enum Actor {
    Quad {
        align: [f32; 2],
        offset: [f32; 2],
        size: [f32; 2],
        color: [f32; 4],
        z: i16,
    },

    Text {
        align: [f32; 2],
        offset: [f32; 2],
        px: f32,
        color: [f32; 4],
        content: String,
        align_text: TextAlign,
        z: i16,
    },
}

impl Actor {
    pub fn z(&self) -> i16 {
        match self {
            Actor::Quad { z, .. } | Actor::Text { z, .. } => *z,
        }
    }
}

/// Orders actors back to front, keeping submission order for equal `z`.
pub fn sort_for_draw(actors: &mut [Actor]) {
    actors.sort_by_key(Actor::z);
}
