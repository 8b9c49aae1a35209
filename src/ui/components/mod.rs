pub mod song_progress;
pub mod version_overlay;
