pub mod beatmaps;
pub mod replay;
