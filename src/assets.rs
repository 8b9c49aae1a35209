use image::RgbaImage;
use log::{info, warn};
use winit::window::Icon;

pub const ICON_NAME: &str = "lazer.png";
static ICON_BYTES: &[u8] = include_bytes!("../assets/lazer.png");

/// Decodes an embedded image into RGBA8.
pub fn decode_rgba(name: &str, bytes: &[u8]) -> Result<RgbaImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("Failed to decode image {}: {}", name, e))?;
    Ok(img.to_rgba8())
}

fn icon_from_bytes(name: &str, bytes: &[u8]) -> Result<Icon, String> {
    let rgba = decode_rgba(name, bytes)?;
    let (w, h) = rgba.dimensions();
    Icon::from_rgba(rgba.into_raw(), w, h).map_err(|e| format!("Invalid icon {}: {}", name, e))
}

/// The window icon, or `None` to keep the platform default.
pub fn window_icon() -> Option<Icon> {
    match icon_from_bytes(ICON_NAME, ICON_BYTES) {
        Ok(icon) => {
            info!("Loaded window icon '{}'.", ICON_NAME);
            Some(icon)
        }
        Err(e) => {
            warn!("{}. Using the default icon.", e);
            None
        }
    }
}
