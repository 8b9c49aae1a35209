use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Window
pub const WINDOW_TITLE: &str = "osu!";
pub const DEFAULT_CONFIG_PATH: &str = "osu-desktop.ini";

// Song Progress
pub const BAR_HEIGHT: f32 = 5.0;
pub const GRAPH_HEIGHT: f32 = 34.0;
pub const HANDLE_SIZE: [f32; 2] = [10.0, 18.0];
pub const PROGRESS_HEIGHT: f32 = BAR_HEIGHT + GRAPH_HEIGHT + HANDLE_SIZE[1];
pub const FILL_COLOUR: [f32; 4] = [221.0 / 255.0, 1.0, 1.0, 1.0];
pub const GLOW_COLOUR: [f32; 4] = [221.0 / 255.0, 1.0, 1.0, 150.0 / 255.0];
pub const GRAPH_EMPTY_COLOUR: [f32; 4] = [1.0, 1.0, 1.0, 0.25];
pub const BAR_BACKGROUND_COLOUR: [f32; 4] = [0.0, 0.0, 0.0, 0.5];

// Version Overlay
pub const VERSION_TEXT_PX: f32 = 14.0;
pub const VERSION_TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.6];

const SECTION: &str = "Options";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub display_width: u32,
    pub display_height: u32,
    pub windowed: bool,
    pub hide_cursor: bool,
    pub graph_columns: usize,
    pub library_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_width: 1280,
            display_height: 720,
            windowed: true,
            hide_cursor: true,
            graph_columns: 100,
            library_path: PathBuf::from("songs"),
        }
    }
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

fn create_default_file(path: &Path) -> Result<(), std::io::Error> {
    info!("Config file not found, writing defaults to '{}'.", path.display());
    let default = Config::default();
    let mut conf = Ini::new_cs();
    conf.set(SECTION, "DisplayWidth", Some(default.display_width.to_string()));
    conf.set(SECTION, "DisplayHeight", Some(default.display_height.to_string()));
    conf.set(SECTION, "Windowed", Some(bool_str(default.windowed)));
    conf.set(SECTION, "HideCursor", Some(bool_str(default.hide_cursor)));
    conf.set(SECTION, "GraphColumns", Some(default.graph_columns.to_string()));
    conf.set(SECTION, "LibraryPath", Some(default.library_path.to_string_lossy().into_owned()));
    conf.write(path)
}

#[inline(always)]
fn bool_str(v: bool) -> String {
    if v { "1".to_string() } else { "0".to_string() }
}

fn parse_or<T: std::str::FromStr>(conf: &Ini, key: &str, default: T) -> T {
    match conf.get(SECTION, key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default.", raw, key);
            default
        }),
        None => default,
    }
}

fn parse_flag(conf: &Ini, key: &str, default: bool) -> bool {
    parse_or::<u8>(conf, key, u8::from(default)) != 0
}

/// Reads the ini at `path` into a `Config`, falling back to defaults key by key.
pub fn read(path: &Path) -> Config {
    let default = Config::default();
    let mut conf = Ini::new_cs();
    if let Err(e) = conf.load(path) {
        warn!("Failed to load '{}': {}. Using defaults.", path.display(), e);
        return default;
    }

    Config {
        display_width: parse_or(&conf, "DisplayWidth", default.display_width).max(1),
        display_height: parse_or(&conf, "DisplayHeight", default.display_height).max(1),
        windowed: parse_flag(&conf, "Windowed", default.windowed),
        hide_cursor: parse_flag(&conf, "HideCursor", default.hide_cursor),
        graph_columns: parse_or(&conf, "GraphColumns", default.graph_columns).max(1),
        library_path: conf
            .get(SECTION, "LibraryPath")
            .map(|p| PathBuf::from(p.trim()))
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(default.library_path),
    }
}

/// Loads the process-wide config, creating the file with defaults when missing.
pub fn load(path: &Path) {
    if !path.exists() {
        if let Err(e) = create_default_file(path) {
            warn!("Failed to create default config file: {}", e);
        }
    }
    let loaded = read(path);
    info!("Config loaded: {:?}", loaded);
    *CONFIG.lock().unwrap_or_else(|e| e.into_inner()) = loaded;
}

/// Applies an in-place change to the process-wide config.
pub fn update(f: impl FnOnce(&mut Config)) {
    f(&mut CONFIG.lock().unwrap_or_else(|e| e.into_inner()));
}

/// Returns a copy of the current config.
pub fn get() -> Config {
    CONFIG.lock().unwrap_or_else(|e| e.into_inner()).clone()
}
