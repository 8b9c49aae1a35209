//! Locating an osu!stable install whose Songs folder can be reused.
//!
//! Probing is best-effort: every step that can fail is folded into `None`,
//! and an absent install is the normal state on most machines.

use crate::core::registry::{HandlerRegistry, SystemRegistry};
use log::{debug, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const PROTOCOL: &str = "osu";
const EXECUTABLE: &str = "osu!.exe";
const LOCAL_APP_DATA_DIR: &str = "osu!";
const USER_PROFILE_DIR: &str = ".osu";
const SONGS_DIR: &str = "Songs";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateSource {
    Registry,
    LocalAppData,
    UserProfile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub source: CandidateSource,
    pub path: PathBuf,
}

/// A candidate counts as an install iff it has a `Songs` subdirectory.
#[inline(always)]
pub fn is_install(path: &Path) -> bool {
    path.join(SONGS_DIR).is_dir()
}

/// Pulls the install directory out of a handler command such as
/// `"C:\osu!\osu!.exe" "%1"`.
pub fn install_dir_from_command(command: &str) -> Option<PathBuf> {
    let executable = command.split('"').nth(1)?;
    let dir = executable.replace(EXECUTABLE, "");
    if dir.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(dir))
}

pub struct LegacyInstallResolver<R> {
    registry: R,
    local_app_data: Option<PathBuf>,
    user_profile: Option<PathBuf>,
}

impl LegacyInstallResolver<SystemRegistry> {
    pub fn system() -> Self {
        Self::new(SystemRegistry, dirs::data_local_dir(), dirs::home_dir())
    }
}

impl<R: HandlerRegistry> LegacyInstallResolver<R> {
    pub fn new(registry: R, local_app_data: Option<PathBuf>, user_profile: Option<PathBuf>) -> Self {
        Self { registry, local_app_data, user_profile }
    }

    /// Candidate directories in priority order. Unavailable sources are skipped.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(3);
        if let Some(path) = self.registry.open_command(PROTOCOL).as_deref().and_then(install_dir_from_command) {
            out.push(Candidate { source: CandidateSource::Registry, path });
        }
        if let Some(base) = &self.local_app_data {
            out.push(Candidate { source: CandidateSource::LocalAppData, path: base.join(LOCAL_APP_DATA_DIR) });
        }
        if let Some(base) = &self.user_profile {
            out.push(Candidate { source: CandidateSource::UserProfile, path: base.join(USER_PROFILE_DIR) });
        }
        out
    }

    /// Returns the first candidate with a `Songs` folder. Never fails.
    pub fn try_resolve(&self) -> Option<PathBuf> {
        for candidate in self.candidates() {
            if is_install(&candidate.path) {
                info!("Found osu!stable install via {:?}: {}", candidate.source, candidate.path.display());
                return Some(candidate.path);
            }
            debug!("Rejected {:?} candidate '{}' (no {} folder).", candidate.source, candidate.path.display(), SONGS_DIR);
        }
        debug!("No osu!stable install found.");
        None
    }
}

/// Read access to a located osu!stable install.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableStorage {
    base: PathBuf,
}

impl StableStorage {
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub fn songs_path(&self) -> PathBuf {
        self.base.join(SONGS_DIR)
    }
}

static STABLE_INSTALL: OnceCell<Option<PathBuf>> = OnceCell::new();

/// The stable install for this process, probed on first call only.
pub fn storage_for_stable_install() -> Option<StableStorage> {
    cached(&STABLE_INSTALL, || LegacyInstallResolver::system().try_resolve())
}

fn cached(cell: &OnceCell<Option<PathBuf>>, resolve: impl FnOnce() -> Option<PathBuf>) -> Option<StableStorage> {
    cell.get_or_init(resolve).clone().map(|base| StableStorage { base })
}
