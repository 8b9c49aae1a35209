use crate::core::scheduler::{UiScheduler, UiTask};
use crate::gameplay::beatmaps::{BeatmapManager, ImportError, ImportOutcome};
use crate::gameplay::replay::{self, ReplayError, Score};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    BeatmapArchive,
    ReplayFile,
    Unrecognized,
}

/// Case-sensitive extension match: `song.osz` is an archive, `song.OSZ` is not.
pub fn classify(path: &Path) -> DropKind {
    match path.extension() {
        Some(ext) if ext == "osz" => DropKind::BeatmapArchive,
        Some(ext) if ext == "osr" => DropKind::ReplayFile,
        _ => DropKind::Unrecognized,
    }
}

pub trait BeatmapImporter: Send + Sync {
    fn import(&self, path: &Path) -> Result<ImportOutcome, ImportError>;
}

impl BeatmapImporter for BeatmapManager {
    fn import(&self, path: &Path) -> Result<ImportOutcome, ImportError> {
        BeatmapManager::import(self, path)
    }
}

pub trait ReplayReader: Send + Sync {
    fn read_replay(&self, path: &Path) -> Result<Score, ReplayError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReplayFileReader;

impl ReplayReader for ReplayFileReader {
    fn read_replay(&self, path: &Path) -> Result<Score, ReplayError> {
        replay::read_replay_file(path)
    }
}

/// Routes dropped files to background work. Never blocks the caller.
pub struct FileDropDispatcher {
    importer: Arc<dyn BeatmapImporter>,
    replays: Arc<dyn ReplayReader>,
    scheduler: UiScheduler,
}

impl FileDropDispatcher {
    pub fn new(importer: Arc<dyn BeatmapImporter>, replays: Arc<dyn ReplayReader>, scheduler: UiScheduler) -> Self {
        Self { importer, replays, scheduler }
    }

    pub fn on_file_dropped(&self, path: &Path) -> DropKind {
        let kind = classify(path);
        match kind {
            DropKind::BeatmapArchive => {
                let importer = Arc::clone(&self.importer);
                let path = path.to_path_buf();
                spawn("beatmap-import", move || match importer.import(&path) {
                    Ok(ImportOutcome::Imported(stored)) => {
                        debug!("Import of '{}' stored at '{}'.", path.display(), stored.display())
                    }
                    Ok(ImportOutcome::AlreadyImported(stored)) => {
                        debug!("Import of '{}' skipped, already at '{}'.", path.display(), stored.display())
                    }
                    Err(e) => warn!("Failed to import '{}': {}", path.display(), e),
                });
            }
            DropKind::ReplayFile => {
                let replays = Arc::clone(&self.replays);
                let scheduler = self.scheduler.clone();
                let path = path.to_path_buf();
                spawn("replay-read", move || match replays.read_replay(&path) {
                    Ok(score) => {
                        if !scheduler.schedule(UiTask::LoadScore(score)) {
                            debug!("UI queue closed before replay '{}' was loaded.", path.display());
                        }
                    }
                    Err(e) => warn!("Failed to read replay '{}': {}", path.display(), e),
                });
            }
            DropKind::Unrecognized => {
                debug!("Ignoring dropped file '{}'.", path.display());
            }
        }
        kind
    }

    pub fn on_files_dropped(&self, paths: &[PathBuf]) {
        for path in paths {
            match self.on_file_dropped(path) {
                DropKind::Unrecognized => {}
                kind => info!("Dispatching '{}' as {:?}.", path.display(), kind),
            }
        }
    }
}

fn spawn(name: &str, f: impl FnOnce() + Send + 'static) {
    if let Err(e) = thread::Builder::new().name(name.to_string()).spawn(f) {
        warn!("Failed to spawn {} thread: {}", name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::ui_channel;
    use crate::gameplay::replay::{decode, tests::sample_replay};
    use std::sync::Mutex;
    use std::sync::mpsc::{Receiver, Sender, channel};
    use std::time::{Duration, Instant};

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Blocks inside `import` until the test releases it.
    struct GatedImporter {
        gate: Mutex<Receiver<()>>,
        calls: Sender<PathBuf>,
    }

    impl BeatmapImporter for GatedImporter {
        fn import(&self, path: &Path) -> Result<ImportOutcome, ImportError> {
            let _ = self.gate.lock().unwrap().recv_timeout(TIMEOUT);
            self.calls.send(path.to_path_buf()).unwrap();
            Ok(ImportOutcome::Imported(path.to_path_buf()))
        }
    }

    struct CountingImporter(Mutex<usize>);

    impl BeatmapImporter for CountingImporter {
        fn import(&self, path: &Path) -> Result<ImportOutcome, ImportError> {
            *self.0.lock().unwrap() += 1;
            Ok(ImportOutcome::Imported(path.to_path_buf()))
        }
    }

    struct FixedReplayReader {
        calls: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl ReplayReader for FixedReplayReader {
        fn read_replay(&self, path: &Path) -> Result<Score, ReplayError> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            if self.fail {
                return Err(ReplayError::Truncated("ruleset"));
            }
            Ok(decode(&sample_replay("dropper", "0|1,90000|1", true)).unwrap())
        }
    }

    fn reader(fail: bool) -> Arc<FixedReplayReader> {
        Arc::new(FixedReplayReader { calls: Mutex::new(Vec::new()), fail })
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert_eq!(classify(Path::new("song.osz")), DropKind::BeatmapArchive);
        assert_eq!(classify(Path::new("/a/b/replay.osr")), DropKind::ReplayFile);
        assert_eq!(classify(Path::new("song.OSZ")), DropKind::Unrecognized);
        assert_eq!(classify(Path::new("notes.txt")), DropKind::Unrecognized);
        assert_eq!(classify(Path::new("osz")), DropKind::Unrecognized);
        assert_eq!(classify(Path::new("archive.osz.bak")), DropKind::Unrecognized);
    }

    #[test]
    fn archive_drop_hands_off_once_without_blocking() {
        let (release, gate) = channel();
        let (calls_tx, calls_rx) = channel();
        let importer = Arc::new(GatedImporter { gate: Mutex::new(gate), calls: calls_tx });
        let (scheduler, queue) = ui_channel();
        let dispatcher = FileDropDispatcher::new(importer, reader(false), scheduler);

        // The importer is still parked on the gate when this returns.
        let kind = dispatcher.on_file_dropped(Path::new("song.osz"));
        assert_eq!(kind, DropKind::BeatmapArchive);
        assert!(calls_rx.try_recv().is_err());

        release.send(()).unwrap();
        assert_eq!(calls_rx.recv_timeout(TIMEOUT).unwrap(), PathBuf::from("song.osz"));
        assert!(calls_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn replay_drop_schedules_score_load() {
        let importer = Arc::new(CountingImporter(Mutex::new(0)));
        let replays = reader(false);
        let (scheduler, queue) = ui_channel();
        let dispatcher = FileDropDispatcher::new(importer.clone(), replays.clone(), scheduler);

        assert_eq!(dispatcher.on_file_dropped(Path::new("replay.osr")), DropKind::ReplayFile);

        let deadline = Instant::now() + TIMEOUT;
        let task = loop {
            if let Some(task) = queue.drain().next() {
                break task;
            }
            assert!(Instant::now() < deadline, "score load was never scheduled");
            thread::sleep(Duration::from_millis(5));
        };
        let UiTask::LoadScore(score) = task;
        assert_eq!(score.player.as_deref(), Some("dropper"));
        assert_eq!(*replays.calls.lock().unwrap(), vec![PathBuf::from("replay.osr")]);
        assert_eq!(*importer.0.lock().unwrap(), 0);
    }

    #[test]
    fn unreadable_replay_schedules_nothing() {
        let replays = reader(true);
        let (scheduler, queue) = ui_channel();
        let dispatcher = FileDropDispatcher::new(Arc::new(CountingImporter(Mutex::new(0))), replays.clone(), scheduler);

        dispatcher.on_file_dropped(Path::new("broken.osr"));
        let deadline = Instant::now() + TIMEOUT;
        while replays.calls.lock().unwrap().is_empty() {
            assert!(Instant::now() < deadline, "replay was never read");
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn cli_files_skip_unrecognized_and_dispatch_the_rest() {
        let importer = Arc::new(CountingImporter(Mutex::new(0)));
        let replays = reader(false);
        let (scheduler, queue) = ui_channel();
        let dispatcher = FileDropDispatcher::new(importer.clone(), replays.clone(), scheduler);

        dispatcher.on_files_dropped(&[PathBuf::from("notes.txt"), PathBuf::from("replay.osr")]);

        let deadline = Instant::now() + TIMEOUT;
        while queue.drain().next().is_none() {
            assert!(Instant::now() < deadline, "score load was never scheduled");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*replays.calls.lock().unwrap(), vec![PathBuf::from("replay.osr")]);
        assert_eq!(*importer.0.lock().unwrap(), 0);
    }

    #[test]
    fn unrecognized_drop_triggers_nothing() {
        let importer = Arc::new(CountingImporter(Mutex::new(0)));
        let replays = reader(false);
        let (scheduler, queue) = ui_channel();
        let dispatcher = FileDropDispatcher::new(importer.clone(), replays.clone(), scheduler);

        assert_eq!(dispatcher.on_file_dropped(Path::new("notes.txt")), DropKind::Unrecognized);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(*importer.0.lock().unwrap(), 0);
        assert!(replays.calls.lock().unwrap().is_empty());
        assert_eq!(queue.drain().count(), 0);
    }
}
