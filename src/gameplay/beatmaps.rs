use log::{info, warn};
use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use twox_hash::XxHash64;

const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const ARCHIVE_EXTENSION: &str = "osz";
const PARTIAL_EXTENSION: &str = "osz.tmp";

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a zip archive: {0}")]
    NotAnArchive(PathBuf),

    #[error("I/O error importing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(PathBuf),
    AlreadyImported(PathBuf),
}

/// The local beatmap library. Archives are stored by content hash.
#[derive(Debug, Clone)]
pub struct BeatmapManager {
    library: PathBuf,
}

impl BeatmapManager {
    pub fn new(library: impl Into<PathBuf>) -> Self {
        Self { library: library.into() }
    }

    pub fn library_path(&self) -> &Path {
        &self.library
    }

    pub fn import(&self, archive: &Path) -> Result<ImportOutcome, ImportError> {
        if !archive.is_file() {
            return Err(ImportError::NotFound(archive.to_path_buf()));
        }
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| ImportError::Io { path, source }
        };

        if !has_zip_magic(archive).map_err(io_err(archive))? {
            return Err(ImportError::NotAnArchive(archive.to_path_buf()));
        }

        let hash = content_hash(archive).map_err(io_err(archive))?;
        let target = self.library.join(format!("{:016x}.{}", hash, ARCHIVE_EXTENSION));
        if target.exists() {
            if content_hash(&target).ok() == Some(hash) {
                info!("Beatmap '{}' already in library as '{}'.", archive.display(), target.display());
                return Ok(ImportOutcome::AlreadyImported(target));
            }
            warn!("Library copy '{}' does not match its hash, replacing it.", target.display());
        }

        fs::create_dir_all(&self.library).map_err(io_err(&self.library))?;
        let partial = target.with_extension(PARTIAL_EXTENSION);
        let copied = fs::copy(archive, &partial).and_then(|_| fs::rename(&partial, &target));
        if let Err(e) = copied {
            let _ = fs::remove_file(&partial);
            return Err(io_err(&target)(e));
        }
        info!("Imported beatmap '{}' -> '{}'.", archive.display(), target.display());
        Ok(ImportOutcome::Imported(target))
    }

    /// Archives currently in the library, sorted by file name.
    pub fn archives(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(&self.library)
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ARCHIVE_EXTENSION))
            .collect();
        found.sort();
        found
    }
}

fn has_zip_magic(path: &Path) -> Result<bool, io::Error> {
    let mut head = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut head) {
        Ok(()) => Ok(head == ZIP_MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Streams the file through xxHash64 without holding it in memory.
fn content_hash(path: &Path) -> Result<u64, io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = XxHash64::with_seed(0);
    let mut buffer = [0; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.write(&buffer[..bytes_read]);
    }
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_archive(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut bytes = ZIP_MAGIC.to_vec();
        bytes.extend_from_slice(body);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn imports_into_library_by_hash() {
        let src = TempDir::new().unwrap();
        let lib = TempDir::new().unwrap();
        let manager = BeatmapManager::new(lib.path().join("songs"));

        let archive = write_archive(src.path(), "song.osz", b"notes");
        let outcome = manager.import(&archive).unwrap();
        let ImportOutcome::Imported(stored) = outcome else { panic!("expected a fresh import") };
        assert!(stored.starts_with(manager.library_path()));
        assert_eq!(fs::read(&stored).unwrap(), fs::read(&archive).unwrap());
        assert_eq!(manager.archives(), vec![stored]);
    }

    #[test]
    fn same_archive_twice_is_deduplicated() {
        let src = TempDir::new().unwrap();
        let lib = TempDir::new().unwrap();
        let manager = BeatmapManager::new(lib.path());

        let a = write_archive(src.path(), "a.osz", b"same");
        let b = write_archive(src.path(), "b.osz", b"same");
        let first = manager.import(&a).unwrap();
        let second = manager.import(&b).unwrap();
        match (first, second) {
            (ImportOutcome::Imported(p1), ImportOutcome::AlreadyImported(p2)) => assert_eq!(p1, p2),
            other => panic!("unexpected outcomes: {:?}", other),
        }
        assert_eq!(manager.archives().len(), 1);
    }

    #[test]
    fn damaged_library_copy_is_replaced_on_reimport() {
        let src = TempDir::new().unwrap();
        let lib = TempDir::new().unwrap();
        let manager = BeatmapManager::new(lib.path());

        let archive = write_archive(src.path(), "song.osz", &[7u8; 4096]);
        let full = fs::read(&archive).unwrap();
        let target = lib.path().join(format!("{:016x}.osz", content_hash(&archive).unwrap()));
        fs::write(&target, &full[..10]).unwrap();

        assert_eq!(manager.import(&archive).unwrap(), ImportOutcome::Imported(target.clone()));
        assert_eq!(fs::read(&target).unwrap(), full);
        assert!(!target.with_extension(PARTIAL_EXTENSION).exists());
        assert_eq!(manager.archives(), vec![target]);
    }

    #[test]
    fn streamed_hash_matches_oneshot() {
        let src = TempDir::new().unwrap();
        let archive = write_archive(src.path(), "big.osz", &vec![3u8; 20_000]);
        assert_eq!(content_hash(&archive).unwrap(), XxHash64::oneshot(0, &fs::read(&archive).unwrap()));
    }

    #[test]
    fn rejects_missing_and_non_zip_files() {
        let src = TempDir::new().unwrap();
        let manager = BeatmapManager::new(src.path().join("lib"));

        assert!(matches!(manager.import(&src.path().join("gone.osz")), Err(ImportError::NotFound(_))));

        let bogus = src.path().join("bogus.osz");
        fs::write(&bogus, b"not a zip").unwrap();
        assert!(matches!(manager.import(&bogus), Err(ImportError::NotAnArchive(_))));
        assert!(manager.archives().is_empty());
    }
}
