//! Change detection for watched files.
//!
//! Every comparator snapshots its files on construction and answers one
//! question: have they changed since the last call?

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait Comparator: Send {
    /// True when any watched file changed since the previous call. Updates
    /// the stored snapshot, so an unchanged file reports `false` next time.
    fn has_changed(&mut self) -> bool;
}

/// Comparison value for one file. `None` marks a failed stat, which
/// differs from every real timestamp.
pub type CompareValue = Option<SystemTime>;

pub type CompareFunc = Arc<dyn Fn(&Path) -> CompareValue + Send + Sync>;

/// A modification time lookup that reports stat failures to `err_logger`
/// before falling back to `None`.
pub fn build_compare_func<L>(err_logger: Option<L>) -> CompareFunc
where
    L: Fn(&Path) + Send + Sync + 'static,
{
    Arc::new(move |path: &Path| match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => Some(mtime),
        Err(e) => {
            match &err_logger {
                Some(log) => log(path),
                None => warn!(path = %path.display(), error = %e, "Failed to stat watched file"),
            }
            None
        }
    })
}

/// Compares modification times.
///
/// Timestamps only move as fast as the filesystem's resolution, so two
/// writes inside one tick (one second on some filesystems) look like one.
/// Pair with [`Md5Comparator`] when that matters.
pub struct MTimeComparator {
    compare_func: CompareFunc,
    mtimes: Vec<(PathBuf, CompareValue)>,
}

impl MTimeComparator {
    pub fn new(filenames: &[PathBuf]) -> Self {
        Self::with_compare_func(filenames, build_compare_func(None::<fn(&Path)>))
    }

    pub fn with_compare_func(filenames: &[PathBuf], compare_func: CompareFunc) -> Self {
        let mtimes = filenames
            .iter()
            .map(|path| (path.clone(), compare_func(path)))
            .collect();
        Self {
            compare_func,
            mtimes,
        }
    }
}

impl Comparator for MTimeComparator {
    fn has_changed(&mut self) -> bool {
        for (path, last) in &mut self.mtimes {
            let current = (self.compare_func)(path);
            if current != *last {
                *last = current;
                return true;
            }
        }
        false
    }
}

#[cfg(unix)]
fn file_identity(path: &Path) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;

    match fs::metadata(path) {
        Ok(meta) => Some((meta.dev(), meta.ino())),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to stat watched file");
            None
        }
    }
}

// No stable device/inode pair off unix; identity never changes there.
#[cfg(not(unix))]
fn file_identity(_path: &Path) -> Option<(u64, u64)> {
    None
}

/// Compares `(device, inode)` pairs, catching files replaced by rename.
pub struct InodeComparator {
    filenames: Vec<PathBuf>,
    inodes: Vec<Option<(u64, u64)>>,
}

impl InodeComparator {
    pub fn new(filenames: &[PathBuf]) -> Self {
        let filenames = filenames.to_vec();
        let inodes = Self::snapshot(&filenames);
        Self { filenames, inodes }
    }

    fn snapshot(filenames: &[PathBuf]) -> Vec<Option<(u64, u64)>> {
        filenames.iter().map(|path| file_identity(path)).collect()
    }
}

impl Comparator for InodeComparator {
    fn has_changed(&mut self) -> bool {
        let current = Self::snapshot(&self.filenames);
        let changed = current != self.inodes;
        self.inodes = current;
        changed
    }
}

/// Compares MD5 digests of the full file contents. Slowest, but blind to
/// metadata-only changes and timestamp resolution.
pub struct Md5Comparator {
    filenames: Vec<PathBuf>,
    digests: Vec<Option<Vec<u8>>>,
}

impl Md5Comparator {
    pub fn new(filenames: &[PathBuf]) -> Self {
        let filenames = filenames.to_vec();
        let digests = Self::snapshot(&filenames);
        Self { filenames, digests }
    }

    fn digest(path: &Path) -> Option<Vec<u8>> {
        match fs::read(path) {
            Ok(contents) => {
                let mut hasher = Md5::new();
                hasher.update(&contents);
                Some(hasher.finalize().to_vec())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read watched file");
                None
            }
        }
    }

    fn snapshot(filenames: &[PathBuf]) -> Vec<Option<Vec<u8>>> {
        filenames.iter().map(|path| Self::digest(path)).collect()
    }
}

impl Comparator for Md5Comparator {
    fn has_changed(&mut self) -> bool {
        let current = Self::snapshot(&self.filenames);
        let changed = current != self.digests;
        self.digests = current;
        changed
    }
}

/// Comparator names as they appear in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparatorKind {
    Inode,
    Mtime,
    Md5,
}

impl ComparatorKind {
    pub fn build(self, filenames: &[PathBuf]) -> Box<dyn Comparator> {
        match self {
            Self::Inode => Box::new(InodeComparator::new(filenames)),
            Self::Mtime => Box::new(MTimeComparator::new(filenames)),
            Self::Md5 => Box::new(Md5Comparator::new(filenames)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn watched_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn bump_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_mtime_comparator() {
        let dir = TempDir::new().unwrap();
        let a = watched_file(&dir, "a.yaml", "a: 1");
        let b = watched_file(&dir, "b.yaml", "b: 1");
        let mut comparator = MTimeComparator::new(&[a.clone(), b.clone()]);

        assert!(!comparator.has_changed());
        assert!(!comparator.has_changed());

        bump_mtime(&b, 10);
        assert!(comparator.has_changed());
        assert!(!comparator.has_changed());

        // Both changed: the first call stops at `a`, the next one sees `b`.
        bump_mtime(&a, 20);
        bump_mtime(&b, 20);
        assert!(comparator.has_changed());
        assert!(comparator.has_changed());
        assert!(!comparator.has_changed());
    }

    #[test]
    fn test_mtime_comparator_stat_failure() {
        let dir = TempDir::new().unwrap();
        let path = watched_file(&dir, "gone.yaml", "a: 1");
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let compare_func = build_compare_func(Some(move |_: &Path| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let mut comparator = MTimeComparator::with_compare_func(&[path.clone()], compare_func);

        fs::remove_file(&path).unwrap();
        assert!(comparator.has_changed());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(!comparator.has_changed());

        fs::write(&path, "a: 2").unwrap();
        assert!(comparator.has_changed());
    }

    #[cfg(unix)]
    #[test]
    fn test_inode_comparator_detects_replacement() {
        let dir = TempDir::new().unwrap();
        let path = watched_file(&dir, "config.yaml", "a: 1");
        let mut comparator = InodeComparator::new(&[path.clone()]);
        assert!(!comparator.has_changed());

        // Keep the old file alive so its inode is not reused.
        let old = dir.path().join("config.yaml.old");
        fs::rename(&path, &old).unwrap();
        let replacement = watched_file(&dir, "config.yaml.new", "a: 2");
        fs::rename(&replacement, &path).unwrap();

        assert!(comparator.has_changed());
        assert!(!comparator.has_changed());
    }

    #[test]
    fn test_md5_comparator_ignores_metadata() {
        let dir = TempDir::new().unwrap();
        let path = watched_file(&dir, "config.yaml", "a: 1");
        let mut comparator = Md5Comparator::new(&[path.clone()]);

        bump_mtime(&path, 10);
        assert!(!comparator.has_changed());

        fs::write(&path, "a: 2").unwrap();
        assert!(comparator.has_changed());
        assert!(!comparator.has_changed());
    }

    #[test]
    fn test_comparator_kind_from_settings() {
        let kinds: Vec<ComparatorKind> = serde_json::from_str(r#"["inode", "mtime", "md5"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![ComparatorKind::Inode, ComparatorKind::Mtime, ComparatorKind::Md5]
        );

        let dir = TempDir::new().unwrap();
        let path = watched_file(&dir, "config.yaml", "a: 1");
        for kind in kinds {
            assert!(!kind.build(&[path.clone()]).has_changed());
        }
    }
}
