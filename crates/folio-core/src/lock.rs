use crate::config::AppConfig;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Exclusive single-writer guard for one organize root.
///
/// Backed by an OS file lock on `<root>/.folio.lock`, so it serializes
/// placements and compaction across threads as well as processes. Not
/// reentrant: never acquire it twice on the same thread.
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    /// Block until the lock for `config.organize_root` is held.
    pub fn acquire(config: &AppConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.organize_root)?;
        let path = config.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;
        debug!("Acquired root lock {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Failed to release root lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_second_holder_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::new(dir.path());
        let released = Arc::new(AtomicBool::new(false));

        let guard = RootLock::acquire(&config).unwrap();
        let handle = {
            let config = config.clone();
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let _guard = RootLock::acquire(&config).unwrap();
                released.load(Ordering::SeqCst)
            })
        };

        thread::sleep(Duration::from_millis(100));
        released.store(true, Ordering::SeqCst);
        drop(guard);

        assert!(handle.join().unwrap(), "second lock was granted while the first was held");
    }
}
