//! [`SaveTarget`] that writes downloads into a local directory.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::error::SaveError;
use super::{Blob, ObjectUrl, SaveTarget};
use crate::filename::{create_unique_file, extension_from_content_type};

/// How many recent paths [`DirectorySink::written_files`] remembers.
pub const MAX_TRACKED_WRITES: usize = 256;

/// Materialises saves as files under one directory.
///
/// Filenames are sanitized and de-duplicated (`report.pdf`, `report_1.pdf`,
/// ...). Opening in a target has no viewer to hand off to, so the blob is
/// written as `opened-<n><ext>` with the extension guessed from its media
/// type.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    next_id: AtomicU64,
    blobs: Mutex<HashMap<ObjectUrl, Blob>>,
    written: Mutex<VecDeque<PathBuf>>,
    written_total: AtomicU64,
}

impl DirectorySink {
    /// Creates a sink writing into `dir`, which must already exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: AtomicU64::new(1),
            blobs: Mutex::new(HashMap::new()),
            written: Mutex::new(VecDeque::new()),
            written_total: AtomicU64::new(0),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The most recent paths written (at most [`MAX_TRACKED_WRITES`]),
    /// oldest first.
    #[must_use]
    pub fn written_files(&self) -> Vec<PathBuf> {
        lock(&self.written).iter().cloned().collect()
    }

    /// Total number of files written, including those no longer tracked.
    #[must_use]
    pub fn written_count(&self) -> u64 {
        self.written_total.load(Ordering::Relaxed)
    }

    /// Number of object URLs not yet revoked.
    #[must_use]
    pub fn live_object_urls(&self) -> usize {
        lock(&self.blobs).len()
    }

    fn blob(&self, url: &ObjectUrl) -> Result<Blob, SaveError> {
        lock(&self.blobs)
            .get(url)
            .cloned()
            .ok_or_else(|| SaveError::unknown_object_url(url.as_str()))
    }

    fn write(&self, blob: &Blob, filename: &str) -> Result<PathBuf, SaveError> {
        let (path, mut file) = create_unique_file(&self.dir, filename)
            .map_err(|e| SaveError::io(self.dir.clone(), e))?;
        if let Err(e) = file.write_all(blob.data()).and_then(|()| file.flush()) {
            // Remove the partial file so the name is free for a retry.
            let _ = std::fs::remove_file(&path);
            return Err(SaveError::io(path, e));
        }

        let mut written = lock(&self.written);
        if written.len() == MAX_TRACKED_WRITES {
            written.pop_front();
        }
        written.push_back(path.clone());
        drop(written);
        self.written_total.fetch_add(1, Ordering::Relaxed);
        Ok(path)
    }
}

impl SaveTarget for DirectorySink {
    fn create_object_url(&self, blob: Blob) -> ObjectUrl {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = ObjectUrl::new(format!("blob:auth-href/{id}"));
        debug!(url = %url, bytes = blob.len(), "object URL created");
        lock(&self.blobs).insert(url.clone(), blob);
        url
    }

    fn save_as(&self, url: &ObjectUrl, filename: &str) -> Result<(), SaveError> {
        let blob = self.blob(url)?;
        let path = self.write(&blob, filename)?;
        info!(path = %path.display(), bytes = blob.len(), "download saved");
        Ok(())
    }

    fn open_in(&self, url: &ObjectUrl, target: &str) -> Result<(), SaveError> {
        let blob = self.blob(url)?;
        let id = url.as_str().rsplit('/').next().unwrap_or_default();
        let extension = blob
            .content_type()
            .map_or(".bin", extension_from_content_type);
        let path = self.write(&blob, &format!("opened-{id}{extension}"))?;
        info!(target = %target, path = %path.display(), "download opened");
        Ok(())
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        if lock(&self.blobs).remove(url).is_some() {
            debug!(url = %url, "object URL revoked");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_save_as_writes_blob_under_filename() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path());

        let url = sink.create_object_url(Blob::new(&b"PDF bytes"[..], None));
        sink.save_as(&url, "report 1.pdf").unwrap();

        let path = temp_dir.path().join("report 1.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"PDF bytes");
        assert_eq!(sink.written_files(), vec![path]);
    }

    #[test]
    fn test_save_as_deduplicates_names() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path());

        let first = sink.create_object_url(Blob::new(&b"1"[..], None));
        let second = sink.create_object_url(Blob::new(&b"2"[..], None));
        sink.save_as(&first, "a.txt").unwrap();
        sink.save_as(&second, "a.txt").unwrap();

        assert_eq!(std::fs::read(temp_dir.path().join("a.txt")).unwrap(), b"1");
        assert_eq!(std::fs::read(temp_dir.path().join("a_1.txt")).unwrap(), b"2");
    }

    #[test]
    fn test_open_in_uses_content_type_extension() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path());

        let url = sink.create_object_url(Blob::new(
            &b"%PDF"[..],
            Some("application/pdf".to_string()),
        ));
        sink.open_in(&url, "_blank").unwrap();

        let written = sink.written_files();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].extension().unwrap(), "pdf");
    }

    #[test]
    fn test_revoked_url_cannot_be_saved() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path());

        let url = sink.create_object_url(Blob::new(&b"x"[..], None));
        assert_eq!(sink.live_object_urls(), 1);
        sink.revoke_object_url(&url);
        assert_eq!(sink.live_object_urls(), 0);

        assert!(matches!(
            sink.save_as(&url, "x.bin"),
            Err(SaveError::UnknownObjectUrl { .. })
        ));
    }

    #[test]
    fn test_save_into_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path().join("missing"));

        let url = sink.create_object_url(Blob::new(&b"x"[..], None));
        assert!(matches!(
            sink.save_as(&url, "x.bin"),
            Err(SaveError::Io { .. })
        ));
    }

    #[test]
    fn test_concurrent_saves_of_same_name_never_collide() {
        const SAVERS: usize = 16;
        let temp_dir = TempDir::new().unwrap();
        let sink = Arc::new(DirectorySink::new(temp_dir.path()));
        let barrier = Arc::new(Barrier::new(SAVERS));

        let handles: Vec<_> = (0..SAVERS)
            .map(|i| {
                let sink = Arc::clone(&sink);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let url = sink.create_object_url(Blob::new(format!("body-{i}"), None));
                    barrier.wait();
                    sink.save_as(&url, "a.txt").unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let written = sink.written_files();
        let distinct: HashSet<_> = written.iter().collect();
        assert_eq!(distinct.len(), SAVERS);

        let mut bodies: Vec<String> = written
            .iter()
            .map(|path| std::fs::read_to_string(path).unwrap())
            .collect();
        bodies.sort();
        let mut expected: Vec<String> = (0..SAVERS).map(|i| format!("body-{i}")).collect();
        expected.sort();
        assert_eq!(bodies, expected);
    }

    #[test]
    fn test_written_files_keeps_only_recent_paths() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path());

        let total = MAX_TRACKED_WRITES + 4;
        for i in 0..total {
            let url = sink.create_object_url(Blob::new(&b"x"[..], None));
            sink.save_as(&url, &format!("f{i}.bin")).unwrap();
            sink.revoke_object_url(&url);
        }

        let written = sink.written_files();
        assert_eq!(written.len(), MAX_TRACKED_WRITES);
        assert_eq!(sink.written_count(), total as u64);
        assert_eq!(written[0], temp_dir.path().join("f4.bin"));
        assert_eq!(
            written.last().unwrap(),
            &temp_dir.path().join(format!("f{}.bin", total - 1))
        );
    }
}
