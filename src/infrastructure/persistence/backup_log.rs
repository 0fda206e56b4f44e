//! Append-only JSON-lines log backing the in-memory repository.
//!
//! Each line is one serialized [`BackupEvent`]. The file is only ever appended to;
//! on startup it is read back in full and replayed in order. There is no compaction,
//! so replay time grows linearly with the number of writes ever made.
//!
//! A record counts only once its terminating newline is on disk. An unterminated tail
//! left by a crash is cut off when the log is opened, and a failed append truncates
//! the file back to its previous length.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::backup_event::BackupEvent;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("backup log I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode backup event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<BackupError> for AppError {
    fn from(e: BackupError) -> Self {
        tracing::error!(error = %e, "Backup log failure");
        AppError::internal("Failed to write backup log", json!({}))
    }
}

/// Handle to an open backup log file.
#[derive(Debug)]
pub struct BackupLog {
    path: PathBuf,
    file: File,
}

impl BackupLog {
    /// Opens the log for appending, creating the file and its parent directories
    /// if they do not exist.
    ///
    /// A partial last record is truncated away before anything new is appended.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] if the directory or file cannot be created, or a
    /// torn tail cannot be removed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackupError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| BackupError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let io_err = |source| BackupError::Io {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        let len = file.metadata().map_err(io_err)?.len();
        let complete = complete_len(&mut file, len).map_err(io_err)?;
        if complete < len {
            warn!(
                path = %path.display(),
                dropped_bytes = len - complete,
                "Truncating unterminated backup record"
            );
            file.set_len(complete).map_err(io_err)?;
            file.sync_data().map_err(io_err)?;
        }

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every event from the start of the file, in file order.
    ///
    /// Blank lines are ignored. Lines that do not parse are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] if the file cannot be read.
    pub fn replay(&self) -> Result<Vec<BackupEvent>, BackupError> {
        let io_err = |source| BackupError::Io {
            path: self.path.clone(),
            source,
        };

        let reader = BufReader::new(File::open(&self.path).map_err(io_err)?);
        let mut events = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<BackupEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed backup record"
                ),
            }
        }

        debug!(path = %self.path.display(), events = events.len(), "Backup log read");
        Ok(events)
    }

    /// Appends one event and syncs it to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or written.
    pub fn append(&mut self, event: &BackupEvent) -> Result<(), BackupError> {
        self.append_all(std::slice::from_ref(event))
    }

    /// Appends several events with a single write and syncs them to disk.
    ///
    /// Nothing is written if any event fails to encode. If the write or the sync
    /// fails, the file is cut back to its length before the call.
    ///
    /// # Errors
    ///
    /// Returns an error if an event cannot be encoded or the write fails.
    pub fn append_all(&mut self, events: &[BackupEvent]) -> Result<(), BackupError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }

        let io_err = |source| BackupError::Io {
            path: self.path.clone(),
            source,
        };

        let start = self.file.metadata().map_err(io_err)?.len();

        let written = self
            .file
            .write_all(&buf)
            .and_then(|()| self.file.flush())
            .and_then(|()| self.file.sync_data());

        if let Err(source) = written {
            if let Err(e) = self.file.set_len(start) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to roll back partial backup append"
                );
            }
            return Err(io_err(source));
        }

        Ok(())
    }

    /// Wraps a file that rejects writes, for exercising failure paths.
    #[cfg(test)]
    pub(crate) fn read_only(path: impl AsRef<Path>) -> Result<Self, BackupError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| BackupError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }
}

/// Length of the prefix of `file` that ends in a newline, or 0 if there is none.
fn complete_len(file: &mut File, len: u64) -> std::io::Result<u64> {
    const CHUNK: u64 = 4096;

    let mut end = len;
    let mut buf = [0u8; CHUNK as usize];
    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;

        if let Some(pos) = chunk.iter().rposition(|b| *b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OwnerId;
    use std::io::Write as _;

    fn event(code: &str, url: &str) -> BackupEvent {
        BackupEvent::created(code, url, &OwnerId::from("owner"))
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/backup.json");

        let log = BackupLog::open(&path).unwrap();

        assert!(path.exists());
        assert!(log.replay().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_replay_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut log = BackupLog::open(&path).unwrap();
        log.append(&event("a", "https://a.com")).unwrap();
        log.append(&event("b", "https://b.com")).unwrap();
        drop(log);

        let reopened = BackupLog::open(&path).unwrap();
        let events = reopened.replay().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].short_url, "a");
        assert_eq!(events[1].short_url, "b");
    }

    #[test]
    fn test_append_all_writes_each_event_on_its_own_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut log = BackupLog::open(&path).unwrap();
        log.append_all(&[event("a", "https://a.com"), event("b", "https://b.com")])
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_replay_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        {
            let mut file = File::create(&path).unwrap();
            writeln!(
                file,
                r#"{{"short_url":"a","original_url":"https://a.com","user_id":"u"}}"#
            )
            .unwrap();
            writeln!(file, "not json").unwrap();
            writeln!(file).unwrap();
            writeln!(
                file,
                r#"{{"short_url":"b","original_url":"https://b.com","user_id":"u"}}"#
            )
            .unwrap();
        }

        let log = BackupLog::open(&path).unwrap();
        let events = log.replay().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].short_url, "b");
    }

    #[test]
    fn test_append_fails_on_read_only_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        File::create(&path).unwrap();

        let mut log = BackupLog::read_only(&path).unwrap();
        let result = log.append(&event("a", "https://a.com"));

        assert!(matches!(result, Err(BackupError::Io { .. })));
    }

    #[test]
    fn test_open_cuts_unterminated_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        fs::write(
            &path,
            concat!(
                r#"{"short_url":"a","original_url":"https://a.com","user_id":"u"}"#,
                "\n",
                r#"{"short_url":"b","orig"#,
            ),
        )
        .unwrap();

        let mut log = BackupLog::open(&path).unwrap();
        log.append(&event("c", "https://c.com")).unwrap();

        let codes: Vec<_> = log
            .replay()
            .unwrap()
            .into_iter()
            .map(|e| e.short_url)
            .collect();
        assert_eq!(codes, vec!["a", "c"]);
    }

    #[test]
    fn test_open_drops_tail_without_any_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        fs::write(&path, r#"{"short_url":"c0","orig"#).unwrap();

        let mut log = BackupLog::open(&path).unwrap();
        log.append(&event("c1", "https://a.com")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(r#"{"short_url":"c1""#));
        assert_eq!(log.replay().unwrap().len(), 1);
    }

    #[test]
    fn test_open_keeps_complete_log_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut log = BackupLog::open(&path).unwrap();
        log.append(&event("a", "https://a.com")).unwrap();
        let before = fs::read(&path).unwrap();
        drop(log);

        BackupLog::open(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
