//! In-memory implementation of the link repository, optionally mirrored to a
//! [`BackupLog`].
//!
//! Three indexes are kept: code to link, URL to code, and owner to the set of codes it
//! created. Writers are serialized by the lock around the log handle, so a write's
//! existence check, log append and index update happen as one step. Every write
//! reaches the log before the indexes change; if the append fails the write is
//! rejected and memory is left as it was.
//!
//! The index lock is never held across log I/O, and durable writes run on the
//! blocking pool, so readers and the async runtime never wait on an fsync.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{error, info, warn};

use super::backup_log::{BackupError, BackupLog};
use crate::domain::backup_event::BackupEvent;
use crate::domain::entities::{Link, NewLink, OwnerId, SaveOutcome, Statistics};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(Debug, Default)]
struct Index {
    links: HashMap<String, Link>,
    urls: HashMap<String, String>,
    owners: HashMap<OwnerId, BTreeSet<String>>,
}

impl Index {
    fn insert(&mut self, link: Link) {
        self.owners
            .entry(link.owner_id.clone())
            .or_default()
            .insert(link.code.clone());
        self.urls.insert(link.original_url.clone(), link.code.clone());
        self.links.insert(link.code.clone(), link);
    }

    /// Returns true if `url` is already stored.
    ///
    /// A `code` held by a different URL is a conflict.
    fn is_stored(&self, code: &str, url: &str) -> Result<bool, AppError> {
        if self.urls.contains_key(url) {
            return Ok(true);
        }
        if self.links.contains_key(code) {
            return Err(code_collision(code));
        }
        Ok(false)
    }

    fn check_batch(&self, links: &[NewLink]) -> Result<(), AppError> {
        let mut codes = HashSet::with_capacity(links.len());
        let mut urls = HashSet::with_capacity(links.len());

        for link in links {
            let repeated =
                !codes.insert(link.code.as_str()) || !urls.insert(link.original_url.as_str());
            if repeated
                || self.links.contains_key(&link.code)
                || self.urls.contains_key(&link.original_url)
            {
                return Err(AppError::conflict(
                    "URL is already shortened",
                    json!({ "code": link.code, "url": link.original_url }),
                ));
            }
        }

        Ok(())
    }

    /// Tombstones for the live links among `codes` that belong to `owner_id`, one per
    /// code.
    fn tombstones(&self, codes: &[String], owner_id: &OwnerId) -> Vec<BackupEvent> {
        let mut seen = HashSet::with_capacity(codes.len());
        codes
            .iter()
            .filter(|code| seen.insert(code.as_str()))
            .filter_map(|code| self.links.get(code))
            .filter(|link| link.owner_id == *owner_id && !link.is_deleted)
            .map(BackupEvent::deleted)
            .collect()
    }

    fn apply(&mut self, event: BackupEvent) {
        if event.is_deleted {
            match self.links.get_mut(&event.short_url) {
                Some(link) => link.is_deleted = true,
                None => warn!(code = %event.short_url, "Tombstone for unknown code in backup"),
            }
            return;
        }

        if let Some(code) = self.urls.get(&event.original_url) {
            if *code != event.short_url {
                warn!(
                    code = %event.short_url,
                    stored_code = %code,
                    "Backup record repeats a stored URL under another code, keeping the first"
                );
            }
            return;
        }

        if self.links.contains_key(&event.short_url) {
            warn!(
                code = %event.short_url,
                "Backup record collides with an earlier URL, keeping the first"
            );
            return;
        }

        self.insert(Link::new(event.short_url, event.original_url, event.user_id));
    }
}

/// Link storage held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    index: Arc<Mutex<Index>>,
    writer: Arc<Mutex<Option<BackupLog>>>,
    durable: bool,
}

impl InMemoryLinkRepository {
    /// Creates an empty repository that persists nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository mirrored to the log at `path`, replaying it first.
    ///
    /// With `None` the repository is purely in memory.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] if the log cannot be opened or read.
    pub fn open(path: Option<&Path>) -> Result<Self, BackupError> {
        match path {
            Some(path) => Self::with_log(BackupLog::open(path)?),
            None => Ok(Self::new()),
        }
    }

    /// Creates a repository from an already opened log, replaying it first.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] if the log cannot be read.
    pub fn with_log(log: BackupLog) -> Result<Self, BackupError> {
        let events = log.replay()?;
        let replayed = events.len();

        let mut index = Index::default();
        for event in events {
            index.apply(event);
        }

        info!(
            path = %log.path().display(),
            events = replayed,
            links = index.links.len(),
            "Backup log replayed"
        );

        Ok(Self {
            index: Arc::new(Mutex::new(index)),
            writer: Arc::new(Mutex::new(Some(log))),
            durable: true,
        })
    }

    /// Runs `op` with the writer lock held.
    ///
    /// With a log attached the write runs on the blocking pool, since it ends in an
    /// fsync.
    async fn write<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&Mutex<Index>, Option<&mut BackupLog>) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        if !self.durable {
            let mut log = self.writer.lock();
            return op(&*self.index, log.as_mut());
        }

        let index = Arc::clone(&self.index);
        let writer = Arc::clone(&self.writer);
        tokio::task::spawn_blocking(move || {
            let mut log = writer.lock();
            op(&*index, log.as_mut())
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Backup writer task failed");
            AppError::internal("Failed to write backup log", json!({}))
        })?
    }
}

fn code_collision(code: &str) -> AppError {
    AppError::conflict(
        "Short code is already taken by a different URL",
        json!({ "code": code }),
    )
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn save(
        &self,
        code: &str,
        original_url: &str,
        owner_id: &OwnerId,
    ) -> Result<SaveOutcome, AppError> {
        let code = code.to_string();
        let url = original_url.to_string();
        let owner_id = owner_id.clone();

        self.write(move |index, log| {
            if index.lock().is_stored(&code, &url)? {
                return Ok(SaveOutcome::Duplicate);
            }

            if let Some(log) = log {
                log.append(&BackupEvent::created(&code, &url, &owner_id))?;
            }
            index.lock().insert(Link::new(code, url, owner_id));

            Ok(SaveOutcome::Created)
        })
        .await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.index.lock().links.get(code).cloned())
    }

    async fn find_all_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Link>, AppError> {
        let index = self.index.lock();

        let Some(codes) = index.owners.get(owner_id) else {
            return Ok(Vec::new());
        };

        Ok(codes
            .iter()
            .filter_map(|code| index.links.get(code))
            .filter(|link| !link.is_deleted)
            .cloned()
            .collect())
    }

    async fn save_batch(&self, links: &[NewLink], owner_id: &OwnerId) -> Result<(), AppError> {
        let links = links.to_vec();
        let owner_id = owner_id.clone();

        self.write(move |index, log| {
            index.lock().check_batch(&links)?;

            if let Some(log) = log {
                let events: Vec<_> = links
                    .iter()
                    .map(|link| BackupEvent::created(&link.code, &link.original_url, &owner_id))
                    .collect();
                log.append_all(&events)?;
            }

            let mut index = index.lock();
            for link in links {
                index.insert(Link::new(link.code, link.original_url, owner_id.clone()));
            }

            Ok(())
        })
        .await
    }

    async fn soft_delete(&self, codes: &[String], owner_id: &OwnerId) -> Result<u64, AppError> {
        let codes = codes.to_vec();
        let owner_id = owner_id.clone();

        self.write(move |index, log| {
            let tombstones = index.lock().tombstones(&codes, &owner_id);

            if let Some(log) = log {
                log.append_all(&tombstones)?;
            }

            let mut index = index.lock();
            for tombstone in &tombstones {
                if let Some(link) = index.links.get_mut(&tombstone.short_url) {
                    link.is_deleted = true;
                }
            }

            Ok(tombstones.len() as u64)
        })
        .await
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn collect_stats(&self) -> Result<Statistics, AppError> {
        let index = self.index.lock();

        Ok(Statistics {
            urls: index.urls.len() as i64,
            users: index.owners.len() as i64,
        })
    }
}
