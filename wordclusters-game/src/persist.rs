//! Debounced profile persistence
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use tokio::task::{self, JoinHandle};

use crate::FileService;
use crate::profile::PlayerProfile;

/// Well-known logical path of the persisted player profile.
pub const PLAYER_PROFILE_PATH: &str = "player_profile.json";

/// Error surfaced through a deferred save task's join handle.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to serialize player profile: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write player profile: {0}")]
    Write(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coalesces save requests issued within one scheduler tick into a single
/// serialize-and-write of the shared profile.
///
/// The profile handle is read-only from this side; mutation stays with the
/// owning [`ProfileStore`](crate::store::ProfileStore).
pub struct DebouncedSaver<S> {
    profile: Rc<RefCell<PlayerProfile>>,
    file_service: Rc<S>,
    path: String,
    pending: Rc<Cell<bool>>,
}

impl<S: FileService + 'static> DebouncedSaver<S> {
    pub(crate) fn new(
        profile: Rc<RefCell<PlayerProfile>>,
        file_service: Rc<S>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            file_service,
            path: path.into(),
            pending: Rc::new(Cell::new(false)),
        }
    }

    /// Schedule a save for the next cooperative yield point.
    ///
    /// Returns `None` when a save is already pending; the call is absorbed
    /// by the scheduled one, which serializes whatever the profile holds at
    /// the moment it actually runs. The returned handle resolves to the
    /// outcome of the deferred serialize-and-write; there is no retry and
    /// no way to cancel. A failed write never blocks later requests: the
    /// pending flag is cleared before the write is attempted.
    ///
    /// # Panics
    ///
    /// Panics if called outside a [`tokio::task::LocalSet`] running on a
    /// current-thread runtime.
    pub fn request_save(&self) -> Option<JoinHandle<Result<(), SaveError>>> {
        if self.pending.get() {
            return None;
        }
        self.pending.set(true);

        let pending = Rc::clone(&self.pending);
        let profile = Rc::clone(&self.profile);
        let file_service = Rc::clone(&self.file_service);
        let path = self.path.clone();
        Some(task::spawn_local(async move {
            task::yield_now().await;
            pending.set(false);

            let json = serde_json::to_string_pretty(&*profile.borrow())?;
            file_service
                .write_all_text(&path, &json)
                .map_err(|e| SaveError::Write(Box::new(e)))
        }))
    }

    /// Whether a save is scheduled but has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// [`FileService`] backed by the local filesystem, rooted at a directory.
pub struct DiskFileService {
    root: PathBuf,
}

impl DiskFileService {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl FileService for DiskFileService {
    type Error = io::Error;

    fn write_all_text(&self, path: &str, content: &str) -> Result<(), Self::Error> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, content)
    }

    fn read_all_text(&self, path: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.resolve(path)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
