use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::rc::Rc;

use tokio::task::LocalSet;

use wordclusters_game::{
    FileService, PLAYER_PROFILE_PATH, PlayerProfile, ProfileStore, SaveError,
};

#[derive(Clone, Default)]
struct RecordingFileService {
    files: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl FileService for RecordingFileService {
    type Error = Infallible;

    fn write_all_text(&self, path: &str, content: &str) -> Result<(), Self::Error> {
        self.writes.set(self.writes.get() + 1);
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn read_all_text(&self, path: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.files.borrow().get(path).cloned())
    }
}

#[derive(Clone, Default)]
struct FlakyFileService {
    files: Rc<RefCell<HashMap<String, String>>>,
    fail_next: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl FileService for FlakyFileService {
    type Error = io::Error;

    fn write_all_text(&self, path: &str, content: &str) -> Result<(), Self::Error> {
        if self.fail_next.replace(false) {
            return Err(io::Error::other("disk full"));
        }
        self.writes.set(self.writes.get() + 1);
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn read_all_text(&self, path: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.files.borrow().get(path).cloned())
    }
}

fn written_profile(service: &RecordingFileService) -> PlayerProfile {
    let json = service
        .files
        .borrow()
        .get(PLAYER_PROFILE_PATH)
        .cloned()
        .expect("profile file written");
    PlayerProfile::from_json(&json).unwrap()
}

#[tokio::test]
async fn requests_within_one_tick_produce_one_write() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let service = RecordingFileService::default();
            let store = ProfileStore::new(PlayerProfile::default(), service.clone());

            store.add_or_update_level_progress("en-1", vec!["CA".into(), "T".into()], vec![]);
            let handle = store.save().expect("first request schedules a save");
            assert!(store.is_save_pending());
            assert!(store.save().is_none());
            assert!(store.save().is_none());

            handle.await.unwrap().unwrap();
            assert_eq!(service.writes.get(), 1);
            assert!(!store.is_save_pending());
        })
        .await;
}

#[tokio::test]
async fn deferred_write_captures_end_of_tick_state() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let service = RecordingFileService::default();
            let store = ProfileStore::new(PlayerProfile::default(), service.clone());

            store.add_or_update_level_progress("en-1", vec!["CA".into()], vec![]);
            let handle = store.save().expect("save scheduled");

            // Mutations after the request but before the tick yields ride
            // along with the scheduled write.
            store.complete_level("en-1").unwrap();
            store.set_sounds_muted(true);
            store.mark_hint_shown();

            handle.await.unwrap().unwrap();
            assert_eq!(service.writes.get(), 1);

            let written = written_profile(&service);
            assert!(written.is_sounds_muted);
            assert!(written.is_how_to_play_hint_shown);
            assert!(written.levels_progress["en-1"].is_completed);
        })
        .await;
}

#[tokio::test]
async fn a_new_request_after_the_write_schedules_again() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let service = RecordingFileService::default();
            let store = ProfileStore::new(PlayerProfile::default(), service.clone());

            store.set_sounds_muted(true);
            store.save().unwrap().await.unwrap().unwrap();

            store.set_sounds_muted(false);
            let handle = store.save().expect("pending flag cleared by the first write");
            handle.await.unwrap().unwrap();

            assert_eq!(service.writes.get(), 2);
            assert!(!written_profile(&service).is_sounds_muted);
        })
        .await;
}

#[tokio::test]
async fn failed_write_surfaces_and_does_not_block_later_saves() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let service = FlakyFileService::default();
            service.fail_next.set(true);
            let store = ProfileStore::new(PlayerProfile::default(), service.clone());

            store.set_sounds_muted(true);
            let err = store.save().unwrap().await.unwrap().unwrap_err();
            assert!(matches!(err, SaveError::Write(_)));
            assert_eq!(service.writes.get(), 0);
            assert!(!store.is_save_pending());

            // The pending flag was reset before the failed write, so the
            // next request schedules a fresh save that succeeds.
            store.save().unwrap().await.unwrap().unwrap();
            assert_eq!(service.writes.get(), 1);
            assert!(service.files.borrow().contains_key(PLAYER_PROFILE_PATH));
        })
        .await;
}
