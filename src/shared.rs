use crate::core::QueueEngine;
use crate::events::{SubscriberId, Subscription};
use crate::model::{MediaItem, Playlist, RepeatMode};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Read-only view of the engine as of the last committed update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueSnapshot {
    pub queue: Vec<MediaItem>,
    pub cursor: Option<usize>,
    pub current_item: Option<MediaItem>,
    pub history: Vec<MediaItem>,
    pub playlists: Vec<Playlist>,
    pub current_playlist: Option<String>,
    pub repeat_mode: RepeatMode,
    pub shuffle_on: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl QueueSnapshot {
    pub fn capture(engine: &QueueEngine) -> Self {
        Self {
            queue: engine.queue().to_vec(),
            cursor: engine.cursor(),
            current_item: engine.current_item().cloned(),
            history: engine.history().to_vec(),
            playlists: engine.playlists().cloned().collect(),
            current_playlist: engine.current_playlist_id().map(str::to_string),
            repeat_mode: engine.repeat_mode(),
            shuffle_on: engine.shuffle_on(),
            has_next: engine.has_next(),
            has_previous: engine.has_previous(),
        }
    }
}

/// Cloneable handle that funnels every mutation through one lock and serves
/// readers from the last published snapshot.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    engine: Arc<Mutex<QueueEngine>>,
    published: Arc<RwLock<Arc<QueueSnapshot>>>,
}

impl SharedEngine {
    pub fn new(engine: QueueEngine) -> Self {
        let snapshot = Arc::new(QueueSnapshot::capture(&engine));
        Self {
            engine: Arc::new(Mutex::new(engine)),
            published: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Applies one operation and publishes the resulting state before the
    /// writer lock is released.
    pub fn update<R>(&self, op: impl FnOnce(&mut QueueEngine) -> R) -> R {
        let mut engine = self.writer();
        let out = op(&mut *engine);
        let snapshot = Arc::new(QueueSnapshot::capture(&engine));
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        out
    }

    pub fn snapshot(&self) -> Arc<QueueSnapshot> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> Subscription {
        self.writer().subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.writer().unsubscribe(id)
    }

    // Poisoning is ignored: engine methods never leave the cursor out of range.
    fn writer(&self) -> MutexGuard<'_, QueueEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::QueueEvent;
    use std::thread;

    fn item(id: &str) -> MediaItem {
        MediaItem::new(id, id)
    }

    #[test]
    fn snapshot_tracks_committed_updates() {
        let shared = SharedEngine::new(QueueEngine::with_seed(5));
        let initial = shared.snapshot();
        assert!(initial.queue.is_empty());

        shared.update(|engine| engine.set_queue(vec![item("a"), item("b")]));
        let after = shared.snapshot();
        assert_eq!(after.cursor, Some(0));
        assert!(after.has_next);
        assert!(!after.has_previous);
        assert_eq!(after.current_item.as_ref().map(|i| i.id.as_str()), Some("a"));

        // Old snapshots stay as they were.
        assert!(initial.queue.is_empty());
    }

    #[test]
    fn concurrent_writers_are_serialized() {
        let shared = SharedEngine::new(QueueEngine::with_seed(5));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for n in 0..25 {
                        shared.update(|engine| engine.add_to_queue(item(&format!("{t}-{n}"))));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.queue.len(), 100);
        assert_eq!(snapshot.cursor, Some(0));
    }

    #[test]
    fn subscribers_see_updates_through_handle() {
        let shared = SharedEngine::new(QueueEngine::with_seed(5));
        let sub = shared.subscribe();
        shared.update(|engine| engine.add_to_queue(item("a")));

        let events = sub.drain();
        assert_eq!(events[0], QueueEvent::QueueChanged { len: 1 });
        assert!(shared.unsubscribe(sub.id));
    }
}
