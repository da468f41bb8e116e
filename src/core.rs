use crate::events::{EventBus, QueueEvent, SubscriberId, Subscription};
use crate::history::PlayHistory;
use crate::model::{MediaItem, PersistedState, Playlist, PlaylistPatch, RepeatMode};
use crate::playlists::PlaylistRegistry;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// The playback queue with its cursor, play history, playlist registry and
/// shuffle/repeat modes.
///
/// Every method runs to completion and leaves the cursor within range:
/// `None` exactly when the queue is empty, otherwise `< queue.len()`.
#[derive(Debug)]
pub struct QueueEngine {
    queue: Vec<MediaItem>,
    cursor: Option<usize>,
    history: PlayHistory,
    playlists: PlaylistRegistry,
    shuffle_on: bool,
    repeat_mode: RepeatMode,
    rng: SmallRng,
    events: EventBus,
}

type CursorMarker = (Option<usize>, Option<String>);

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueEngine {
    pub fn new() -> Self {
        Self::with_rng(rand::make_rng::<SmallRng>())
    }

    /// Deterministic shuffles, for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            queue: Vec::new(),
            cursor: None,
            history: PlayHistory::new(),
            playlists: PlaylistRegistry::new(),
            shuffle_on: false,
            repeat_mode: RepeatMode::None,
            rng,
            events: EventBus::default(),
        }
    }

    /// Rebuilds an engine from a snapshot. Everything goes through the public
    /// operations so a damaged snapshot comes back repaired.
    pub fn from_persisted(state: PersistedState) -> Self {
        let mut engine = Self::new();
        engine.apply_persisted(state);
        engine
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            queue: self.queue.clone(),
            cursor: self.cursor,
            history: self.history.entries().to_vec(),
            playlists: self.playlists.iter().cloned().collect(),
            current_playlist: self.playlists.current_id().map(str::to_string),
            repeat_mode: self.repeat_mode,
            shuffle_on: self.shuffle_on,
        }
    }

    fn apply_persisted(&mut self, state: PersistedState) {
        let queue_len = state.queue.len();
        self.set_queue(state.queue);
        if let Some(index) = state.cursor {
            if index >= queue_len {
                warn!(index, queue_len, "persisted cursor out of range, clamping");
            }
            self.play_at_index(index);
        }

        for item in state.history.into_iter().rev() {
            self.add_to_history(item);
        }

        for mut playlist in state.playlists {
            playlist.refresh_totals();
            let id = playlist.id.clone();
            if !self.add_playlist(playlist) {
                warn!(playlist_id = %id, "duplicate playlist in persisted state, skipped");
            }
        }

        if let Some(id) = state.current_playlist.as_deref() {
            if !self.playlists.contains(id) {
                debug!(playlist_id = %id, "persisted current playlist is not registered");
            }
            self.set_current_playlist(Some(id));
        }

        self.set_repeat_mode(state.repeat_mode);
        // Flag only: the persisted queue order is already the shuffled order.
        self.shuffle_on = state.shuffle_on;

        info!(
            queue_len = self.queue.len(),
            history_len = self.history.len(),
            playlists = self.playlists.len(),
            "queue state restored"
        );
    }

    /// Events queue up unbounded until drained; see [`EventBus::subscribe`].
    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn queue(&self) -> &[MediaItem] {
        &self.queue
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.queue.get(self.cursor?)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_duration_seconds(&self) -> f64 {
        self.queue.iter().map(|item| item.duration_seconds).sum()
    }

    pub fn history(&self) -> &[MediaItem] {
        self.history.entries()
    }

    pub fn playlists(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.iter()
    }

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.get(id)
    }

    pub fn current_playlist(&self) -> Option<&Playlist> {
        self.playlists.current()
    }

    pub fn current_playlist_id(&self) -> Option<&str> {
        self.playlists.current_id()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn shuffle_on(&self) -> bool {
        self.shuffle_on
    }

    pub fn has_next(&self) -> bool {
        match self.cursor {
            Some(current) => {
                self.repeat_mode == RepeatMode::All || current + 1 < self.queue.len()
            }
            None => false,
        }
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.cursor, Some(current) if current > 0)
    }

    pub fn set_queue(&mut self, items: Vec<MediaItem>) {
        let before = self.cursor_marker();
        self.queue = items;
        self.cursor = (!self.queue.is_empty()).then_some(0);
        debug!(len = self.queue.len(), "queue replaced");
        self.finish_mutation(before);
    }

    pub fn add_to_queue(&mut self, item: MediaItem) {
        let before = self.cursor_marker();
        debug!(item_id = %item.id, "appending to queue");
        self.queue.push(item);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        self.finish_mutation(before);
    }

    /// Inserts right after the current entry. The cursor stays put unless the
    /// queue was empty.
    pub fn add_to_queue_next(&mut self, item: MediaItem) {
        let before = self.cursor_marker();
        let at = self.cursor.map_or(0, |current| current + 1);
        debug!(item_id = %item.id, at, "inserting after current");
        self.queue.insert(at, item);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        self.finish_mutation(before);
    }

    pub fn add_multiple_to_queue(&mut self, items: impl IntoIterator<Item = MediaItem>) {
        let before = self.cursor_marker();
        let old_len = self.queue.len();
        self.queue.extend(items);
        if self.queue.len() == old_len {
            return;
        }
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        debug!(added = self.queue.len() - old_len, "appended batch to queue");
        self.finish_mutation(before);
    }

    pub fn remove_from_queue(&mut self, index: usize) -> Option<MediaItem> {
        if index >= self.queue.len() {
            return None;
        }

        let before = self.cursor_marker();
        let removed = self.queue.remove(index);
        let new_len = self.queue.len();
        self.cursor = self.cursor.and_then(|current| {
            if new_len == 0 {
                None
            } else if index < current {
                Some(current - 1)
            } else {
                Some(current.min(new_len - 1))
            }
        });
        debug!(index, item_id = %removed.id, "removed from queue");
        self.finish_mutation(before);
        Some(removed)
    }

    /// Removes every listed position, all measured against the queue as it was
    /// before the call. Duplicates and out-of-range indices are ignored.
    pub fn remove_multiple_from_queue(&mut self, indices: &[usize]) -> usize {
        let len = self.queue.len();
        let doomed: BTreeSet<usize> = indices.iter().copied().filter(|i| *i < len).collect();
        if doomed.is_empty() {
            return 0;
        }

        let before = self.cursor_marker();
        let mut position = 0;
        self.queue.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });

        let new_len = self.queue.len();
        self.cursor = self.cursor.and_then(|current| {
            if new_len == 0 {
                return None;
            }
            let shift = doomed.range(..current).count();
            Some((current - shift).min(new_len - 1))
        });
        debug!(removed = doomed.len(), "removed batch from queue");
        self.finish_mutation(before);
        doomed.len()
    }

    /// Moves one entry. The cursor keeps pointing at the entry it pointed at.
    pub fn move_in_queue(&mut self, from: usize, to: usize) -> bool {
        let len = self.queue.len();
        if from >= len || to >= len || from == to {
            return false;
        }

        let before = self.cursor_marker();
        let item = self.queue.remove(from);
        self.queue.insert(to, item);
        self.cursor = self
            .cursor
            .map(|current| remap_after_move(current, from, to));
        debug!(from, to, "moved queue entry");
        self.finish_mutation(before);
        true
    }

    pub fn clear_queue(&mut self) {
        if self.queue.is_empty() && self.cursor.is_none() {
            return;
        }
        let before = self.cursor_marker();
        self.queue.clear();
        self.cursor = None;
        debug!("queue cleared");
        self.finish_mutation(before);
    }

    /// Returns the new current item, or `None` when there is nothing to move
    /// to (empty queue, or the end of the queue with repeat off).
    pub fn play_next(&mut self) -> Option<&MediaItem> {
        let current = self.cursor?;
        let len = self.queue.len();
        let next = match self.repeat_mode {
            RepeatMode::Single => current,
            RepeatMode::All => (current + 1) % len,
            RepeatMode::None => {
                if current + 1 >= len {
                    debug!(current, "end of queue reached");
                    return None;
                }
                current + 1
            }
        };
        self.move_cursor(next);
        self.current_item()
    }

    /// Steps back, wrapping from the first entry to the last in every mode.
    pub fn play_previous(&mut self) -> Option<&MediaItem> {
        let current = self.cursor?;
        let previous = match current {
            0 => self.queue.len() - 1,
            _ => current - 1,
        };
        self.move_cursor(previous);
        self.current_item()
    }

    pub fn play_at_index(&mut self, index: usize) -> Option<&MediaItem> {
        let last = self.queue.len().checked_sub(1)?;
        self.move_cursor(index.min(last));
        self.current_item()
    }

    /// Fisher-Yates over everything but the current entry, which ends up at
    /// position 0 with the cursor on it.
    pub fn shuffle_queue(&mut self) {
        let Some(current) = self.cursor else {
            return;
        };

        let before = self.cursor_marker();
        let playing = self.queue.remove(current);
        self.queue.shuffle(&mut self.rng);
        self.queue.insert(0, playing);
        self.cursor = Some(0);
        debug!(len = self.queue.len(), "queue shuffled");
        self.finish_mutation(before);
    }

    /// Turning shuffle on reshuffles every time. Turning it off only clears
    /// the flag; the previous order is not brought back.
    pub fn set_shuffle(&mut self, on: bool) {
        if self.shuffle_on != on {
            self.shuffle_on = on;
            self.emit_mode();
        }
        if on {
            self.shuffle_queue();
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.shuffle_on);
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        if self.repeat_mode == mode {
            return;
        }
        self.repeat_mode = mode;
        debug!(mode = mode.label(), "repeat mode set");
        self.emit_mode();
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.set_repeat_mode(self.repeat_mode.next());
        self.repeat_mode
    }

    pub fn add_to_history(&mut self, item: MediaItem) {
        self.history.push(item);
        self.emit_history();
    }

    pub fn remove_from_history(&mut self, id: &str) -> bool {
        let removed = self.history.remove(id);
        if removed {
            self.emit_history();
        }
        removed
    }

    pub fn clear_history(&mut self) {
        if self.history.is_empty() {
            return;
        }
        self.history.clear();
        self.emit_history();
    }

    /// Logs the current queue entry as played.
    pub fn record_current(&mut self) {
        if let Some(item) = self.current_item().cloned() {
            self.add_to_history(item);
        }
    }

    pub fn add_playlist(&mut self, playlist: Playlist) -> bool {
        let id = playlist.id.clone();
        if !self.playlists.add(playlist) {
            debug!(playlist_id = %id, "playlist already registered");
            return false;
        }
        debug!(playlist_id = %id, "playlist added");
        self.emit_playlists();
        true
    }

    /// Edits a registered playlist. A queue loaded from it earlier is its own
    /// copy and does not change.
    pub fn update_playlist(&mut self, id: &str, patch: PlaylistPatch) -> bool {
        if patch.is_empty() || !self.playlists.update(id, patch) {
            return false;
        }
        debug!(playlist_id = %id, "playlist updated");
        self.emit_playlists();
        true
    }

    pub fn remove_playlist(&mut self, id: &str) -> Option<Playlist> {
        let was_current = self.playlists.current_id() == Some(id);
        let removed = self.playlists.remove(id)?;
        debug!(playlist_id = %id, "playlist removed");
        self.emit_playlists();
        if was_current {
            self.emit_current_playlist();
        }
        Some(removed)
    }

    /// Changes which playlist is selected and nothing else. The id is a
    /// reference only; `current_playlist()` resolves it against the registry.
    pub fn set_current_playlist(&mut self, id: Option<&str>) {
        if self.playlists.current_id() == id {
            return;
        }
        self.playlists.set_current(id);
        self.emit_current_playlist();
    }

    pub fn load_playlist_to_queue(&mut self, playlist: &Playlist, start_index: usize) {
        let before = self.cursor_marker();
        self.queue = playlist.videos.clone();
        self.cursor = self
            .queue
            .len()
            .checked_sub(1)
            .map(|last| start_index.min(last));
        debug!(
            playlist_id = %playlist.id,
            len = self.queue.len(),
            start = ?self.cursor,
            "playlist loaded into queue"
        );
        self.finish_mutation(before);
    }

    /// Loads the playlist and makes it the current one, registered or not.
    pub fn play_playlist(&mut self, playlist: &Playlist, start_index: usize) {
        self.load_playlist_to_queue(playlist, start_index);
        self.set_current_playlist(Some(&playlist.id));
    }

    fn move_cursor(&mut self, index: usize) {
        self.cursor = Some(index);
        self.emit_cursor();
    }

    fn cursor_marker(&self) -> CursorMarker {
        (self.cursor, self.current_item().map(|item| item.id.clone()))
    }

    fn finish_mutation(&mut self, before: CursorMarker) {
        self.events.emit(QueueEvent::QueueChanged {
            len: self.queue.len(),
        });
        if self.cursor_marker() != before {
            self.emit_cursor();
        }
    }

    fn emit_cursor(&mut self) {
        let (index, item_id) = self.cursor_marker();
        self.events.emit(QueueEvent::CursorChanged { index, item_id });
    }

    fn emit_mode(&mut self) {
        self.events.emit(QueueEvent::ModeChanged {
            shuffle_on: self.shuffle_on,
            repeat_mode: self.repeat_mode,
        });
    }

    fn emit_history(&mut self) {
        self.events.emit(QueueEvent::HistoryChanged {
            len: self.history.len(),
        });
    }

    fn emit_playlists(&mut self) {
        self.events.emit(QueueEvent::PlaylistsChanged {
            count: self.playlists.len(),
        });
    }

    fn emit_current_playlist(&mut self) {
        self.events.emit(QueueEvent::CurrentPlaylistChanged {
            id: self.playlists.current_id().map(str::to_string),
        });
    }
}

fn remap_after_move(cursor: usize, from: usize, to: usize) -> usize {
    if cursor == from {
        to
    } else if from < cursor && cursor <= to {
        cursor - 1
    } else if to <= cursor && cursor < from {
        cursor + 1
    } else {
        cursor
    }
}
