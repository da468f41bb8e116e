use crate::model::{Playlist, PlaylistPatch};
use std::collections::BTreeMap;

/// Named playlists keyed by id, plus which one (if any) is selected.
#[derive(Debug, Clone, Default)]
pub struct PlaylistRegistry {
    playlists: BTreeMap<String, Playlist>,
    current: Option<String>,
}

impl PlaylistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, playlist: Playlist) -> bool {
        if self.playlists.contains_key(&playlist.id) {
            return false;
        }
        self.playlists.insert(playlist.id.clone(), playlist);
        true
    }

    pub fn update(&mut self, id: &str, patch: PlaylistPatch) -> bool {
        let Some(playlist) = self.playlists.get_mut(id) else {
            return false;
        };
        playlist.apply(patch);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Playlist> {
        let removed = self.playlists.remove(id)?;
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        Some(removed)
    }

    /// `None` clears the selection. The id need not be registered: a
    /// playlist played ad hoc is still the current one.
    pub fn set_current(&mut self, id: Option<&str>) {
        self.current = id.map(str::to_string);
    }

    pub fn get(&self, id: &str) -> Option<&Playlist> {
        self.playlists.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.playlists.contains_key(id)
    }

    pub fn current(&self) -> Option<&Playlist> {
        self.current.as_deref().and_then(|id| self.playlists.get(id))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.values()
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaItem;

    fn playlist(id: &str) -> Playlist {
        Playlist::new(id, format!("list {id}"), vec![MediaItem::new("a", "A")])
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = PlaylistRegistry::new();
        assert!(registry.add(playlist("p1")));
        assert!(!registry.add(Playlist::new("p1", "other", Vec::new())));
        assert_eq!(registry.get("p1").map(|p| p.video_count), Some(1));
    }

    #[test]
    fn removing_current_clears_selection() {
        let mut registry = PlaylistRegistry::new();
        registry.add(playlist("p1"));
        registry.add(playlist("p2"));
        registry.set_current(Some("p1"));

        registry.remove("p2");
        assert_eq!(registry.current_id(), Some("p1"));

        registry.remove("p1");
        assert_eq!(registry.current_id(), None);
        assert!(registry.current().is_none());
    }

    #[test]
    fn unregistered_current_is_kept_as_id() {
        let mut registry = PlaylistRegistry::new();
        registry.set_current(Some("adhoc"));
        assert_eq!(registry.current_id(), Some("adhoc"));
        assert!(registry.current().is_none());

        registry.set_current(None);
        assert_eq!(registry.current_id(), None);
    }

    #[test]
    fn update_reports_unknown_id() {
        let mut registry = PlaylistRegistry::new();
        registry.add(playlist("p1"));
        let patch = PlaylistPatch {
            name: Some(String::from("renamed")),
            ..PlaylistPatch::default()
        };
        assert!(!registry.update("p9", patch.clone()));
        assert!(registry.update("p1", patch));
        assert_eq!(registry.get("p1").map(|p| p.name.as_str()), Some("renamed"));
    }
}
