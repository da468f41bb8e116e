use crate::model::MediaItem;

pub const HISTORY_LIMIT: usize = 100;

/// Most-recent-first play log, one entry per item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayHistory {
    entries: Vec<MediaItem>,
}

impl PlayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: MediaItem) {
        self.entries.retain(|entry| entry.id != item.id);
        self.entries.insert(0, item);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        self.entries.remove(pos);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[MediaItem] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&MediaItem> {
        self.entries.first()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;
    use std::collections::HashSet;

    fn item(id: &str) -> MediaItem {
        MediaItem::new(id, id.to_uppercase())
    }

    #[test]
    fn re_adding_moves_entry_to_front() {
        let mut history = PlayHistory::new();
        history.push(item("x"));
        history.push(item("y"));
        history.push(item("x"));

        let ids: Vec<&str> = history.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn keeps_only_the_most_recent_hundred() {
        let mut history = PlayHistory::new();
        for n in 0..150 {
            history.push(item(&format!("v{n}")));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.latest().map(|e| e.id.as_str()), Some("v149"));
        assert!(!history.contains("v49"));
        assert!(history.contains("v50"));
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let mut history = PlayHistory::new();
        history.push(item("a"));
        assert!(!history.remove("zzz"));
        assert_eq!(history.len(), 1);
        assert!(history.remove("a"));
        assert!(history.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn bounded_and_unique(ids in proptest::collection::vec(0u16..300, 0..400)) {
            let mut history = PlayHistory::new();
            for id in &ids {
                history.push(item(&id.to_string()));
            }

            prop_assert!(history.len() <= HISTORY_LIMIT);
            let unique: HashSet<&str> = history.entries().iter().map(|e| e.id.as_str()).collect();
            prop_assert!(unique.len() == history.len());
            if let Some(last) = ids.last() {
                prop_assert!(history.latest().map(|e| e.id.clone()) == Some(last.to_string()));
            }
        }
    }
}
