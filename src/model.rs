use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    None,
    Single,
    All,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Single,
            Self::Single => Self::All,
            Self::All => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::All => "all",
        }
    }
}

/// A catalog record as handed to the engine. The engine never edits one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub file_size_bytes: u64,
    #[serde(default)]
    pub rating: f32,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_seconds: 0.0,
            file_size_bytes: 0,
            rating: 0.0,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size_bytes = bytes;
        self
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = rating;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub videos: Vec<MediaItem>,
    #[serde(default)]
    pub video_count: usize,
    #[serde(default)]
    pub total_duration_seconds: f64,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub last_played_at: Option<i64>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>, videos: Vec<MediaItem>) -> Self {
        let mut playlist = Self {
            id: id.into(),
            name: name.into(),
            videos,
            video_count: 0,
            total_duration_seconds: 0.0,
            play_count: 0,
            last_played_at: None,
        };
        playlist.refresh_totals();
        playlist
    }

    /// Recomputes `video_count` and `total_duration_seconds` from `videos`.
    pub fn refresh_totals(&mut self) {
        self.video_count = self.videos.len();
        self.total_duration_seconds = self.videos.iter().map(|v| v.duration_seconds).sum();
    }

    pub fn apply(&mut self, patch: PlaylistPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(videos) = patch.videos {
            self.videos = videos;
            self.refresh_totals();
        }
        if let Some(play_count) = patch.play_count {
            self.play_count = play_count;
        }
        if let Some(at) = patch.last_played_at {
            self.last_played_at = Some(at);
        }
    }
}

/// Partial playlist update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistPatch {
    pub name: Option<String>,
    pub videos: Option<Vec<MediaItem>>,
    pub play_count: Option<u32>,
    pub last_played_at: Option<i64>,
}

impl PlaylistPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.videos.is_none()
            && self.play_count.is_none()
            && self.last_played_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersistedState {
    #[serde(default)]
    pub queue: Vec<MediaItem>,
    #[serde(default)]
    pub cursor: Option<usize>,
    #[serde(default)]
    pub history: Vec<MediaItem>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    #[serde(default)]
    pub current_playlist: Option<String>,
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    pub shuffle_on: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_mode_cycles_through_all_modes() {
        assert_eq!(RepeatMode::None.next(), RepeatMode::Single);
        assert_eq!(RepeatMode::Single.next(), RepeatMode::All);
        assert_eq!(RepeatMode::All.next(), RepeatMode::None);
    }

    #[test]
    fn repeat_mode_serializes_lowercase() {
        let json = serde_json::to_string(&RepeatMode::Single).expect("serialize");
        assert_eq!(json, "\"single\"");
    }

    #[test]
    fn new_playlist_derives_totals() {
        let playlist = Playlist::new(
            "p1",
            "Trips",
            vec![
                MediaItem::new("a", "A").with_duration(30.0),
                MediaItem::new("b", "B").with_duration(12.5),
            ],
        );
        assert_eq!(playlist.video_count, 2);
        assert_eq!(playlist.total_duration_seconds, 42.5);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut playlist = Playlist::new("p1", "Trips", vec![MediaItem::new("a", "A")]);
        playlist.apply(PlaylistPatch {
            play_count: Some(3),
            ..PlaylistPatch::default()
        });
        assert_eq!(playlist.name, "Trips");
        assert_eq!(playlist.video_count, 1);
        assert_eq!(playlist.play_count, 3);

        playlist.apply(PlaylistPatch {
            videos: Some(Vec::new()),
            ..PlaylistPatch::default()
        });
        assert_eq!(playlist.video_count, 0);
        assert_eq!(playlist.total_duration_seconds, 0.0);
    }

    #[test]
    fn persisted_state_tolerates_missing_fields() {
        let state: PersistedState = serde_json::from_str("{}").expect("parse");
        assert_eq!(state, PersistedState::default());
        assert_eq!(state.repeat_mode, RepeatMode::None);
    }
}
