//! Playback queue engine: the ordered queue a player walks through, with
//! shuffle, repeat, play history and playlist loading.
//!
//! The engine does no I/O of its own. Hosts drive it through [`QueueEngine`]
//! (or [`SharedEngine`] across threads) and observe it through
//! [`events::Subscription`]s; [`config`] persists its state as JSON.

pub mod config;
pub mod core;
pub mod events;
pub mod history;
pub mod model;
pub mod playlists;
pub mod shared;

pub use crate::core::QueueEngine;
pub use crate::events::{QueueEvent, SubscriberId, Subscription};
pub use crate::model::{MediaItem, PersistedState, Playlist, PlaylistPatch, RepeatMode};
pub use crate::shared::{QueueSnapshot, SharedEngine};
