use crate::model::RepeatMode;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    QueueChanged {
        len: usize,
    },
    CursorChanged {
        index: Option<usize>,
        item_id: Option<String>,
    },
    ModeChanged {
        shuffle_on: bool,
        repeat_mode: RepeatMode,
    },
    HistoryChanged {
        len: usize,
    },
    PlaylistsChanged {
        count: usize,
    },
    CurrentPlaylistChanged {
        id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub events: Receiver<QueueEvent>,
}

impl Subscription {
    pub fn try_recv(&self) -> Option<QueueEvent> {
        self.events.try_recv().ok()
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<QueueEvent> {
        self.events.try_iter().collect()
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Sender<QueueEvent>)>,
}

impl EventBus {
    /// The channel is unbounded: a subscriber that never drains keeps every
    /// event queued until it drops its `Subscription` or is unsubscribed.
    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::channel();
        self.subscribers.push((id, tx));
        Subscription { id, events: rx }
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: QueueEvent) {
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
