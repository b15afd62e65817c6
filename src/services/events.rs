//! Filesystem-event source contract.
//!
//! The real inotify/FSEvents plumbing lives outside this crate; whatever
//! feeds the watcher sends `FileEvent`s over a channel. Events may arrive
//! duplicated or out of order; the ingestion state machine's size sampling
//! absorbs both.

use std::path::PathBuf;
use tokio::sync::mpsc;

/// Kind of raw filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Modified,
}

/// A raw create/modify event with the size observed at delivery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: EventKind,
    pub path: PathBuf,
    pub size: u64,
}

/// Channel pair used to feed the watcher.
pub type EventSender = mpsc::UnboundedSender<FileEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<FileEvent>;

/// Create an event channel for the watcher.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
