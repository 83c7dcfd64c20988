use std::path::Path;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;

/// Raw watcher notifications, errors included. Closes when the watcher is
/// dropped.
pub type WatchEvents = mpsc::UnboundedReceiver<notify::Result<Event>>;

/// Start watching `path`. The returned watcher must be kept alive for as
/// long as events are wanted.
pub fn watch(path: &Path) -> Result<(RecommendedWatcher, WatchEvents)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // Receiver gone means nobody is reloading any more
        let _ = tx.send(res);
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

/// Content writes only; metadata, access, create and remove are not writes.
pub fn is_write(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}
