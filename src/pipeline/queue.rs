//! Work queue for distributing pages to worker threads.
//!
//! Uses std::sync::mpsc channels. The receiver is shared between workers
//! behind a mutex; each worker pulls the next page when it is free.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use crate::page::Page;

/// A page waiting to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWorkItem {
    pub page: Page,
}

/// Receiving end shared by every worker.
pub type SharedReceiver = Mutex<Receiver<PageWorkItem>>;

/// Creates a work queue pre-filled with `pages`.
///
/// The sender is dropped before returning, so workers see the channel close
/// once every page has been taken.
pub fn create_work_queue(pages: impl IntoIterator<Item = Page>) -> SharedReceiver {
    let (sender, receiver): (Sender<PageWorkItem>, Receiver<PageWorkItem>) = channel();
    for page in pages {
        // The receiver is alive in this scope, so send cannot fail
        let _ = sender.send(PageWorkItem { page });
    }
    Mutex::new(receiver)
}

/// Takes the next page, or `None` once the queue is drained.
pub fn next_item(queue: &SharedReceiver) -> Option<PageWorkItem> {
    let receiver = queue.lock().ok()?;
    receiver.recv().ok()
}
