//! Observer lists
//!
//! Components that broadcast state changes own an `Observers<T>`; callers
//! register handlers and the owner notifies all of them synchronously once
//! the mutation is complete.

use std::fmt;

/// Handle returned by [`Observers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Handler<T> = Box<dyn FnMut(&T)>;

/// A list of handlers invoked in registration order.
pub struct Observers<T> {
    next_id: u64,
    handlers: Vec<(ListenerId, Handler<T>)>,
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    /// Register a handler
    pub fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(hid, _)| *hid != id);
        self.handlers.len() != before
    }

    /// Invoke every handler with `event`
    pub fn notify(&mut self, event: &T) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
