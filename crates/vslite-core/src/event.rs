//! Event bus for shell notifications.
//!
//! Handlers never hold references into the shell: they receive cloned
//! `ShellEvent` values over a `tokio::sync::broadcast` channel, and a lagging
//! receiver never blocks the shell.

use crate::document::DocumentId;
use crate::sidebar::SidebarPanel;
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Events that can occur in the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    // Document events
    /// A document was opened
    DocumentOpened(DocumentId),
    /// A document was closed
    DocumentClosed(DocumentId),
    /// A document was saved
    DocumentSaved(DocumentId),
    /// A document's modified flag flipped
    DocumentChanged(DocumentId),
    /// A document became the active tab
    DocumentFocused(DocumentId),

    /// Cursor moved in the bound document
    CursorMoved(DocumentId),
    /// The Welcome panel replaced the editor
    WelcomeShown,

    // Line export
    /// A key listener was registered on the editor
    ExportArmed,
    /// The key listener was removed
    ExportDisarmed,
    /// A captured line was written
    LineExported(PathBuf),

    /// Activity bar selection changed
    PanelChanged(SidebarPanel),
    /// The shell is quitting
    Quit,
}

/// Event bus for broadcasting shell events.
pub struct EventBus {
    sender: broadcast::Sender<ShellEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // Capacity of 256 events in the buffer
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: ShellEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(shell.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let ShellEvent::LineExported(path) = event {
///             println!("wrote {}", path.display());
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<ShellEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<ShellEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<ShellEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next event if one is already queued.
    pub fn try_next(&mut self) -> Option<ShellEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// Drains every queued event.
    pub fn drain(&mut self) -> Vec<ShellEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(ShellEvent::WelcomeShown);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, ShellEvent::WelcomeShown);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(ShellEvent::Quit);

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_drain() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        let id = DocumentId::new();

        bus.emit(ShellEvent::DocumentOpened(id));
        bus.emit(ShellEvent::DocumentFocused(id));

        assert_eq!(
            handler.drain(),
            vec![ShellEvent::DocumentOpened(id), ShellEvent::DocumentFocused(id)]
        );
        assert!(handler.try_next().is_none());

        drop(bus);
        assert!(handler.next().await.is_none());
    }
}
