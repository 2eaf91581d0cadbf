//! Widget notifications.
//!
//! Events go out on a `tokio::sync::broadcast` channel. The widget keeps a
//! receiver of its own so a host driving it from one thread can
//! [`drain`](EventQueue::drain) after each call; other parts of the host can
//! [`subscribe`](EventQueue::subscribe) and receive the same events.

use std::ops::Range;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use codebox_syntax::LexError;

/// Something the host may need to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeBoxEvent {
    /// The active language changed (`None` for plain text)
    LanguageChanged(Option<String>),
    /// No backend for the requested language; the text shows unstyled
    BackendUnavailable(String),
    /// Tokens in this byte range were rebuilt and need repainting
    Retokenized { range: Range<usize> },
    /// Lexing stopped early; the rest of the document is unclassified
    LexFailed { error: LexError },
    /// Colours changed; everything needs repainting
    StyleChanged,
}

/// Bounded broadcast of widget events.
///
/// A receiver that falls more than `capacity` events behind loses the
/// oldest ones.
#[derive(Debug)]
pub struct EventQueue {
    sender: broadcast::Sender<CodeBoxEvent>,
    receiver: broadcast::Receiver<CodeBoxEvent>,
}

impl EventQueue {
    /// Creates a queue holding up to 256 events.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        Self { sender, receiver }
    }

    /// Sends an event to the widget's own receiver and every subscriber.
    pub fn emit(&self, event: CodeBoxEvent) {
        // the queue holds a receiver, so sending cannot fail
        let _ = self.sender.send(event);
    }

    /// Returns a receiver that gets every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CodeBoxEvent> {
        self.sender.subscribe()
    }

    /// Takes every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<CodeBoxEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event queue lagged, missed {} events", n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
