//! Defines an abstraction over the event sending mechanism.

use super::events::UserEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A trait that abstracts the sending of user events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

/// Front ends that consume events from a Tokio channel.
impl EventProxy for UnboundedSender<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // A closed channel means the front end is gone; there is nobody left to tell.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to deliver event: {:?}", e.0);
        }
    }
}
