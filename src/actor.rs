//! Actors and the channels that connect them.
//!
//! Every message carries the span it was sent from, so handling it on the
//! receiving side shows up under the sender's span.

pub mod config_watcher;
pub mod decorator;

use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{
    UnboundedReceiver, UnboundedSender, WeakUnboundedSender, unbounded_channel,
};
use tracing::Span;

pub struct Sender<Event>(UnboundedSender<(Span, Event)>);

pub type Receiver<Event> = UnboundedReceiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    /// Sends, dropping the message if the receiver is gone.
    pub fn send(&self, event: Event) { _ = self.try_send(event); }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }

    /// A sender that does not keep the receiver open.
    pub fn downgrade(&self) -> WeakSender<Event> { WeakSender(self.0.downgrade()) }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Sender(self.0.clone()) }
}

pub struct WeakSender<Event>(WeakUnboundedSender<(Span, Event)>);

impl<Event> WeakSender<Event> {
    /// `None` once every strong sender is gone.
    pub fn upgrade(&self) -> Option<Sender<Event>> { self.0.upgrade().map(Sender) }
}

impl<Event> Clone for WeakSender<Event> {
    fn clone(&self) -> Self { WeakSender(self.0.clone()) }
}
