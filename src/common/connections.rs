//! Bookkeeping for signal handlers connected on behalf of a subject.
//!
//! Every handler is recorded under its subject and signal name so that all of
//! them can be disconnected together, either per signal, per subject, or for
//! everything at once.

use std::fmt::Debug;
use std::hash::Hash;

use tracing::trace;

use crate::common::collections::HashMap;

/// Something handlers can be connected to.
pub trait SignalSource<S> {
    type Handler;
    type HandlerId: Copy + Debug;

    fn connect(&mut self, subject: &S, signal: &str, handler: Self::Handler) -> Self::HandlerId;
    fn disconnect(&mut self, subject: &S, id: Self::HandlerId);
}

pub struct Connections<S, I> {
    /// Handlers per subject, per signal, in registration order.
    connections: HashMap<S, HashMap<String, Vec<I>>>,
}

impl<S, I> Default for Connections<S, I> {
    fn default() -> Self { Connections { connections: HashMap::default() } }
}

impl<S, I> Connections<S, I>
where
    S: Hash + Eq + Clone + Debug,
    I: Copy + Debug,
{
    pub fn new() -> Self { Self::default() }

    pub fn connect<Src>(
        &mut self,
        source: &mut Src,
        subject: S,
        signal: &str,
        handler: Src::Handler,
    ) where
        Src: SignalSource<S, HandlerId = I>,
    {
        let id = source.connect(&subject, signal, handler);
        trace!(?subject, signal, ?id, "connected");
        self.connections
            .entry(subject)
            .or_default()
            .entry(signal.to_string())
            .or_default()
            .push(id);
    }

    /// Disconnects every handler of `signal` on `subject`.
    pub fn disconnect<Src>(&mut self, source: &mut Src, subject: &S, signal: &str)
    where Src: SignalSource<S, HandlerId = I> {
        let Some(signals) = self.connections.get_mut(subject) else {
            return;
        };
        let Some(ids) = signals.remove(signal) else {
            return;
        };
        for id in ids {
            source.disconnect(subject, id);
        }
        if signals.is_empty() {
            self.connections.remove(subject);
        }
    }

    /// Disconnects everything recorded for `subject`, or for every subject
    /// when `subject` is `None`.
    pub fn disconnect_all<Src>(&mut self, source: &mut Src, subject: Option<&S>)
    where Src: SignalSource<S, HandlerId = I> {
        match subject {
            Some(subject) => {
                if let Some(signals) = self.connections.remove(subject) {
                    Self::disconnect_signals(source, subject, signals);
                }
            }
            None => {
                for (subject, signals) in self.connections.drain() {
                    Self::disconnect_signals(source, &subject, signals);
                }
            }
        }
    }

    fn disconnect_signals<Src>(source: &mut Src, subject: &S, signals: HashMap<String, Vec<I>>)
    where Src: SignalSource<S, HandlerId = I> {
        for (signal, ids) in signals {
            trace!(?subject, %signal, count = ids.len(), "disconnecting");
            for id in ids {
                source.disconnect(subject, id);
            }
        }
    }

    pub fn is_connected(&self, subject: &S, signal: &str) -> bool {
        self.connections.get(subject).is_some_and(|signals| signals.contains_key(signal))
    }

    pub fn handler_count(&self, subject: &S, signal: &str) -> usize {
        self.connections
            .get(subject)
            .and_then(|signals| signals.get(signal))
            .map_or(0, Vec::len)
    }

    pub fn subject_count(&self) -> usize { self.connections.len() }

    pub fn is_empty(&self) -> bool { self.connections.is_empty() }
}
