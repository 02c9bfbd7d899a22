use crate::locator::LinkSpan;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Host events a subscription can listen to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSource {
    KeyDown,
    MouseUp,
    RenderCompleted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handler {
    CloseOnEscape,
    CloseOnOutsideClick,
    /// Keep the panel on this link while the caret stays inside it.
    TrackLink(LinkSpan),
}

impl Handler {
    pub fn is_close_handler(&self) -> bool {
        matches!(self, Handler::CloseOnEscape | Handler::CloseOnOutsideClick)
    }
}

#[derive(Clone, Debug)]
struct Subscription {
    id: SubscriptionId,
    source: EventSource,
    handler: Handler,
}

/// Registry of live subscriptions. Every `subscribe` hands out a fresh id
/// that must be passed back to `unsubscribe`.
#[derive(Debug, Default)]
pub struct Subscriptions {
    next_id: u64,
    entries: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, source: EventSource, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Subscription {
            id,
            source,
            handler,
        });
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn handler(&self, id: SubscriptionId) -> Option<&Handler> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.handler)
    }

    pub fn handler_mut(&mut self, id: SubscriptionId) -> Option<&mut Handler> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.handler)
    }

    /// Handlers listening to `source`, in subscription order.
    pub fn handlers_for(&self, source: EventSource) -> impl Iterator<Item = &Handler> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.source == source)
            .map(|entry| &entry.handler)
    }

    pub fn count_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Handler) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(&entry.handler))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
