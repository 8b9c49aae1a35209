use crate::screens::ScreenChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Removed after its first call.
    Once,
    /// Called on every change until unsubscribed.
    Persistent,
}

struct Listener {
    id: ListenerId,
    lifetime: Lifetime,
    callback: Box<dyn FnMut(&ScreenChange)>,
}

/// Screen-changed listeners, called in registration order.
#[derive(Default)]
pub struct ScreenEvents {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl ScreenEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, lifetime: Lifetime, callback: impl FnMut(&ScreenChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, lifetime, callback: Box::new(callback) });
        id
    }

    /// Returns false if `id` was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, change: &ScreenChange) {
        self.listeners.retain_mut(|l| {
            (l.callback)(change);
            l.lifetime == Lifetime::Persistent
        });
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
