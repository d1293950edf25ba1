use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    account::{AccountKeys, NetworkInfo, ReadyState},
    error::WalletError,
};

/// A notification published by an adapter (or re-broadcast by the
/// connector). Every state mutation an adapter performs is mirrored by one of
/// these, so an observer never needs to poll.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    Connect { public_key: Option<String> },
    Disconnect,
    Error(WalletError),
    AccountChange(AccountKeys),
    NetworkChange(NetworkInfo),
    ReadyStateChange(ReadyState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A minimal publish/subscribe channel. Adapters and the connector each hold
/// one; subscribers get every event in emission order.
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    next: Cell<u64>,
    listeners: RefCell<Vec<(u64, Rc<dyn Fn(&WalletEvent)>)>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        EventEmitter::default()
    }

    pub fn on(&self, listener: impl Fn(&WalletEvent) + 'static) -> ListenerId {
        let id = self.inner.next.get();
        self.inner.next.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        ListenerId(id)
    }

    pub fn off(&self, id: ListenerId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(listener_id, _)| *listener_id != id.0);
    }

    pub fn emit(&self, event: &WalletEvent) {
        // snapshot so a listener may subscribe/unsubscribe during dispatch
        let listeners: Vec<_> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_receive_events_in_order() {
        let emitter = EventEmitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        emitter.on(move |event| sink.borrow_mut().push(event.clone()));

        emitter.emit(&WalletEvent::Disconnect);
        emitter.emit(&WalletEvent::Connect { public_key: None });

        assert_eq!(
            *seen.borrow(),
            vec![
                WalletEvent::Disconnect,
                WalletEvent::Connect { public_key: None }
            ]
        );
    }

    #[test]
    fn off_removes_the_listener() {
        let emitter = EventEmitter::new();
        let seen = Rc::new(Cell::new(0));

        let sink = Rc::clone(&seen);
        let id = emitter.on(move |_| sink.set(sink.get() + 1));

        emitter.emit(&WalletEvent::Disconnect);
        emitter.off(id);
        emitter.emit(&WalletEvent::Disconnect);

        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn a_listener_may_unsubscribe_itself_during_dispatch() {
        let emitter = EventEmitter::new();
        let seen = Rc::new(Cell::new(0));

        let id = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let own_id = Rc::clone(&id);
        let inner = emitter.clone();
        id.set(Some(emitter.on(move |_| {
            sink.set(sink.get() + 1);
            if let Some(id) = own_id.get() {
                inner.off(id);
            }
        })));

        emitter.emit(&WalletEvent::Disconnect);
        emitter.emit(&WalletEvent::Disconnect);

        assert_eq!(seen.get(), 1);
    }
}
