//! The connection manager: tracks which of the registered wallets is the
//! current one, walks it through the connect/disconnect lifecycle, forwards
//! signing calls to it, and remembers the selection across page reloads.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use serde_json::Value;

use crate::{
    account::{
        AccountKeys, NetworkInfo, PendingTransaction, ReadyState, SignMessagePayload,
        SignedMessage, WalletDescriptor, WalletName,
    },
    adapter::WalletAdapter,
    env::HostScope,
    error::WalletError,
    events::{EventEmitter, ListenerId, WalletEvent},
    store::{SELECTED_WALLET_KEY, SelectionStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
}

pub struct ConnectorOptions {
    /// open the wallet's install page when the user picks one that is not
    /// installed
    pub open_install_page: bool,
    /// storage key the selected wallet name is persisted under
    pub storage_key: &'static str,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        ConnectorOptions {
            open_install_page: true,
            storage_key: SELECTED_WALLET_KEY,
        }
    }
}

/// One registered wallet as shown to the user: its descriptor plus the live
/// detection state.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSummary {
    pub name: WalletName,
    pub url: String,
    pub icon: String,
    pub ready_state: ReadyState,
}

struct Inner {
    wallets: Vec<Rc<WalletAdapter>>,
    selected: RefCell<Option<usize>>,
    phase: Cell<Phase>,
    store: Rc<dyn SelectionStore>,
    scope: Rc<dyn HostScope>,
    emitter: EventEmitter,
    unloading: Cell<bool>,
    options: ConnectorOptions,
}

impl Inner {
    fn report(&self, error: WalletError) -> WalletError {
        log::warn!("{error}");
        if !self.unloading.get() {
            self.emitter.emit(&WalletEvent::Error(error.clone()));
        }
        error
    }

    fn clear_selection(&self) {
        *self.selected.borrow_mut() = None;
        if !self.unloading.get() {
            self.store.remove(self.options.storage_key);
        }
    }

    fn is_selected(&self, index: usize) -> bool {
        *self.selected.borrow() == Some(index)
    }

    fn on_adapter_event(&self, index: usize, event: &WalletEvent) {
        match event {
            // the wallets list is live: detection changes are broadcast no
            // matter which wallet they belong to
            WalletEvent::ReadyStateChange(_) => self.emitter.emit(event),
            WalletEvent::Disconnect if self.is_selected(index) => {
                if self.phase.get() != Phase::Disconnecting {
                    // the wallet side hung up on its own
                    self.phase.set(Phase::Idle);
                    self.clear_selection();
                }
                self.emitter.emit(event);
            }
            WalletEvent::Error(_) if self.unloading.get() => {}
            _ if self.is_selected(index) => self.emitter.emit(event),
            _ => {}
        }
    }
}

/// Holds the currently selected wallet and mediates every operation on it.
///
/// The adapter list is supplied once at construction and never changes; the
/// connector does not own adapter lifetimes. Selecting a new wallet tears
/// the previous one down before the new connect begins.
pub struct Connector {
    inner: Rc<Inner>,
}

impl Connector {
    pub fn new(
        wallets: Vec<Rc<WalletAdapter>>,
        store: Rc<dyn SelectionStore>,
        scope: Rc<dyn HostScope>,
        options: ConnectorOptions,
    ) -> Self {
        let inner = Rc::new(Inner {
            wallets,
            selected: RefCell::new(None),
            phase: Cell::new(Phase::Idle),
            store,
            scope,
            emitter: EventEmitter::new(),
            unloading: Cell::new(false),
            options,
        });

        for (index, adapter) in inner.wallets.iter().enumerate() {
            let weak: Weak<Inner> = Rc::downgrade(&inner);
            adapter.on(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_adapter_event(index, event);
                }
            });
        }

        Connector { inner }
    }

    pub fn on(&self, listener: impl Fn(&WalletEvent) + 'static) -> ListenerId {
        self.inner.emitter.on(listener)
    }

    pub fn off(&self, id: ListenerId) {
        self.inner.emitter.off(id);
    }

    /// The registered wallets with their live detection state.
    pub fn wallets(&self) -> Vec<WalletSummary> {
        self.inner
            .wallets
            .iter()
            .map(|adapter| {
                let WalletDescriptor { name, url, icon } = adapter.descriptor().clone();
                WalletSummary {
                    name,
                    url,
                    icon,
                    ready_state: adapter.ready_state(),
                }
            })
            .collect()
    }

    pub fn selected_name(&self) -> Option<WalletName> {
        self.selected_adapter().map(|adapter| adapter.name().clone())
    }

    pub fn connected(&self) -> bool {
        self.inner.phase.get() == Phase::Connected
    }

    pub fn connecting(&self) -> bool {
        self.inner.phase.get() == Phase::Connecting
    }

    pub fn disconnecting(&self) -> bool {
        self.inner.phase.get() == Phase::Disconnecting
    }

    pub fn account(&self) -> Option<AccountKeys> {
        self.selected_adapter().and_then(|adapter| adapter.account())
    }

    pub fn network(&self) -> Option<NetworkInfo> {
        self.selected_adapter().and_then(|adapter| adapter.network())
    }

    /// Tell the connector the page is being torn down: in-flight vendor
    /// calls cannot be stopped, but the persisted selection stays put and
    /// errors are no longer surfaced.
    pub fn set_unloading(&self, unloading: bool) {
        self.inner.unloading.set(unloading);
    }

    fn selected_adapter(&self) -> Option<Rc<WalletAdapter>> {
        self.inner
            .selected
            .borrow()
            .map(|index| Rc::clone(&self.inner.wallets[index]))
    }

    /// Select the wallet called `name` and connect to it.
    ///
    /// No-op while a connect or disconnect is in flight, and when already
    /// connected to that same wallet. Connecting to a different wallet
    /// disconnects the current one first. An unknown name or a wallet that
    /// is not installed/loadable fails (clearing the persisted selection,
    /// and opening the install page when configured).
    pub async fn connect(&self, name: &str) -> Result<(), WalletError> {
        let inner = &self.inner;
        match inner.phase.get() {
            Phase::Connecting | Phase::Disconnecting => return Ok(()),
            Phase::Connected => {
                let same = inner
                    .selected
                    .borrow()
                    .map(|index| inner.wallets[index].name().as_str() == name)
                    .unwrap_or(false);
                if same {
                    return Ok(());
                }
            }
            Phase::Idle => {}
        }

        let Some(position) = inner
            .wallets
            .iter()
            .position(|adapter| adapter.name().as_str() == name)
        else {
            inner.store.remove(inner.options.storage_key);
            return Err(inner.report(WalletError::NotSelected));
        };

        let adapter = Rc::clone(&inner.wallets[position]);
        if !adapter.ready_state().is_connectable() {
            inner.store.remove(inner.options.storage_key);
            if inner.options.open_install_page && !adapter.url().is_empty() {
                inner.scope.open_url(adapter.url());
            }
            return Err(inner.report(WalletError::NotReady));
        }

        // tear the previous wallet down before the new connect begins
        let previous = inner
            .selected
            .borrow()
            .filter(|&index| index != position)
            .map(|index| Rc::clone(&inner.wallets[index]));
        if let Some(previous) = previous {
            log::debug!("switching wallets: disconnecting {}", previous.name());
            inner.phase.set(Phase::Disconnecting);
            previous.disconnect().await;
            *inner.selected.borrow_mut() = None;
        }

        *inner.selected.borrow_mut() = Some(position);
        inner.store.set(inner.options.storage_key, name);
        inner.phase.set(Phase::Connecting);

        match adapter.connect().await {
            Ok(()) => {
                inner.phase.set(Phase::Connected);
                Ok(())
            }
            Err(error) => {
                inner.phase.set(Phase::Idle);
                inner.clear_selection();
                Err(error)
            }
        }
    }

    /// Replay the persisted selection, typically once at startup. Nothing
    /// persisted is a successful no-op; a stale name clears itself through
    /// the regular connect failure path.
    pub async fn resume(&self) -> Result<(), WalletError> {
        let Some(name) = self.inner.store.get(self.inner.options.storage_key) else {
            return Ok(());
        };
        self.connect(&name).await
    }

    /// Disconnect the current wallet. With nothing selected this only drops
    /// the persisted selection.
    pub async fn disconnect(&self) {
        let inner = &self.inner;
        if inner.phase.get() == Phase::Disconnecting {
            return;
        }
        let Some(adapter) = self.selected_adapter() else {
            inner.store.remove(inner.options.storage_key);
            return;
        };

        inner.phase.set(Phase::Disconnecting);
        adapter.disconnect().await;
        inner.clear_selection();
        inner.phase.set(Phase::Idle);
    }

    pub async fn sign_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<Vec<u8>, WalletError> {
        let Some(adapter) = self.selected_adapter() else {
            return Err(self.inner.report(WalletError::NotSelected));
        };
        adapter.sign_transaction(payload, options).await
    }

    pub async fn sign_and_submit_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<PendingTransaction, WalletError> {
        let Some(adapter) = self.selected_adapter() else {
            return Err(self.inner.report(WalletError::NotSelected));
        };
        adapter.sign_and_submit_transaction(payload, options).await
    }

    pub async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> Result<SignedMessage, WalletError> {
        let Some(adapter) = self.selected_adapter() else {
            return Err(self.inner.report(WalletError::NotSelected));
        };
        adapter.sign_message(payload).await
    }
}
