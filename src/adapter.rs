//! The one adapter type. Everything a wallet integration varies in — the
//! injected path, the response shapes, whether a stale vendor session must be
//! torn down before connecting — lives in its [`AdapterConfig`] and its
//! [`VendorApi`] shim; the lifecycle rules here are shared by every wallet.

use std::{
    cell::RefCell,
    rc::Rc,
};

use serde_json::Value;

use crate::{
    account::{
        AccountKeys, NetworkInfo, PendingTransaction, ReadyState, SignMessagePayload,
        SignedMessage, WalletDescriptor, WalletName,
    },
    detect::Scout,
    env::HostScope,
    error::{VendorFailure, WalletError},
    events::{EventEmitter, ListenerId, WalletEvent},
    vendor::{AccountListener, DisconnectListener, NetworkListener, VendorApi},
};

/// Construction-time knobs of one wallet integration.
pub struct AdapterConfig {
    pub descriptor: WalletDescriptor,
    /// dotted path of the wallet's injected global object; `None` for
    /// wallets that need no installation and are always loadable on demand
    pub injected_path: Option<String>,
    /// disconnect first when the wallet already reports a live session, to
    /// dodge "already connected" rejections from the vendor side
    pub reconnect_policy: bool,
}

#[derive(Default)]
struct AdapterState {
    ready: ReadyState,
    connecting: bool,
    account: Option<AccountKeys>,
    network: Option<NetworkInfo>,
    watching_account: bool,
    watching_network: bool,
    watching_disconnect: bool,
}

/// A live wallet integration: one per supported wallet, constructed at
/// application startup and kept for the page's lifetime. Detection of the
/// injected object starts at construction; an account exists only between a
/// successful `connect` and the next disconnect.
pub struct WalletAdapter {
    descriptor: WalletDescriptor,
    reconnect_policy: bool,
    vendor: Rc<dyn VendorApi>,
    emitter: EventEmitter,
    state: Rc<RefCell<AdapterState>>,
    // kept alive so detection keeps running for the adapter's lifetime
    #[allow(dead_code)]
    scout: RefCell<Option<Scout>>,
}

impl WalletAdapter {
    pub fn new(
        config: AdapterConfig,
        vendor: Rc<dyn VendorApi>,
        scope: Rc<dyn HostScope>,
    ) -> Self {
        let adapter = WalletAdapter {
            descriptor: config.descriptor,
            reconnect_policy: config.reconnect_policy,
            vendor,
            emitter: EventEmitter::new(),
            state: Rc::new(RefCell::new(AdapterState::default())),
            scout: RefCell::new(None),
        };
        adapter.begin_detection(config.injected_path, scope);
        adapter
    }

    fn begin_detection(&self, injected_path: Option<String>, scope: Rc<dyn HostScope>) {
        if !scope.has_window() {
            self.state.borrow_mut().ready = ReadyState::Unsupported;
            return;
        }
        let Some(path) = injected_path else {
            self.state.borrow_mut().ready = ReadyState::Loadable;
            return;
        };

        let state = Rc::clone(&self.state);
        let emitter = self.emitter.clone();
        let scout = Scout::watch(scope, &path, move || {
            state.borrow_mut().ready = ReadyState::Installed;
            emitter.emit(&WalletEvent::ReadyStateChange(ReadyState::Installed));
        });
        *self.scout.borrow_mut() = Some(scout);
    }

    pub fn descriptor(&self) -> &WalletDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &WalletName {
        &self.descriptor.name
    }

    pub fn url(&self) -> &str {
        &self.descriptor.url
    }

    pub fn icon(&self) -> &str {
        &self.descriptor.icon
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready
    }

    pub fn connecting(&self) -> bool {
        self.state.borrow().connecting
    }

    pub fn connected(&self) -> bool {
        self.state.borrow().account.is_some()
    }

    pub fn account(&self) -> Option<AccountKeys> {
        self.state.borrow().account.clone()
    }

    pub fn network(&self) -> Option<NetworkInfo> {
        self.state.borrow().network.clone()
    }

    pub fn on(&self, listener: impl Fn(&WalletEvent) + 'static) -> ListenerId {
        self.emitter.on(listener)
    }

    pub fn off(&self, id: ListenerId) {
        self.emitter.off(id);
    }

    /// publish the error for passive observers, then hand it back so the
    /// caller's result carries the same value
    fn report(&self, error: WalletError) -> WalletError {
        log::warn!("{}: {error}", self.descriptor.name);
        self.emitter.emit(&WalletEvent::Error(error.clone()));
        error
    }

    fn ensure_connected(&self) -> Result<(), WalletError> {
        if self.connected() {
            Ok(())
        } else {
            Err(self.report(WalletError::NotConnected))
        }
    }

    /// Connect to the wallet. A no-op when already connected or while a
    /// connect is in flight; fails without touching the vendor when the
    /// wallet is neither installed nor loadable.
    pub async fn connect(&self) -> Result<(), WalletError> {
        if self.connected() || self.connecting() {
            return Ok(());
        }
        if !self.ready_state().is_connectable() {
            return Err(self.report(WalletError::NotReady));
        }

        self.state.borrow_mut().connecting = true;
        let outcome = self.vendor_connect().await;
        self.state.borrow_mut().connecting = false;

        match outcome {
            Ok(keys) => {
                log::debug!("{}: connected", self.descriptor.name);
                let public_key = keys.public_key.clone();
                self.state.borrow_mut().account = Some(keys);
                self.emitter.emit(&WalletEvent::Connect { public_key });
                if let Ok(info) = self.vendor.network().await {
                    self.state.borrow_mut().network = Some(info);
                }
                self.watch_vendor_disconnect();
                Ok(())
            }
            Err(failure) => Err(self.report(WalletError::ConnectionFailed(failure))),
        }
    }

    async fn vendor_connect(&self) -> Result<AccountKeys, VendorFailure> {
        if self.reconnect_policy && self.vendor.is_connected().await.unwrap_or(false) {
            self.vendor.disconnect().await?;
        }
        self.vendor.connect().await
    }

    fn watch_vendor_disconnect(&self) {
        if self.state.borrow().watching_disconnect {
            return;
        }
        let state = Rc::clone(&self.state);
        let emitter = self.emitter.clone();
        let listener: DisconnectListener = Box::new(move || {
            if state.borrow().account.is_none() {
                return;
            }
            let mut state = state.borrow_mut();
            state.account = None;
            state.network = None;
            drop(state);
            emitter.emit(&WalletEvent::Disconnect);
        });
        match self.vendor.watch_disconnect(listener) {
            Ok(crate::vendor::WatchSupport::Active) => {
                self.state.borrow_mut().watching_disconnect = true;
            }
            Ok(crate::vendor::WatchSupport::Unsupported) => {}
            Err(failure) => {
                log::debug!("{}: no disconnect watch: {failure}", self.descriptor.name);
            }
        }
    }

    /// Disconnect from the wallet. Best effort: a vendor failure is reported
    /// through the error channel only, the local state is cleared either
    /// way, and exactly one `Disconnect` event fires.
    pub async fn disconnect(&self) {
        // clear the account before the vendor call so nothing observes a
        // half-disconnected identity from an event handler
        {
            let mut state = self.state.borrow_mut();
            state.account = None;
            state.network = None;
        }
        if let Err(failure) = self.vendor.disconnect().await {
            let error = WalletError::DisconnectionFailed(failure);
            log::warn!("{}: {error}", self.descriptor.name);
            self.emitter.emit(&WalletEvent::Error(error));
        }
        self.emitter.emit(&WalletEvent::Disconnect);
    }

    pub async fn sign_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<Vec<u8>, WalletError> {
        self.ensure_connected()?;
        self.vendor
            .sign_transaction(payload, options)
            .await
            .map_err(|failure| self.report(WalletError::SignTransactionFailed(failure)))
    }

    pub async fn sign_and_submit_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<PendingTransaction, WalletError> {
        self.ensure_connected()?;
        self.vendor
            .sign_and_submit(payload, options)
            .await
            .map_err(|failure| self.report(WalletError::SignAndSubmitFailed(failure)))
    }

    pub async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> Result<SignedMessage, WalletError> {
        self.ensure_connected()?;
        if self.vendor.requires_message_nonce()
            && payload.nonce.as_deref().unwrap_or("").is_empty()
        {
            return Err(self.report(WalletError::SignMessageFailed(VendorFailure::other(
                "this wallet requires a nonce to sign a message",
            ))));
        }
        self.vendor
            .sign_message(payload)
            .await
            .map_err(|failure| self.report(WalletError::SignMessageFailed(failure)))
    }

    /// Ask the wallet for the network it is pointed at, refreshing the
    /// cached value.
    pub async fn fetch_network(&self) -> Result<NetworkInfo, WalletError> {
        self.ensure_connected()?;
        match self.vendor.network().await {
            Ok(info) => {
                self.state.borrow_mut().network = Some(info.clone());
                Ok(info)
            }
            Err(failure) => Err(self.report(WalletError::GetNetworkFailed(failure))),
        }
    }

    /// Mirror the wallet's own account switches into local state and an
    /// `AccountChange` event. Idempotent; a wallet without change
    /// notifications makes this a successful no-op.
    pub fn on_account_change(&self) -> Result<(), WalletError> {
        self.ensure_connected()?;
        if self.state.borrow().watching_account {
            return Ok(());
        }
        let state = Rc::clone(&self.state);
        let emitter = self.emitter.clone();
        let listener: AccountListener = Box::new(move |keys: AccountKeys| {
            state.borrow_mut().account = Some(keys.clone());
            emitter.emit(&WalletEvent::AccountChange(keys));
        });
        match self.vendor.watch_account(listener) {
            Ok(_) => {
                self.state.borrow_mut().watching_account = true;
                Ok(())
            }
            Err(failure) => Err(self.report(WalletError::AccountChangeFailed(failure))),
        }
    }

    /// Same as [`WalletAdapter::on_account_change`], for network switches.
    pub fn on_network_change(&self) -> Result<(), WalletError> {
        self.ensure_connected()?;
        if self.state.borrow().watching_network {
            return Ok(());
        }
        let state = Rc::clone(&self.state);
        let emitter = self.emitter.clone();
        let listener: NetworkListener = Box::new(move |info: NetworkInfo| {
            state.borrow_mut().network = Some(info.clone());
            emitter.emit(&WalletEvent::NetworkChange(info));
        });
        match self.vendor.watch_network(listener) {
            Ok(_) => {
                self.state.borrow_mut().watching_network = true;
                Ok(())
            }
            Err(failure) => Err(self.report(WalletError::NetworkChangeFailed(failure))),
        }
    }
}
