//! Scripted stand-ins for the host environment and the wallet applications,
//! shared by the unit tests.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    account::{AccountKeys, NetworkInfo, PendingTransaction, SignMessagePayload, SignedMessage},
    env::{Disposer, HostScope},
    error::{VendorError, VendorErrorCode, VendorFailure},
    vendor::{AccountListener, DisconnectListener, NetworkListener, VendorApi, WatchSupport},
};

struct Hook {
    callback: Rc<dyn Fn()>,
    alive: Rc<Cell<bool>>,
}

/// A host scope driven by hand: tests flip the flags and fire the hooks.
pub(crate) struct FakeScope {
    pub present: Cell<bool>,
    pub windowed: Cell<bool>,
    pub loading: Cell<bool>,
    pub loaded: Cell<bool>,
    pub opened: RefCell<Vec<String>>,
    intervals: RefCell<Vec<Hook>>,
    ready_hooks: RefCell<Vec<Hook>>,
    load_hooks: RefCell<Vec<Hook>>,
}

impl FakeScope {
    fn new(present: bool) -> Self {
        FakeScope {
            present: Cell::new(present),
            windowed: Cell::new(true),
            loading: Cell::new(false),
            loaded: Cell::new(true),
            opened: RefCell::new(Vec::new()),
            intervals: RefCell::new(Vec::new()),
            ready_hooks: RefCell::new(Vec::new()),
            load_hooks: RefCell::new(Vec::new()),
        }
    }

    /// the wallet object is already present
    pub fn installed() -> Self {
        FakeScope::new(true)
    }

    /// no wallet object (yet)
    pub fn absent() -> Self {
        FakeScope::new(false)
    }

    /// no window at all
    pub fn headless() -> Self {
        let scope = FakeScope::new(false);
        scope.windowed.set(false);
        scope
    }

    fn register(registry: &RefCell<Vec<Hook>>, callback: Rc<dyn Fn()>) -> Disposer {
        let alive = Rc::new(Cell::new(true));
        registry.borrow_mut().push(Hook {
            callback,
            alive: Rc::clone(&alive),
        });
        Disposer::new(move || alive.set(false))
    }

    fn fire(registry: &RefCell<Vec<Hook>>) {
        let callbacks: Vec<_> = registry
            .borrow()
            .iter()
            .filter(|hook| hook.alive.get())
            .map(|hook| Rc::clone(&hook.callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// fire every live interval once
    pub fn tick(&self) {
        Self::fire(&self.intervals);
    }

    pub fn fire_document_ready(&self) {
        Self::fire(&self.ready_hooks);
    }

    pub fn fire_window_load(&self) {
        Self::fire(&self.load_hooks);
    }

    pub fn live_registrations(&self) -> usize {
        [&self.intervals, &self.ready_hooks, &self.load_hooks]
            .iter()
            .map(|registry| {
                registry
                    .borrow()
                    .iter()
                    .filter(|hook| hook.alive.get())
                    .count()
            })
            .sum()
    }
}

impl HostScope for FakeScope {
    fn has_window(&self) -> bool {
        self.windowed.get()
    }

    fn probe(&self, _path: &str) -> bool {
        self.present.get()
    }

    fn document_loading(&self) -> bool {
        self.loading.get()
    }

    fn window_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn set_interval(&self, _millis: u32, callback: Rc<dyn Fn()>) -> Disposer {
        Self::register(&self.intervals, callback)
    }

    fn on_document_ready(&self, callback: Rc<dyn Fn()>) -> Disposer {
        Self::register(&self.ready_hooks, callback)
    }

    fn on_window_load(&self, callback: Rc<dyn Fn()>) -> Disposer {
        Self::register(&self.load_hooks, callback)
    }

    fn open_url(&self, url: &str) {
        self.opened.borrow_mut().push(url.to_owned());
    }
}

pub(crate) fn sample_keys() -> AccountKeys {
    AccountKeys {
        public_key: Some("0xfeedface".to_owned()),
        address: Some("0xa11ce".to_owned()),
        auth_key: Some("0xa11ce".to_owned()),
        min_keys_required: None,
    }
}

pub(crate) fn user_rejection() -> VendorFailure {
    VendorFailure::Api(VendorError {
        code: VendorErrorCode::UserRejected,
        message: "The user rejected the request".to_owned(),
    })
}

/// A wallet application with scripted outcomes. `journal` records the calls
/// (prefixed with `label`) so tests can assert ordering across vendors.
pub(crate) struct MockVendor {
    pub label: String,
    pub journal: Rc<RefCell<Vec<String>>>,
    pub vendor_connected: Cell<bool>,
    pub fail_connect: Cell<bool>,
    pub fail_disconnect: Cell<bool>,
    pub fail_sign: Cell<bool>,
    pub nonce_required: Cell<bool>,
    pub connect_count: Cell<u32>,
    pub disconnect_count: Cell<u32>,
    pub sign_count: Cell<u32>,
    pub account_listener: RefCell<Option<AccountListener>>,
    pub network_listener: RefCell<Option<NetworkListener>>,
    pub disconnect_listener: RefCell<Option<DisconnectListener>>,
    pub account_watch_count: Cell<u32>,
}

impl MockVendor {
    pub fn new(label: &str) -> Rc<Self> {
        Self::with_journal(label, Rc::new(RefCell::new(Vec::new())))
    }

    pub fn with_journal(label: &str, journal: Rc<RefCell<Vec<String>>>) -> Rc<Self> {
        Rc::new(MockVendor {
            label: label.to_owned(),
            journal,
            vendor_connected: Cell::new(false),
            fail_connect: Cell::new(false),
            fail_disconnect: Cell::new(false),
            fail_sign: Cell::new(false),
            nonce_required: Cell::new(false),
            connect_count: Cell::new(0),
            disconnect_count: Cell::new(0),
            sign_count: Cell::new(0),
            account_listener: RefCell::new(None),
            network_listener: RefCell::new(None),
            disconnect_listener: RefCell::new(None),
            account_watch_count: Cell::new(0),
        })
    }

    fn note(&self, action: &str) {
        self.journal
            .borrow_mut()
            .push(format!("{}:{action}", self.label));
    }

    pub fn fire_disconnect(&self) {
        if let Some(listener) = self.disconnect_listener.borrow().as_ref() {
            listener();
        }
    }

    pub fn fire_account_change(&self, keys: AccountKeys) {
        if let Some(listener) = self.account_listener.borrow().as_ref() {
            listener(keys);
        }
    }

    pub fn fire_network_change(&self, info: NetworkInfo) {
        if let Some(listener) = self.network_listener.borrow().as_ref() {
            listener(info);
        }
    }
}

#[async_trait(?Send)]
impl VendorApi for MockVendor {
    fn requires_message_nonce(&self) -> bool {
        self.nonce_required.get()
    }

    async fn is_connected(&self) -> Result<bool, VendorFailure> {
        Ok(self.vendor_connected.get())
    }

    async fn connect(&self) -> Result<AccountKeys, VendorFailure> {
        self.note("connect");
        self.connect_count.set(self.connect_count.get() + 1);
        if self.fail_connect.get() {
            return Err(user_rejection());
        }
        self.vendor_connected.set(true);
        Ok(sample_keys())
    }

    async fn disconnect(&self) -> Result<(), VendorFailure> {
        self.note("disconnect");
        self.disconnect_count.set(self.disconnect_count.get() + 1);
        self.vendor_connected.set(false);
        if self.fail_disconnect.get() {
            return Err(VendorFailure::other("the wallet refused to disconnect"));
        }
        Ok(())
    }

    async fn account(&self) -> Result<AccountKeys, VendorFailure> {
        Ok(sample_keys())
    }

    async fn network(&self) -> Result<NetworkInfo, VendorFailure> {
        Ok(NetworkInfo {
            name: Some("Mainnet".to_owned()),
            api: None,
            chain_id: Some("1".to_owned()),
        })
    }

    async fn sign_transaction(
        &self,
        _payload: &Value,
        _options: Option<&Value>,
    ) -> Result<Vec<u8>, VendorFailure> {
        self.note("sign");
        self.sign_count.set(self.sign_count.get() + 1);
        if self.fail_sign.get() {
            return Err(user_rejection());
        }
        Ok(vec![0xde, 0xad, 0xbe, 0xef])
    }

    async fn sign_and_submit(
        &self,
        _payload: &Value,
        _options: Option<&Value>,
    ) -> Result<PendingTransaction, VendorFailure> {
        self.note("submit");
        self.sign_count.set(self.sign_count.get() + 1);
        if self.fail_sign.get() {
            return Err(user_rejection());
        }
        Ok(PendingTransaction {
            hash: "0x1234".to_owned(),
        })
    }

    async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> Result<SignedMessage, VendorFailure> {
        self.note("sign-message");
        self.sign_count.set(self.sign_count.get() + 1);
        if self.fail_sign.get() {
            return Err(user_rejection());
        }
        Ok(SignedMessage {
            message: payload.message.clone(),
            nonce: payload.nonce.clone(),
            full_message: format!("APTOS\n{}", payload.message),
            prefix: "APTOS".to_owned(),
            signature: "0x5160".to_owned(),
            ..SignedMessage::default()
        })
    }

    fn watch_account(&self, listener: AccountListener) -> Result<WatchSupport, VendorFailure> {
        self.account_watch_count
            .set(self.account_watch_count.get() + 1);
        *self.account_listener.borrow_mut() = Some(listener);
        Ok(WatchSupport::Active)
    }

    fn watch_network(&self, listener: NetworkListener) -> Result<WatchSupport, VendorFailure> {
        *self.network_listener.borrow_mut() = Some(listener);
        Ok(WatchSupport::Active)
    }

    fn watch_disconnect(
        &self,
        listener: DisconnectListener,
    ) -> Result<WatchSupport, VendorFailure> {
        *self.disconnect_listener.borrow_mut() = Some(listener);
        Ok(WatchSupport::Active)
    }
}
