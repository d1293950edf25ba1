//! [`VendorApi`] over a hosted web wallet: the wallet's page is opened in a
//! separate window and every operation is a message round-trip with it. The
//! protocol itself (origin check, pending-operation slot) lives in
//! [`crate::popup`]; this is the wiring to the real windows.

use std::{cell::RefCell, rc::Rc};

use async_trait::async_trait;
use serde_json::{Value, json};
use wasm_bindgen::{JsCast, closure::Closure};

use crate::{
    account::{AccountKeys, NetworkInfo, PendingTransaction, SignMessagePayload, SignedMessage},
    env::{Disposer, HostScope},
    error::VendorFailure,
    popup::{Bridge, BridgeNotice, CLOSED_POLL_MS, OpKind, origin_of},
    vendor::{
        AccountListener, DisconnectListener, NetworkListener, VendorApi, WatchSupport,
        account_from_value, network_from_value, pending_transaction_from_value,
        signed_bytes_from_value,
    },
};

pub struct PopupApi {
    wallet_url: String,
    requires_nonce: bool,
    bridge: Rc<Bridge>,
    scope: Rc<dyn HostScope>,
    popup: RefCell<Option<web_sys::Window>>,
    listener: RefCell<Option<Closure<dyn FnMut(web_sys::MessageEvent)>>>,
    closed_poll: RefCell<Option<Disposer>>,
    account_listener: Rc<RefCell<Option<AccountListener>>>,
    disconnect_listener: Rc<RefCell<Option<DisconnectListener>>>,
}

impl PopupApi {
    pub fn new(wallet_url: impl Into<String>, scope: Rc<dyn HostScope>) -> Self {
        let wallet_url = wallet_url.into();
        // a URL we cannot derive an origin from never matches a real
        // message origin, so every incoming message would be ignored
        let origin = origin_of(&wallet_url)
            .unwrap_or_else(|_| wallet_url.trim_end_matches('/').to_owned());
        PopupApi {
            wallet_url,
            requires_nonce: false,
            bridge: Rc::new(Bridge::new(origin)),
            scope,
            popup: RefCell::new(None),
            listener: RefCell::new(None),
            closed_poll: RefCell::new(None),
            account_listener: Rc::new(RefCell::new(None)),
            disconnect_listener: Rc::new(RefCell::new(None)),
        }
    }

    /// mark this wallet's message-signing protocol as demanding a nonce
    pub fn with_message_nonce(mut self) -> Self {
        self.requires_nonce = true;
        self
    }

    fn session_open(&self) -> bool {
        self.popup
            .borrow()
            .as_ref()
            .map(|popup| !popup.closed().unwrap_or(true))
            .unwrap_or(false)
    }

    fn ensure_session(&self) -> Result<web_sys::Window, VendorFailure> {
        if let Some(popup) = self.popup.borrow().as_ref() {
            if !popup.closed().unwrap_or(true) {
                return Ok(popup.clone());
            }
        }

        let window =
            web_sys::window().ok_or_else(|| VendorFailure::other("no window object"))?;
        let popup = window
            .open_with_url_and_target(&self.wallet_url, "_blank")
            .map_err(super::decode_js_error)?
            .ok_or_else(|| {
                VendorFailure::other("the wallet window could not be opened (popup blocked?)")
            })?;

        self.install_listener(&window)?;
        self.install_closed_poll(popup.clone());
        *self.popup.borrow_mut() = Some(popup.clone());
        Ok(popup)
    }

    fn install_listener(&self, window: &web_sys::Window) -> Result<(), VendorFailure> {
        if self.listener.borrow().is_some() {
            return Ok(());
        }
        let bridge = Rc::clone(&self.bridge);
        let on_account = Rc::clone(&self.account_listener);
        let on_disconnect = Rc::clone(&self.disconnect_listener);
        let closure = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let Ok(data) = serde_wasm_bindgen::from_value::<Value>(event.data()) else {
                    return;
                };
                match bridge.accept(&event.origin(), &data) {
                    Some(BridgeNotice::Disconnected) => {
                        if let Some(listener) = on_disconnect.borrow().as_ref() {
                            listener();
                        }
                    }
                    Some(BridgeNotice::AccountChange(payload)) => {
                        match account_from_value(payload) {
                            Ok(keys) => {
                                if let Some(listener) = on_account.borrow().as_ref() {
                                    listener(keys);
                                }
                            }
                            Err(error) => {
                                log::warn!("couldn't decode an account notice: {error}");
                            }
                        }
                    }
                    None => {}
                }
            },
        );
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .map_err(super::decode_js_error)?;
        *self.listener.borrow_mut() = Some(closure);
        Ok(())
    }

    /// The wallet window can be closed by the user without ever answering;
    /// polling for that is what turns an abandoned operation into a failure
    /// instead of a promise that hangs forever.
    fn install_closed_poll(&self, popup: web_sys::Window) {
        let bridge = Rc::clone(&self.bridge);
        let callback: Rc<dyn Fn()> = Rc::new(move || {
            if popup.closed().unwrap_or(true) {
                bridge.abort("the wallet window was closed before answering");
            }
        });
        *self.closed_poll.borrow_mut() =
            Some(self.scope.set_interval(CLOSED_POLL_MS, callback));
    }

    fn teardown(&self) {
        if let Some(closure) = self.listener.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "message",
                    closure.as_ref().unchecked_ref(),
                );
            }
        }
        if let Some(poll) = self.closed_poll.borrow_mut().take() {
            poll.dispose();
        }
        *self.popup.borrow_mut() = None;
    }

    async fn request(&self, kind: OpKind, message: Value) -> Result<Value, VendorFailure> {
        let popup = self.ensure_session()?;
        let rx = self.bridge.begin(kind);
        let payload = serde_wasm_bindgen::to_value(&message)
            .map_err(|error| VendorFailure::other(format!("couldn't encode the request: {error}")))?;
        popup
            .post_message(&payload, self.bridge.origin())
            .map_err(super::decode_js_error)?;
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(VendorFailure::other(
                "the wallet window went away before answering",
            )),
        }
    }
}

#[async_trait(?Send)]
impl VendorApi for PopupApi {
    fn requires_message_nonce(&self) -> bool {
        self.requires_nonce
    }

    async fn is_connected(&self) -> Result<bool, VendorFailure> {
        Ok(self.session_open())
    }

    async fn connect(&self) -> Result<AccountKeys, VendorFailure> {
        account_from_value(
            self.request(OpKind::Connect, json!({ "method": "connect" }))
                .await?,
        )
    }

    async fn disconnect(&self) -> Result<(), VendorFailure> {
        if self.popup.borrow().is_none() {
            return Ok(());
        }
        let outcome = self
            .request(OpKind::Disconnect, json!({ "method": "disconnect" }))
            .await;
        self.teardown();
        outcome.map(|_| ())
    }

    async fn account(&self) -> Result<AccountKeys, VendorFailure> {
        account_from_value(
            self.request(OpKind::Request, json!({ "method": "account" }))
                .await?,
        )
    }

    async fn network(&self) -> Result<NetworkInfo, VendorFailure> {
        network_from_value(
            self.request(OpKind::Request, json!({ "method": "network" }))
                .await?,
        )
    }

    async fn sign_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<Vec<u8>, VendorFailure> {
        signed_bytes_from_value(
            self.request(
                OpKind::Request,
                json!({
                    "method": "signTransaction",
                    "payload": payload,
                    "options": options,
                }),
            )
            .await?,
        )
    }

    async fn sign_and_submit(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<PendingTransaction, VendorFailure> {
        pending_transaction_from_value(
            self.request(
                OpKind::Request,
                json!({
                    "method": "signAndSubmitTransaction",
                    "payload": payload,
                    "options": options,
                }),
            )
            .await?,
        )
    }

    async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> Result<SignedMessage, VendorFailure> {
        let value = self
            .request(
                OpKind::Request,
                json!({ "method": "signMessage", "payload": payload }),
            )
            .await?;
        serde_json::from_value(value).map_err(|error| {
            VendorFailure::other(format!("couldn't decode the signed message: {error}"))
        })
    }

    fn watch_account(&self, listener: AccountListener) -> Result<WatchSupport, VendorFailure> {
        *self.account_listener.borrow_mut() = Some(listener);
        Ok(WatchSupport::Active)
    }

    fn watch_network(&self, _listener: NetworkListener) -> Result<WatchSupport, VendorFailure> {
        // the message protocol has no network notices
        Ok(WatchSupport::Unsupported)
    }

    fn watch_disconnect(
        &self,
        listener: DisconnectListener,
    ) -> Result<WatchSupport, VendorFailure> {
        *self.disconnect_listener.borrow_mut() = Some(listener);
        Ok(WatchSupport::Active)
    }
}
