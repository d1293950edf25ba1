//! [`VendorApi`] over a wallet extension's injected global object. One type
//! covers every injected wallet; the path of the global and the two behavior
//! flags are the only things that vary.

use async_trait::async_trait;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};

use crate::{
    account::{AccountKeys, NetworkInfo, PendingTransaction, SignMessagePayload, SignedMessage},
    error::VendorFailure,
    vendor::{
        AccountListener, DisconnectListener, NetworkListener, VendorApi, WatchSupport,
        account_from_value, network_from_value, pending_transaction_from_value,
        signed_bytes_from_value,
    },
};

pub struct InjectedApi {
    path: String,
    requires_nonce: bool,
}

impl InjectedApi {
    pub fn new(path: impl Into<String>) -> Self {
        InjectedApi {
            path: path.into(),
            requires_nonce: false,
        }
    }

    /// mark this wallet's message-signing protocol as demanding a nonce
    pub fn with_message_nonce(mut self) -> Self {
        self.requires_nonce = true;
        self
    }

    fn object(&self) -> Result<JsValue, VendorFailure> {
        super::lookup_global(&self.path).ok_or_else(|| {
            VendorFailure::other(format!("wallet object `{}' is not available", self.path))
        })
    }

    async fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, VendorFailure> {
        super::call_method(&self.object()?, method, args).await
    }

    async fn call_json(&self, method: &str, args: &[JsValue]) -> Result<Value, VendorFailure> {
        super::decode_json(self.call(method, args).await?)
    }

    fn encode(value: &impl serde::Serialize) -> Result<JsValue, VendorFailure> {
        serde_wasm_bindgen::to_value(value)
            .map_err(|error| VendorFailure::other(format!("couldn't encode the request: {error}")))
    }

    /// Hand `callback` to the wallet's `method` subscription entry point, if
    /// it has one. The callback stays registered for the page's lifetime.
    fn install_watch(
        &self,
        method: &str,
        callback: &JsValue,
    ) -> Result<WatchSupport, VendorFailure> {
        let target = self.object()?;
        let function = match js_sys::Reflect::get(&target, &JsValue::from_str(method)) {
            Ok(function) if function.is_function() => {
                function.unchecked_into::<js_sys::Function>()
            }
            _ => return Ok(WatchSupport::Unsupported),
        };
        function
            .call1(&target, callback)
            .map_err(super::decode_js_error)?;
        Ok(WatchSupport::Active)
    }
}

#[async_trait(?Send)]
impl VendorApi for InjectedApi {
    fn requires_message_nonce(&self) -> bool {
        self.requires_nonce
    }

    async fn is_connected(&self) -> Result<bool, VendorFailure> {
        let value = self.call("isConnected", &[]).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn connect(&self) -> Result<AccountKeys, VendorFailure> {
        account_from_value(self.call_json("connect", &[]).await?)
    }

    async fn disconnect(&self) -> Result<(), VendorFailure> {
        self.call("disconnect", &[]).await?;
        Ok(())
    }

    async fn account(&self) -> Result<AccountKeys, VendorFailure> {
        account_from_value(self.call_json("account", &[]).await?)
    }

    async fn network(&self) -> Result<NetworkInfo, VendorFailure> {
        network_from_value(self.call_json("network", &[]).await?)
    }

    async fn sign_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<Vec<u8>, VendorFailure> {
        let mut args = vec![Self::encode(payload)?];
        if let Some(options) = options {
            args.push(Self::encode(options)?);
        }
        let value = self.call("signTransaction", &args).await?;
        // most wallets hand the signed BCS bytes back as a Uint8Array; the
        // rest answer with hex or a plain array
        if let Ok(bytes) = value.clone().dyn_into::<js_sys::Uint8Array>() {
            return Ok(bytes.to_vec());
        }
        signed_bytes_from_value(super::decode_json(value)?)
    }

    async fn sign_and_submit(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<PendingTransaction, VendorFailure> {
        let mut args = vec![Self::encode(payload)?];
        if let Some(options) = options {
            args.push(Self::encode(options)?);
        }
        pending_transaction_from_value(self.call_json("signAndSubmitTransaction", &args).await?)
    }

    async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> Result<SignedMessage, VendorFailure> {
        let value = self.call_json("signMessage", &[Self::encode(payload)?]).await?;
        serde_json::from_value(value).map_err(|error| {
            VendorFailure::other(format!("couldn't decode the signed message: {error}"))
        })
    }

    fn watch_account(&self, listener: AccountListener) -> Result<WatchSupport, VendorFailure> {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            match serde_wasm_bindgen::from_value::<AccountKeys>(value) {
                Ok(keys) => listener(keys),
                Err(error) => log::warn!("couldn't decode an account change payload: {error}"),
            }
        });
        let support = self.install_watch("onAccountChange", closure.as_ref())?;
        if support == WatchSupport::Active {
            closure.forget();
        }
        Ok(support)
    }

    fn watch_network(&self, listener: NetworkListener) -> Result<WatchSupport, VendorFailure> {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let decoded = serde_wasm_bindgen::from_value::<Value>(value)
                .map_err(|error| VendorFailure::other(error.to_string()))
                .and_then(network_from_value);
            match decoded {
                Ok(info) => listener(info),
                Err(error) => log::warn!("couldn't decode a network change payload: {error}"),
            }
        });
        let support = self.install_watch("onNetworkChange", closure.as_ref())?;
        if support == WatchSupport::Active {
            closure.forget();
        }
        Ok(support)
    }

    fn watch_disconnect(
        &self,
        listener: DisconnectListener,
    ) -> Result<WatchSupport, VendorFailure> {
        let closure = Closure::<dyn FnMut()>::new(move || listener());
        let support = self.install_watch("onDisconnect", closure.as_ref())?;
        if support == WatchSupport::Active {
            closure.forget();
        }
        Ok(support)
    }
}
