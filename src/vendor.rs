//! The shim every wallet application is driven through. One adapter
//! parameterized by this trait replaces a class per vendor: the trait carries
//! the five operations plus the optional change subscriptions, and the free
//! functions below absorb the response-shape drift between vendors.

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    account::{AccountKeys, NetworkInfo, PendingTransaction, SignMessagePayload, SignedMessage},
    error::VendorFailure,
};

pub type AccountListener = Box<dyn Fn(AccountKeys)>;
pub type NetworkListener = Box<dyn Fn(NetworkInfo)>;
pub type DisconnectListener = Box<dyn Fn()>;

/// Whether a change subscription was actually installed. Several wallets
/// simply have no change notifications; asking for one is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSupport {
    Active,
    Unsupported,
}

/// One wallet application, behind whatever transport it uses (injected
/// global object, or a hosted window reached by message passing).
///
/// Transaction payloads pass through as opaque JSON; building and encoding
/// them is the caller's business, not the connector's.
#[async_trait(?Send)]
pub trait VendorApi {
    /// true when the wallet's message-signing protocol demands an
    /// anti-replay nonce in the payload
    fn requires_message_nonce(&self) -> bool {
        false
    }

    async fn is_connected(&self) -> Result<bool, VendorFailure>;

    async fn connect(&self) -> Result<AccountKeys, VendorFailure>;

    async fn disconnect(&self) -> Result<(), VendorFailure>;

    async fn account(&self) -> Result<AccountKeys, VendorFailure>;

    async fn network(&self) -> Result<NetworkInfo, VendorFailure>;

    async fn sign_transaction(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<Vec<u8>, VendorFailure>;

    async fn sign_and_submit(
        &self,
        payload: &Value,
        options: Option<&Value>,
    ) -> Result<PendingTransaction, VendorFailure>;

    async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> Result<SignedMessage, VendorFailure>;

    fn watch_account(&self, listener: AccountListener) -> Result<WatchSupport, VendorFailure> {
        let _ = listener;
        Ok(WatchSupport::Unsupported)
    }

    fn watch_network(&self, listener: NetworkListener) -> Result<WatchSupport, VendorFailure> {
        let _ = listener;
        Ok(WatchSupport::Unsupported)
    }

    fn watch_disconnect(&self, listener: DisconnectListener) -> Result<WatchSupport, VendorFailure> {
        let _ = listener;
        Ok(WatchSupport::Unsupported)
    }
}

fn decode_error(what: &str, error: impl std::fmt::Display) -> VendorFailure {
    VendorFailure::other(format!("couldn't decode the {what}: {error}"))
}

/// decode an account response, whichever spelling the vendor used
pub fn account_from_value(value: Value) -> Result<AccountKeys, VendorFailure> {
    serde_json::from_value(value).map_err(|error| decode_error("account response", error))
}

/// decode a network response; some vendors answer with the bare network name
/// instead of an object
pub fn network_from_value(value: Value) -> Result<NetworkInfo, VendorFailure> {
    if let Value::String(name) = value {
        return Ok(NetworkInfo {
            name: Some(name),
            ..NetworkInfo::default()
        });
    }
    serde_json::from_value(value).map_err(|error| decode_error("network response", error))
}

/// decode signed transaction bytes, given either a hex string (with or
/// without the `0x` prefix) or a plain byte array
pub fn signed_bytes_from_value(value: Value) -> Result<Vec<u8>, VendorFailure> {
    if let Value::String(text) = &value {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        return hex::decode(stripped)
            .map_err(|error| decode_error("signed transaction bytes", error));
    }
    serde_json::from_value(value).map_err(|error| decode_error("signed transaction bytes", error))
}

/// decode a submission response, given either the bare hash or an object
/// carrying it
pub fn pending_transaction_from_value(value: Value) -> Result<PendingTransaction, VendorFailure> {
    if let Value::String(hash) = value {
        return Ok(PendingTransaction { hash });
    }
    serde_json::from_value(value).map_err(|error| decode_error("submission response", error))
}
