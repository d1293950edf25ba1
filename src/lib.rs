/*!

# Aptos wallet connector

This library is meant to be used by web applications that need to interact
with Aptos wallets. The wallet extensions all expose roughly the same
operations but disagree on everything else — object shapes, entry point
names, whether a call returns a promise; this crate normalizes them behind
one adapter type and tracks the connection lifecycle for the application.

## Features

- Detect which wallets are installed, including extensions that inject late
- Connect and disconnect, with the selection remembered across reloads
- Sign transactions, sign and submit transactions, sign messages
- Follow wallet-side account, network and disconnect notifications
- Hosted web wallets (no extension) through a message-passing window

## Usage

Build the connector once at startup from the wallets you want to offer, and
resume whatever the user had selected last time:

```no_run
use std::rc::Rc;

use aptos_connector::{Connector, ConnectorOptions, WalletEvent};
use aptos_connector::env::NullScope;
use aptos_connector::store::MemoryStore;

# async fn demo() -> anyhow::Result<()> {
let scope = Rc::new(NullScope);
let connector = Connector::new(
    Vec::new(), // on a browser target: registry::all(&scope)
    Rc::new(MemoryStore::default()),
    scope,
    ConnectorOptions::default(),
);

connector.on(|event| {
    if let WalletEvent::Error(error) = event {
        log::warn!("wallet: {error}");
    }
});

let _ = connector.resume().await;
for wallet in connector.wallets() {
    println!("{} ({})", wallet.name, wallet.ready_state);
}
# Ok(()) }
```

On a `wasm32` target the [`registry`] module supplies adapters for the known
wallets, [`env::BrowserScope`] the real host access, and
[`store::LocalStorageStore`] the persistence. Connecting, signing and
submitting then all go through the [`Connector`]:

```ignore
connector.connect("Petra").await?;
let pending = connector
    .sign_and_submit_transaction(&payload, None)
    .await?;
println!("submitted: {}", pending.hash);
```

Every failure is reported twice: rejected to the caller, and emitted as a
[`WalletEvent::Error`] for passive observers such as a toast handler — both
carry the same error value.

*/

pub mod account;
pub mod adapter;
pub mod connector;
pub mod detect;
pub mod env;
pub mod error;
pub mod events;
#[cfg(target_arch = "wasm32")]
pub mod ffi;
pub mod popup;
#[cfg(target_arch = "wasm32")]
pub mod registry;
pub mod store;
pub mod vendor;

#[cfg(test)]
pub(crate) mod mock;

pub use self::{
    account::{
        AccountKeys, NetworkInfo, PendingTransaction, ReadyState, SignMessagePayload,
        SignedMessage, WalletDescriptor, WalletName,
    },
    adapter::{AdapterConfig, WalletAdapter},
    connector::{Connector, ConnectorOptions, WalletSummary},
    error::{VendorError, VendorErrorCode, VendorFailure, WalletError},
    events::{EventEmitter, ListenerId, WalletEvent},
    vendor::{VendorApi, WatchSupport},
};
