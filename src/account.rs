use core::fmt;

/// The unique identifier of a wallet application, as shown to the user and as
/// persisted across page reloads.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct WalletName(String);

impl WalletName {
    pub fn new(name: impl Into<String>) -> Self {
        WalletName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletName {
    fn from(name: &str) -> Self {
        WalletName(name.to_owned())
    }
}

impl From<String> for WalletName {
    fn from(name: String) -> Self {
        WalletName(name)
    }
}

/// Whether a wallet application can currently be connected to in this host.
///
/// `NotDetected` may move to `Installed` once the extension injects its
/// object (extensions can inject late, after our code already ran).
/// `Unsupported` is terminal: a host without a window object will never grow
/// one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ReadyState {
    /// the wallet's object was found in the host environment
    Installed,
    /// the wallet was not (yet) observed in the host environment
    #[default]
    NotDetected,
    /// the wallet needs no installation and can be opened on demand
    Loadable,
    /// the host environment can never run this wallet
    Unsupported,
}

impl ReadyState {
    pub fn is_connectable(self) -> bool {
        matches!(self, ReadyState::Installed | ReadyState::Loadable)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyState::Installed => write!(f, "installed"),
            ReadyState::NotDetected => write!(f, "not-detected"),
            ReadyState::Loadable => write!(f, "loadable"),
            ReadyState::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// The identity of the account the wallet exposed on connect.
///
/// Wallets disagree on capitalisation for some of these fields, so the
/// aliases absorb the known variants. `min_keys_required` only appears on
/// multisig accounts.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeys {
    #[serde(default, alias = "PublicKey")]
    pub public_key: Option<String>,
    #[serde(default, alias = "Address")]
    pub address: Option<String>,
    #[serde(default, alias = "authkey")]
    pub auth_key: Option<String>,
    #[serde(default)]
    pub min_keys_required: Option<u8>,
}

/// Which chain the connected wallet is pointed at. Not every wallet can
/// answer this; absent fields stay `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
}

/// Static description of one integrable wallet: its name, where to install
/// it, and the icon to show when asking the user to pick one.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WalletDescriptor {
    pub name: WalletName,
    pub url: String,
    pub icon: String,
}

/// A transaction accepted by the wallet for submission, identified by the
/// hash the dApp can use to track it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PendingTransaction {
    #[serde(alias = "txHash", alias = "txnHash")]
    pub hash: String,
}

fn is_false(flag: &bool) -> bool {
    !flag
}

/// The message-signing envelope. `nonce` is the caller-provided anti-replay
/// value; the boolean flags ask the wallet to mix the corresponding field
/// into the signed full message.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessagePayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub address: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub application: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub chain_id: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub full_message: String,
    pub message: String,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub prefix: String,
    pub signature: String,
}
