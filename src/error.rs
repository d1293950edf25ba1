#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum VendorErrorCode {
    #[error("The user rejected the request.")]
    UserRejected,
    #[error("The requested method and account have not been authorized by the user.")]
    Unauthorized,
    #[error("The wallet does not support the requested method.")]
    Unsupported,
    #[error("The wallet is disconnected.")]
    Disconnected,
    #[error("The wallet is connected to a different chain than requested.")]
    ChainDisconnected,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

/// An error object as returned by the wallet application itself, following the
/// numeric code convention shared by the injected providers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error, serde::Deserialize)]
#[error("{code}. {message}.")]
pub struct VendorError {
    pub code: VendorErrorCode,
    #[serde(default)]
    pub message: String,
}

/// A failure reported by the wallet application, either decoded into the
/// typed error object or carried as an opaque description when the wallet
/// returned something we don't understand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VendorFailure {
    #[error("{0}")]
    Api(VendorError),
    #[error("{0}")]
    Other(String),
}

impl VendorFailure {
    pub fn other(message: impl Into<String>) -> Self {
        VendorFailure::Other(message.into())
    }
}

impl From<VendorError> for VendorFailure {
    fn from(error: VendorError) -> Self {
        VendorFailure::Api(error)
    }
}

/// The error surface of the connector. Operation failures carry the
/// underlying [`VendorFailure`]; the remaining variants are precondition
/// failures raised before any wallet call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("wallet is not installed or loadable")]
    NotReady,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("no wallet selected")]
    NotSelected,
    #[error("connection failed: {0}")]
    ConnectionFailed(VendorFailure),
    #[error("disconnection failed: {0}")]
    DisconnectionFailed(VendorFailure),
    #[error("transaction signing failed: {0}")]
    SignTransactionFailed(VendorFailure),
    #[error("transaction submission failed: {0}")]
    SignAndSubmitFailed(VendorFailure),
    #[error("message signing failed: {0}")]
    SignMessageFailed(VendorFailure),
    #[error("account change subscription failed: {0}")]
    AccountChangeFailed(VendorFailure),
    #[error("network change subscription failed: {0}")]
    NetworkChangeFailed(VendorFailure),
    #[error("network lookup failed: {0}")]
    GetNetworkFailed(VendorFailure),
}

impl<'de> serde::Deserialize<'de> for VendorErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = VendorErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer VendorErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v {
                    4001 => Ok(VendorErrorCode::UserRejected),
                    4100 => Ok(VendorErrorCode::Unauthorized),
                    4200 => Ok(VendorErrorCode::Unsupported),
                    4900 => Ok(VendorErrorCode::Disconnected),
                    4901 => Ok(VendorErrorCode::ChainDisconnected),
                    unknown => Ok(VendorErrorCode::Unknown(unknown)),
                }
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_i64(v as i64)
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
