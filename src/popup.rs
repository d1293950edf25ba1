//! The message protocol spoken with hosted web wallets. Those wallets have
//! no injected object; the adapter opens their page in a separate window and
//! exchanges JSON messages with it. Only the wiring to the actual window is
//! browser-specific (see `ffi::popup`); the protocol itself lives here.

use std::cell::RefCell;

use futures::channel::oneshot;
use serde_json::Value;

use crate::error::{VendorError, VendorFailure};

/// how often the wallet window is checked for having been closed
pub const CLOSED_POLL_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeMethod {
    Connected,
    Disconnected,
    Success,
    Fail,
    Account,
}

/// One message received from the wallet window. Everything besides `method`
/// is the payload of that method.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct BridgeMessage {
    pub method: BridgeMethod,
    #[serde(flatten)]
    pub payload: Value,
}

/// What a pending operation is waiting to be answered by: `Connect` resolves
/// on `connected`, `Disconnect` on `disconnected`, everything else on
/// `success`. A `fail` answers whichever operation is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Connect,
    Disconnect,
    Request,
}

/// A wallet-initiated notification, not the answer to anything we asked.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeNotice {
    Disconnected,
    AccountChange(Value),
}

struct PendingOp {
    kind: OpKind,
    tx: oneshot::Sender<Result<Value, VendorFailure>>,
}

/// The dApp side of the conversation with one wallet window. Holds the
/// wallet's expected origin and at most one pending operation (the adapter's
/// entry guards serialize operations, so a single slot is the honest model).
pub struct Bridge {
    origin: String,
    pending: RefCell<Option<PendingOp>>,
}

impl Bridge {
    pub fn new(origin: impl Into<String>) -> Self {
        Bridge {
            origin: origin.into(),
            pending: RefCell::new(None),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Register the next operation and hand back the receiver its answer
    /// will arrive on. A stale pending operation (there should be none) is
    /// failed rather than silently dropped.
    pub fn begin(&self, kind: OpKind) -> oneshot::Receiver<Result<Value, VendorFailure>> {
        let (tx, rx) = oneshot::channel();
        if let Some(stale) = self.pending.borrow_mut().replace(PendingOp { kind, tx }) {
            let _ = stale
                .tx
                .send(Err(VendorFailure::other("superseded by a newer request")));
        }
        rx
    }

    /// Fail the pending operation, if any. Used when the wallet window goes
    /// away without answering.
    pub fn abort(&self, reason: &str) {
        if let Some(pending) = self.pending.borrow_mut().take() {
            let _ = pending.tx.send(Err(VendorFailure::other(reason)));
        }
    }

    pub fn idle(&self) -> bool {
        self.pending.borrow().is_none()
    }

    /// Handle one incoming message. Messages from any origin other than the
    /// wallet's are ignored entirely: no state is touched and nothing is
    /// resolved. Returns the wallet-initiated notice, if the message was one.
    pub fn accept(&self, origin: &str, data: &Value) -> Option<BridgeNotice> {
        if origin != self.origin {
            log::debug!("ignoring a message from unexpected origin `{origin}'");
            return None;
        }
        let Ok(message) = serde_json::from_value::<BridgeMessage>(data.clone()) else {
            log::debug!("ignoring an unintelligible message from `{origin}'");
            return None;
        };

        match message.method {
            BridgeMethod::Connected => {
                self.resolve(OpKind::Connect, Ok(message.payload));
                None
            }
            BridgeMethod::Success => {
                self.resolve(OpKind::Request, Ok(message.payload));
                None
            }
            BridgeMethod::Fail => {
                if let Some(pending) = self.pending.borrow_mut().take() {
                    let _ = pending.tx.send(Err(failure_from(message.payload)));
                }
                None
            }
            BridgeMethod::Disconnected => {
                let answered = {
                    let mut slot = self.pending.borrow_mut();
                    match slot.take() {
                        Some(pending) if pending.kind == OpKind::Disconnect => {
                            let _ = pending.tx.send(Ok(message.payload));
                            true
                        }
                        other => {
                            *slot = other;
                            false
                        }
                    }
                };
                (!answered).then_some(BridgeNotice::Disconnected)
            }
            BridgeMethod::Account => Some(BridgeNotice::AccountChange(message.payload)),
        }
    }

    fn resolve(&self, kind: OpKind, outcome: Result<Value, VendorFailure>) {
        let mut slot = self.pending.borrow_mut();
        match slot.take() {
            Some(pending) if pending.kind == kind => {
                let _ = pending.tx.send(outcome);
            }
            other => *slot = other,
        }
    }
}

fn failure_from(payload: Value) -> VendorFailure {
    match serde_json::from_value::<VendorError>(payload.clone()) {
        Ok(error) => VendorFailure::Api(error),
        Err(_) => VendorFailure::Other(
            payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("the wallet reported a failure")
                .to_owned(),
        ),
    }
}

/// The origin a wallet URL lives at, for validating incoming messages.
pub fn origin_of(wallet_url: &str) -> Result<String, VendorFailure> {
    let parsed = url::Url::parse(wallet_url)
        .map_err(|error| VendorFailure::other(format!("invalid wallet url: {error}")))?;
    let origin = parsed.origin();
    if !matches!(&origin, url::Origin::Tuple(..)) {
        return Err(VendorFailure::other(format!(
            "wallet url `{wallet_url}' has no usable origin"
        )));
    }
    Ok(origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::VendorErrorCode;

    const ORIGIN: &str = "https://fewcha.app";

    fn answer(
        rx: &mut oneshot::Receiver<Result<Value, VendorFailure>>,
    ) -> Option<Result<Value, VendorFailure>> {
        rx.try_recv().expect("the sender must still be alive")
    }

    #[test]
    fn messages_from_another_origin_are_ignored() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Connect);

        let notice = bridge.accept(
            "https://evil.example",
            &json! { { "method": "connected", "publicKey": "0xaa" } },
        );

        assert_eq!(notice, None);
        assert_eq!(answer(&mut rx), None);
        assert!(!bridge.idle());
    }

    #[test]
    fn connected_resolves_a_pending_connect() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Connect);

        bridge.accept(ORIGIN, &json! { { "method": "connected", "publicKey": "0xaa" } });

        let payload = answer(&mut rx).expect("resolved").expect("success");
        assert_eq!(payload.get("publicKey"), Some(&json! { "0xaa" }));
        assert!(bridge.idle());
    }

    #[test]
    fn success_resolves_a_pending_request_but_not_a_connect() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Connect);

        bridge.accept(ORIGIN, &json! { { "method": "success" } });
        assert_eq!(answer(&mut rx), None);

        let mut rx = bridge.begin(OpKind::Request);
        bridge.accept(ORIGIN, &json! { { "method": "success", "hash": "0x1" } });
        let payload = answer(&mut rx).expect("resolved").expect("success");
        assert_eq!(payload.get("hash"), Some(&json! { "0x1" }));
    }

    #[test]
    fn fail_carries_the_typed_vendor_error_when_it_decodes() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Request);

        bridge.accept(
            ORIGIN,
            &json! { { "method": "fail", "code": 4001, "message": "User rejected" } },
        );

        let failure = answer(&mut rx).expect("resolved").expect_err("failure");
        let VendorFailure::Api(error) = failure else {
            panic!("expected a typed error, got {failure:?}");
        };
        assert_eq!(error.code, VendorErrorCode::UserRejected);
    }

    #[test]
    fn fail_degrades_to_the_message_text() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Request);

        bridge.accept(ORIGIN, &json! { { "method": "fail", "message": "nope" } });

        assert_eq!(
            answer(&mut rx).expect("resolved"),
            Err(VendorFailure::other("nope"))
        );
    }

    #[test]
    fn disconnected_answers_a_pending_disconnect() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Disconnect);

        let notice = bridge.accept(ORIGIN, &json! { { "method": "disconnected" } });

        assert_eq!(notice, None);
        assert!(answer(&mut rx).expect("resolved").is_ok());
    }

    #[test]
    fn unsolicited_disconnected_surfaces_as_a_notice() {
        let bridge = Bridge::new(ORIGIN);

        let notice = bridge.accept(ORIGIN, &json! { { "method": "disconnected" } });

        assert_eq!(notice, Some(BridgeNotice::Disconnected));
    }

    #[test]
    fn account_messages_surface_their_payload() {
        let bridge = Bridge::new(ORIGIN);

        let notice = bridge.accept(
            ORIGIN,
            &json! { { "method": "account", "address": "0xb0b" } },
        );

        let Some(BridgeNotice::AccountChange(payload)) = notice else {
            panic!("expected an account notice, got {notice:?}");
        };
        assert_eq!(payload.get("address"), Some(&json! { "0xb0b" }));
    }

    #[test]
    fn abort_fails_the_pending_operation() {
        let bridge = Bridge::new(ORIGIN);
        let mut rx = bridge.begin(OpKind::Connect);

        bridge.abort("the wallet window was closed");

        assert_eq!(
            answer(&mut rx).expect("resolved"),
            Err(VendorFailure::other("the wallet window was closed"))
        );
        assert!(bridge.idle());
    }

    #[test]
    fn origins_come_from_the_wallet_url() {
        assert_eq!(
            origin_of("https://fewcha.app/connect?app=dapp").unwrap(),
            "https://fewcha.app"
        );
        assert!(origin_of("not a url").is_err());
    }
}
