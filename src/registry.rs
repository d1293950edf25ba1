//! The wallets supported out of the box. Each entry is data — a descriptor,
//! the injected path or hosted URL, and the two behavior flags — fed to the
//! same adapter type; supporting another wallet is one more entry, not
//! another class.

use std::rc::Rc;

use crate::{
    account::{WalletDescriptor, WalletName},
    adapter::{AdapterConfig, WalletAdapter},
    env::HostScope,
    ffi::{injected::InjectedApi, popup::PopupApi},
    vendor::VendorApi,
};

const FEWCHA_URL: &str = "https://fewcha.app";

fn injected(
    scope: &Rc<dyn HostScope>,
    name: &str,
    url: &str,
    icon: &str,
    path: &str,
    reconnect_policy: bool,
    requires_nonce: bool,
) -> Rc<WalletAdapter> {
    let mut api = InjectedApi::new(path);
    if requires_nonce {
        api = api.with_message_nonce();
    }
    Rc::new(WalletAdapter::new(
        AdapterConfig {
            descriptor: WalletDescriptor {
                name: WalletName::new(name),
                url: url.to_owned(),
                icon: icon.to_owned(),
            },
            injected_path: Some(path.to_owned()),
            reconnect_policy,
        },
        Rc::new(api) as Rc<dyn VendorApi>,
        Rc::clone(scope),
    ))
}

pub fn petra(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    injected(
        scope,
        "Petra",
        "https://petra.app",
        "/assets/wallets/petra.svg",
        "aptos",
        true,
        true,
    )
}

pub fn martian(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    injected(
        scope,
        "Martian",
        "https://martianwallet.xyz",
        "/assets/wallets/martian.svg",
        "martian",
        true,
        true,
    )
}

pub fn pontem(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    injected(
        scope,
        "Pontem",
        "https://pontem.network",
        "/assets/wallets/pontem.svg",
        "pontem",
        false,
        false,
    )
}

pub fn rise(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    injected(
        scope,
        "Rise",
        "https://risewallet.io",
        "/assets/wallets/rise.svg",
        "rise",
        true,
        false,
    )
}

pub fn nightly(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    injected(
        scope,
        "Nightly",
        "https://nightly.app",
        "/assets/wallets/nightly.svg",
        "nightly.aptos",
        false,
        true,
    )
}

pub fn spika(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    injected(
        scope,
        "Spika",
        "https://spika.app",
        "/assets/wallets/spika.svg",
        "spika",
        false,
        false,
    )
}

/// Fewcha is a hosted wallet: no extension, loadable on demand through its
/// own window.
pub fn fewcha(scope: &Rc<dyn HostScope>) -> Rc<WalletAdapter> {
    let api = PopupApi::new(FEWCHA_URL, Rc::clone(scope)).with_message_nonce();
    Rc::new(WalletAdapter::new(
        AdapterConfig {
            descriptor: WalletDescriptor {
                name: WalletName::new("Fewcha"),
                url: FEWCHA_URL.to_owned(),
                icon: "/assets/wallets/fewcha.svg".to_owned(),
            },
            injected_path: None,
            reconnect_policy: false,
        },
        Rc::new(api) as Rc<dyn VendorApi>,
        Rc::clone(scope),
    ))
}

/// Every wallet this crate knows about.
pub fn all(scope: &Rc<dyn HostScope>) -> Vec<Rc<WalletAdapter>> {
    vec![
        petra(scope),
        martian(scope),
        pontem(scope),
        rise(scope),
        nightly(scope),
        spika(scope),
        fewcha(scope),
    ]
}
