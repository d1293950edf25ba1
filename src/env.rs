//! Access to the host environment (window, document, timers) behind a
//! capability trait, so adapters stay testable outside a real browser and
//! "this host can never run a wallet" is decided by the injected scope alone.

use std::rc::Rc;

/// Cancels one registration (a timer or an event listener). Runs at most
/// once; dropping an undisposed `Disposer` also cancels.
pub struct Disposer(Option<Box<dyn FnOnce()>>);

impl Disposer {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Disposer(Some(Box::new(cancel)))
    }

    pub fn noop() -> Self {
        Disposer(None)
    }

    pub fn dispose(mut self) {
        if let Some(cancel) = self.0.take() {
            cancel();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        if let Some(cancel) = self.0.take() {
            cancel();
        }
    }
}

/// What the connector needs from its host. The browser implementation is
/// [`BrowserScope`]; tests and non-browser hosts supply their own.
pub trait HostScope {
    /// whether the host has a window object at all
    fn has_window(&self) -> bool;

    /// probe the dotted global path (`"martian"`, `"nightly.aptos"`) for the
    /// wallet's injected object
    fn probe(&self, path: &str) -> bool;

    /// the document has not finished parsing yet
    fn document_loading(&self) -> bool;

    /// the window `load` event has already fired
    fn window_loaded(&self) -> bool;

    fn set_interval(&self, millis: u32, callback: Rc<dyn Fn()>) -> Disposer;

    fn on_document_ready(&self, callback: Rc<dyn Fn()>) -> Disposer;

    fn on_window_load(&self, callback: Rc<dyn Fn()>) -> Disposer;

    /// open `url` in a new tab, as a best effort
    fn open_url(&self, url: &str);
}

/// A scope with no window: every wallet is `Unsupported`, every registration
/// a no-op. For server-side rendering and other headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScope;

impl HostScope for NullScope {
    fn has_window(&self) -> bool {
        false
    }

    fn probe(&self, _path: &str) -> bool {
        false
    }

    fn document_loading(&self) -> bool {
        false
    }

    fn window_loaded(&self) -> bool {
        true
    }

    fn set_interval(&self, _millis: u32, _callback: Rc<dyn Fn()>) -> Disposer {
        Disposer::noop()
    }

    fn on_document_ready(&self, _callback: Rc<dyn Fn()>) -> Disposer {
        Disposer::noop()
    }

    fn on_window_load(&self, _callback: Rc<dyn Fn()>) -> Disposer {
        Disposer::noop()
    }

    fn open_url(&self, _url: &str) {}
}

#[cfg(target_arch = "wasm32")]
pub use self::browser::BrowserScope;

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::rc::Rc;

    use wasm_bindgen::{JsCast, JsValue, closure::Closure};

    use super::{Disposer, HostScope};

    /// The real browser host, over `web-sys`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BrowserScope;

    impl BrowserScope {
        pub fn new() -> Self {
            BrowserScope
        }
    }

    fn listen(
        target: web_sys::EventTarget,
        kind: &'static str,
        callback: Rc<dyn Fn()>,
    ) -> Disposer {
        let closure = Closure::<dyn FnMut()>::new(move || callback());
        if target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .is_err()
        {
            return Disposer::noop();
        }
        Disposer::new(move || {
            let _ = target.remove_event_listener_with_callback(
                kind,
                closure.as_ref().unchecked_ref(),
            );
        })
    }

    impl HostScope for BrowserScope {
        fn has_window(&self) -> bool {
            web_sys::window().is_some()
        }

        fn probe(&self, path: &str) -> bool {
            let Some(window) = web_sys::window() else {
                return false;
            };
            let mut current: JsValue = window.into();
            for segment in path.split('.') {
                match js_sys::Reflect::get(&current, &JsValue::from_str(segment)) {
                    Ok(next) if !next.is_undefined() && !next.is_null() => current = next,
                    _ => return false,
                }
            }
            true
        }

        fn document_loading(&self) -> bool {
            web_sys::window()
                .and_then(|window| window.document())
                .map(|document| document.ready_state() == "loading")
                .unwrap_or(false)
        }

        fn window_loaded(&self) -> bool {
            web_sys::window()
                .and_then(|window| window.document())
                .map(|document| document.ready_state() == "complete")
                .unwrap_or(true)
        }

        fn set_interval(&self, millis: u32, callback: Rc<dyn Fn()>) -> Disposer {
            let Some(window) = web_sys::window() else {
                return Disposer::noop();
            };
            let closure = Closure::<dyn FnMut()>::new(move || callback());
            match window.set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                millis as i32,
            ) {
                Ok(handle) => Disposer::new(move || {
                    if let Some(window) = web_sys::window() {
                        window.clear_interval_with_handle(handle);
                    }
                    drop(closure);
                }),
                Err(_) => Disposer::noop(),
            }
        }

        fn on_document_ready(&self, callback: Rc<dyn Fn()>) -> Disposer {
            match web_sys::window().and_then(|window| window.document()) {
                Some(document) => listen(document.into(), "DOMContentLoaded", callback),
                None => Disposer::noop(),
            }
        }

        fn on_window_load(&self, callback: Rc<dyn Fn()>) -> Disposer {
            match web_sys::window() {
                Some(window) => listen(window.into(), "load", callback),
                None => Disposer::noop(),
            }
        }

        fn open_url(&self, url: &str) {
            if let Some(window) = web_sys::window() {
                if window.open_with_url_and_target(url, "_blank").is_err() {
                    log::warn!("couldn't open `{url}' in a new tab");
                }
            }
        }
    }
}
