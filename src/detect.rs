//! Detection of a wallet's injected object: catch it as soon as possible,
//! never miss a late injection, and notify exactly once.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::env::{Disposer, HostScope};

/// How often the recurring probe re-checks for the wallet object.
pub const PROBE_INTERVAL_MS: u32 = 1_000;

/// Watches one injected global path until it appears.
///
/// Four layered strategies share a single attempt closure: one synchronous
/// probe at registration, a recurring interval, a one-shot document-ready
/// listener (if the document is still parsing), and a one-shot window-load
/// listener (if the window has not finished loading). The first strategy to
/// find the object disposes every other registration before notifying, so
/// the notification fires at most once and nothing keeps ticking afterwards.
///
/// Each `Scout` owns its own disposers; any number of them can watch
/// different paths concurrently without interfering.
pub struct Scout {
    disposers: Rc<RefCell<Vec<Disposer>>>,
    done: Rc<Cell<bool>>,
}

impl Scout {
    pub fn watch(scope: Rc<dyn HostScope>, path: &str, on_found: impl Fn() + 'static) -> Self {
        let disposers = Rc::new(RefCell::new(Vec::<Disposer>::new()));
        let done = Rc::new(Cell::new(false));

        let attempt: Rc<dyn Fn()> = {
            let scope = Rc::clone(&scope);
            let path = path.to_owned();
            let disposers = Rc::clone(&disposers);
            let done = Rc::clone(&done);
            Rc::new(move || {
                if done.get() || !scope.probe(&path) {
                    return;
                }
                done.set(true);
                log::debug!("wallet object `{path}' detected");
                for disposer in disposers.borrow_mut().drain(..) {
                    disposer.dispose();
                }
                on_found();
            })
        };

        attempt();
        if !done.get() {
            let mut pending = disposers.borrow_mut();
            pending.push(scope.set_interval(PROBE_INTERVAL_MS, Rc::clone(&attempt)));
            if scope.document_loading() {
                pending.push(scope.on_document_ready(Rc::clone(&attempt)));
            }
            if !scope.window_loaded() {
                pending.push(scope.on_window_load(Rc::clone(&attempt)));
            }
        }

        Scout { disposers, done }
    }

    pub fn found(&self) -> bool {
        self.done.get()
    }
}

impl Drop for Scout {
    fn drop(&mut self) {
        for disposer in self.disposers.borrow_mut().drain(..) {
            disposer.dispose();
        }
    }
}
