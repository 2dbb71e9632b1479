use leptos::ev;
use leptos::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Height (px) the viewport must lose before we assume a soft keyboard is up.
pub(crate) const KEYBOARD_THRESHOLD: f64 = 150.0;
/// Focus changes start the keyboard animation; re-check once it has settled.
const FOCUS_SETTLE_MS: i32 = 300;

/// Turns viewport heights into keyboard show/hide transitions.
#[derive(Clone, Debug)]
pub(crate) struct KeyboardDetector {
    screen_height: f64,
    threshold: f64,
    last: bool,
}

impl KeyboardDetector {
    pub fn new(screen_height: f64) -> Self {
        Self {
            screen_height,
            threshold: KEYBOARD_THRESHOLD,
            last: false,
        }
    }

    /// `Some(visible)` only when the keyboard state flipped.
    pub fn observe(&mut self, inner_height: f64) -> Option<bool> {
        let visible = self.screen_height - inner_height > self.threshold;
        if visible == self.last {
            return None;
        }
        self.last = visible;
        Some(visible)
    }
}

/// Source of soft keyboard show/hide transitions.
pub(crate) trait KeyboardMonitor {
    fn start(&self, on_change: impl Fn(bool) + 'static);

    /// Remove every listener. Safe to call when not started.
    fn stop(&self);
}

struct ViewportListeners {
    viewport: web_sys::VisualViewport,
    callback: Closure<dyn FnMut()>,
}

/// Browser wiring around [`KeyboardDetector`]. Mobile only.
#[derive(Default)]
pub(crate) struct KeyboardWatcher {
    window_handles: RefCell<Vec<WindowListenerHandle>>,
    viewport: RefCell<Option<ViewportListeners>>,
    /// Flag shared with the current run's closures. `stop` clears it so a pending
    /// focus timer that fires afterwards does nothing.
    active: RefCell<Rc<Cell<bool>>>,
}

impl KeyboardWatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyboardMonitor for KeyboardWatcher {
    fn start(&self, on_change: impl Fn(bool) + 'static) {
        self.stop();
        let Some(window) = web_sys::window() else {
            return;
        };

        let screen_height = window
            .screen()
            .ok()
            .and_then(|s| s.height().ok())
            .unwrap_or_default();
        let detector = Rc::new(RefCell::new(KeyboardDetector::new(f64::from(screen_height))));
        let active = Rc::new(Cell::new(true));
        let on_change: Rc<dyn Fn(bool)> = Rc::new(on_change);

        let check: Rc<dyn Fn()> = {
            let active = active.clone();
            Rc::new(move || {
                if !active.get() {
                    return;
                }
                let Some(inner_height) = web_sys::window()
                    .and_then(|w| w.inner_height().ok())
                    .and_then(|h| h.as_f64())
                else {
                    return;
                };
                let changed = detector.borrow_mut().observe(inner_height);
                if let Some(keyboard_visible) = changed {
                    on_change(keyboard_visible);
                }
            })
        };

        check();

        if let Some(viewport) = window.visual_viewport() {
            let c = check.clone();
            let callback = Closure::<dyn FnMut()>::new(move || c());
            let _ = viewport
                .add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref());
            // iOS reports keyboard movement as viewport scrolling.
            let _ = viewport
                .add_event_listener_with_callback("scroll", callback.as_ref().unchecked_ref());
            *self.viewport.borrow_mut() = Some(ViewportListeners { viewport, callback });
        }

        let c = check.clone();
        let resize = window_event_listener(ev::resize, move |_| c());
        let c = check.clone();
        let focusin = window_event_listener(ev::focusin, move |_| schedule_check(c.clone()));
        let focusout = window_event_listener(ev::focusout, move |_| schedule_check(check.clone()));

        self.window_handles
            .borrow_mut()
            .extend([resize, focusin, focusout]);
        *self.active.borrow_mut() = active;
    }

    fn stop(&self) {
        self.active.borrow().set(false);
        for handle in self.window_handles.borrow_mut().drain(..) {
            handle.remove();
        }
        if let Some(listeners) = self.viewport.borrow_mut().take() {
            let f = listeners.callback.as_ref().unchecked_ref();
            let _ = listeners.viewport.remove_event_listener_with_callback("resize", f);
            let _ = listeners.viewport.remove_event_listener_with_callback("scroll", f);
        }
    }
}

fn schedule_check(check: Rc<dyn Fn()>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let cb = Closure::once_into_js(move || check());
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        FOCUS_SETTLE_MS,
    );
}
