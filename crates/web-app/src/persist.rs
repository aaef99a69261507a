//! Deferred writes
//!
//! Rapid successive changes of local state are coalesced into a single write. Only the most
//! recently scheduled value is written, once no further value was scheduled for the configured
//! delay.

use std::{cell::RefCell, rc::Rc};

use gloo_timers::callback::Timeout;

/// Delay before set overrides are persisted.
pub const OVERRIDE_PERSIST_DELAY_MS: u32 = 200;

pub trait Deferred<T> {
    /// Replace the pending value and restart the delay.
    fn schedule(&mut self, value: T);
    /// Write the pending value immediately.
    fn flush(&mut self);
    /// Discard the pending value.
    fn cancel(&mut self);
}

pub struct ScheduledWrite<T: 'static> {
    delay_ms: u32,
    write: Rc<dyn Fn(T)>,
    pending: Rc<RefCell<Option<T>>>,
    timeout: Option<Timeout>,
}

impl<T: 'static> ScheduledWrite<T> {
    pub fn new(delay_ms: u32, write: impl Fn(T) + 'static) -> Self {
        Self {
            delay_ms,
            write: Rc::new(write),
            pending: Rc::new(RefCell::new(None)),
            timeout: None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    fn cancel_timeout(&mut self) {
        if let Some(timeout) = self.timeout.take() {
            timeout.cancel();
        }
    }
}

impl<T: 'static> Deferred<T> for ScheduledWrite<T> {
    fn schedule(&mut self, value: T) {
        self.cancel_timeout();
        *self.pending.borrow_mut() = Some(value);
        let pending = Rc::clone(&self.pending);
        let write = Rc::clone(&self.write);
        self.timeout = Some(Timeout::new(self.delay_ms, move || {
            let value = pending.borrow_mut().take();
            if let Some(value) = value {
                write(value);
            }
        }));
    }

    fn flush(&mut self) {
        self.cancel_timeout();
        let value = self.pending.borrow_mut().take();
        if let Some(value) = value {
            (self.write)(value);
        }
    }

    fn cancel(&mut self) {
        self.cancel_timeout();
        *self.pending.borrow_mut() = None;
    }
}

impl<T: 'static> Drop for ScheduledWrite<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    mod wasm {
        use gloo_timers::future::TimeoutFuture;
        use pretty_assertions::assert_eq;
        use wasm_bindgen_test::wasm_bindgen_test;

        use super::*;

        fn recorder() -> (Rc<RefCell<Vec<u32>>>, ScheduledWrite<u32>) {
            let written = Rc::new(RefCell::new(vec![]));
            let target = Rc::clone(&written);
            let write = ScheduledWrite::new(20, move |value| target.borrow_mut().push(value));
            (written, write)
        }

        #[wasm_bindgen_test]
        async fn test_schedule_coalesces() {
            let (written, mut write) = recorder();
            write.schedule(1);
            write.schedule(2);
            write.schedule(3);
            assert_eq!(*written.borrow(), Vec::<u32>::new());
            TimeoutFuture::new(60).await;
            assert_eq!(*written.borrow(), vec![3]);
            assert!(!write.is_pending());
        }

        #[wasm_bindgen_test]
        async fn test_flush() {
            let (written, mut write) = recorder();
            write.schedule(1);
            write.flush();
            assert_eq!(*written.borrow(), vec![1]);
            TimeoutFuture::new(60).await;
            assert_eq!(*written.borrow(), vec![1]);
        }

        #[wasm_bindgen_test]
        async fn test_cancel() {
            let (written, mut write) = recorder();
            write.schedule(1);
            write.cancel();
            TimeoutFuture::new(60).await;
            assert_eq!(*written.borrow(), Vec::<u32>::new());
        }

        #[wasm_bindgen_test]
        async fn test_drop_cancels() {
            let (written, mut write) = recorder();
            write.schedule(1);
            drop(write);
            TimeoutFuture::new(60).await;
            assert_eq!(*written.borrow(), Vec::<u32>::new());
        }
    }
}
