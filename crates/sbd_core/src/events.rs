/*
    Iridium SBD Emulator

    Copyright (c) 2026 The Iridium SBD Emulator Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the "Software"),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    events.rs

    Event Bus (component H). Three strongly-typed channels (`log`,
    `sbd-message`, `signer-key-generated`) delivered synchronously, in
    subscription order. An observer that panics is caught and logged as an
    ERROR rather than allowed to unwind back into the engine.
*/

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use sbd_common::{JwtSignerDetails, LogEvent, LogLevel, SbdMessage};

type Observer<T> = Box<dyn Fn(&T) + Send + Sync>;

struct Channel<T> {
    observers: RwLock<Vec<Observer<T>>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Channel { observers: RwLock::new(Vec::new()) }
    }

    fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.observers.write().unwrap().push(Box::new(f));
    }

    fn emit(&self, value: &T) {
        for observer in self.observers.read().unwrap().iter() {
            if panic::catch_unwind(AssertUnwindSafe(|| observer(value))).is_err() {
                log::error!("event observer panicked; continuing");
            }
        }
    }
}

pub struct EventBus {
    log: Channel<LogEvent>,
    sbd_message: Channel<SbdMessage>,
    signer_key_generated: Channel<JwtSignerDetails>,
    last_log_at: Mutex<Option<Instant>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            log: Channel::new(),
            sbd_message: Channel::new(),
            signer_key_generated: Channel::new(),
            last_log_at: Mutex::new(None),
        }
    }

    pub fn subscribe_log(&self, f: impl Fn(&LogEvent) + Send + Sync + 'static) {
        self.log.subscribe(f);
    }

    pub fn subscribe_sbd_message(&self, f: impl Fn(&SbdMessage) + Send + Sync + 'static) {
        self.sbd_message.subscribe(f);
    }

    pub fn subscribe_signer_key_generated(&self, f: impl Fn(&JwtSignerDetails) + Send + Sync + 'static) {
        self.signer_key_generated.subscribe(f);
    }

    pub fn emit_sbd_message(&self, message: SbdMessage) {
        self.sbd_message.emit(&message);
    }

    pub fn emit_signer_key_generated(&self, details: JwtSignerDetails) {
        self.signer_key_generated.emit(&details);
    }

    /// Builds a [`LogEvent`] with its `time_since_last` computed from the
    /// previous call, mirrors it through the `log` crate facade at the
    /// matching level, and emits it to `log` channel subscribers.
    pub fn log_event(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        let since_last = {
            let mut guard = self.last_log_at.lock().unwrap();
            let now = Instant::now();
            let since = guard.map(|prev| now.duration_since(prev));
            *guard = Some(now);
            since
        };

        match level {
            LogLevel::Debug => log::debug!("{message}"),
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Warn => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
            LogLevel::Critical => log::error!("[CRITICAL] {message}"),
        }

        let event = LogEvent::new(level, message, since_last);
        self.log.emit(&event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn observers_see_events_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o1 = Arc::clone(&order);
        let o2 = Arc::clone(&order);
        bus.subscribe_log(move |_| o1.lock().unwrap().push(1));
        bus.subscribe_log(move |_| o2.lock().unwrap().push(2));
        bus.log_event(LogLevel::Info, "hello");
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn panicking_observer_does_not_stop_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        bus.subscribe_log(|_| panic!("boom"));
        bus.subscribe_log(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.log_event(LogLevel::Error, "trouble");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
