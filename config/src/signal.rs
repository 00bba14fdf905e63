//! In-process signal hub.
//!
//! Reloads happen only when something dispatches [`RECONFIGURE_SIGNAL`]
//! through a [`SignalHub`]. There is no file watcher and no background
//! poller; the hub runs handlers synchronously on the dispatching thread,
//! in registration order.

use errors::SettingsError;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Signal name that triggers a settings reload.
pub const RECONFIGURE_SIGNAL: &str = "reconfigure";

type Handler = Box<dyn Fn() -> Result<(), SettingsError> + Send + Sync>;

/// Named-signal dispatcher.
#[derive(Default)]
pub struct SignalHub {
    handlers: Mutex<HashMap<String, Vec<Handler>>>
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `signal`. Handlers run in registration
    /// order.
    pub fn connect<F>(&self, signal: impl Into<String>, handler: F)
    where
        F: Fn() -> Result<(), SettingsError> + Send + Sync + 'static
    {
        let signal = signal.into();
        debug!(signal, "connecting signal handler");
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(signal)
            .or_default()
            .push(Box::new(handler));
    }

    /// Runs every handler registered for `signal`, returning how many ran.
    ///
    /// All handlers run even when earlier ones fail; failures are collected
    /// into a single [`SettingsError::Dispatch`]. The lock is not held while
    /// handlers run, so a handler may connect or dispatch on the same hub;
    /// handlers connected mid-dispatch run from the next dispatch on.
    pub fn dispatch(&self, signal: &str) -> Result<usize, SettingsError> {
        let mut running = {
            let mut guard = self
                .handlers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match guard.get_mut(signal) {
                Some(handlers) => std::mem::take(handlers),
                None => {
                    debug!(signal, "no handlers registered");
                    return Ok(0);
                }
            }
        };

        let mut failures = Vec::new();
        let count = running.len();
        for handler in &running {
            if let Err(err) = handler() {
                failures.push(err.to_string());
            }
        }

        {
            let mut guard = self
                .handlers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let slot = guard.entry(signal.to_string()).or_default();
            // Handlers connected while dispatching keep registration order,
            // after the ones that just ran.
            running.append(slot);
            *slot = running;
        }
        if failures.is_empty() {
            Ok(count)
        } else {
            Err(SettingsError::Dispatch {
                signal: signal.to_string(),
                failures
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_runs_handlers_in_order() {
        let hub = SignalHub::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            hub.connect(RECONFIGURE_SIGNAL, move || {
                order.lock().unwrap().push(tag);
                Ok(())
            });
        }
        assert_eq!(hub.dispatch(RECONFIGURE_SIGNAL).unwrap(), 2);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_dispatch_unknown_signal_is_zero() {
        let hub = SignalHub::new();
        assert_eq!(hub.dispatch("nothing-here").unwrap(), 0);
    }

    #[test]
    fn test_failures_do_not_stop_later_handlers() {
        let hub = SignalHub::new();
        let ran = Arc::new(AtomicUsize::new(0));
        hub.connect(RECONFIGURE_SIGNAL, || {
            Err(SettingsError::Validation { issues: vec![] })
        });
        let ran_clone = Arc::clone(&ran);
        hub.connect(RECONFIGURE_SIGNAL, move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = hub.dispatch(RECONFIGURE_SIGNAL);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        match err {
            Err(SettingsError::Dispatch { signal, failures }) => {
                assert_eq!(signal, RECONFIGURE_SIGNAL);
                assert_eq!(failures.len(), 1);
            }
            other => panic!("expected dispatch error, got {other:?}")
        }
    }

    #[test]
    fn test_handler_may_connect_during_dispatch() {
        let hub = Arc::new(SignalHub::new());
        let ran = Arc::new(AtomicUsize::new(0));
        let hub_clone = Arc::clone(&hub);
        let ran_clone = Arc::clone(&ran);
        hub.connect(RECONFIGURE_SIGNAL, move || {
            let ran = Arc::clone(&ran_clone);
            hub_clone.connect(RECONFIGURE_SIGNAL, move || {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        assert_eq!(hub.dispatch(RECONFIGURE_SIGNAL).unwrap(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(hub.dispatch(RECONFIGURE_SIGNAL).unwrap(), 2);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_dispatch_does_not_block() {
        let hub = Arc::new(SignalHub::new());
        let hub_clone = Arc::clone(&hub);
        hub.connect(RECONFIGURE_SIGNAL, move || {
            // The handler list is checked out while running, so a nested
            // dispatch of the same signal sees nothing to do.
            assert_eq!(hub_clone.dispatch(RECONFIGURE_SIGNAL).unwrap(), 0);
            Ok(())
        });
        assert_eq!(hub.dispatch(RECONFIGURE_SIGNAL).unwrap(), 1);
    }

    #[test]
    fn test_signals_are_isolated() {
        let hub = SignalHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        hub.connect("other", move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        hub.dispatch(RECONFIGURE_SIGNAL).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
