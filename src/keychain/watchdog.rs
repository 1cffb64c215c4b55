//! Background auto-lock checker.
//!
//! Runs [`Keychain::check_auto_lock`] on a fixed cadence against a shared
//! keychain.  The thread exits as soon as the keychain is locked (by the
//! check itself or by anyone else), when the handle is cancelled, or when
//! the handle is dropped, so no checker outlives a lock transition.
//!
//! The checker never blocks on the keychain mutex: a tick that finds it
//! held is skipped.  Cancelling or dropping the handle while holding the
//! guard therefore returns promptly.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::session::CHECK_INTERVAL;
use super::store::Keychain;

/// Handle to a running auto-lock thread.
#[derive(Debug)]
pub struct AutoLockWatchdog {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoLockWatchdog {
    /// Start checking every second.
    pub fn spawn(keychain: Arc<Mutex<Keychain>>) -> Self {
        Self::spawn_with_interval(keychain, CHECK_INTERVAL)
    }

    /// Start checking every `interval`.
    pub fn spawn_with_interval(keychain: Arc<Mutex<Keychain>>, interval: Duration) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            debug!(?interval, "auto-lock watchdog started");
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let mut guard = match keychain.try_lock() {
                    Ok(guard) => guard,
                    Err(TryLockError::WouldBlock) => continue,
                    Err(TryLockError::Poisoned(_)) => {
                        warn!("keychain mutex poisoned, stopping auto-lock watchdog");
                        break;
                    }
                };
                if !guard.check_auto_lock() {
                    break;
                }
            }
            debug!("auto-lock watchdog stopped");
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// `true` once the checker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the checker and wait for it to exit.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The thread may already be gone; a closed channel is fine.
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AutoLockWatchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}
