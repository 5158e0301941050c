//! Signal handling for cooperative shutdown.
//!
//! Registers SIGINT and SIGTERM onto atomic flags checked once per tick by
//! the controller. Neither signal interrupts an in-flight blocking call;
//! termination is only recognized at the next tick boundary.
//!
//! The state is an explicitly constructed value passed down to the
//! controller rather than a hidden global, so the interrupt flag's
//! reset-on-read behavior is visible at the call site.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use signal_hook::consts::signal::{SIGINT, SIGTERM};

/// Signal flags owned by the controller. Clones share the same underlying
/// flags, so a handle kept outside the controller can still raise them.
#[derive(Clone)]
pub struct SignalState {
    interrupt: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
}

impl SignalState {
    /// Whether a SIGINT has been received since the last check.
    ///
    /// Reset-on-read: observing the interrupt clears it, so a second call
    /// without a new signal reports `false`.
    pub fn interrupt_caught(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }

    /// Whether a supervisor termination request (SIGTERM) is pending.
    /// Latched: stays `true` once received.
    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    /// A state not wired to any OS signal. Used by tests to drive the
    /// controller's termination paths directly.
    pub fn detached() -> Self {
        Self {
            interrupt: Arc::new(AtomicBool::new(false)),
            terminate: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raise the interrupt flag as if a SIGINT had been delivered.
    pub fn raise_interrupt(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    /// Raise the termination flag as if a SIGTERM had been delivered.
    pub fn raise_terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }
}

/// Install the SIGINT/SIGTERM handlers and return the shared flag state.
pub fn setup_signal_handler() -> Result<SignalState> {
    let state = SignalState::detached();

    signal_hook::flag::register(SIGINT, Arc::clone(&state.interrupt))
        .context("failed to register SIGINT handler")?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&state.terminate))
        .context("failed to register SIGTERM handler")?;

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_flag_resets_on_read() {
        let state = SignalState::detached();
        state.raise_interrupt();
        assert!(state.interrupt_caught());
        assert!(!state.interrupt_caught());
    }

    #[test]
    fn clones_share_the_same_flags() {
        let state = SignalState::detached();
        let handle = state.clone();
        handle.raise_terminate();
        assert!(state.terminate_requested());
    }

    #[test]
    fn terminate_flag_latches() {
        let state = SignalState::detached();
        state.raise_terminate();
        assert!(state.terminate_requested());
        assert!(state.terminate_requested());
    }
}
