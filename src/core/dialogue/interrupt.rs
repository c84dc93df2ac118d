//! Shared interruption signal.
//!
//! One signal is shared by reference between the connection session and the
//! single in-flight orchestration run; it is the only cancellation channel.
//! Cancellation is cooperative: the orchestrator re-checks the signal at
//! every suspension point and winds down cleanly with partial results.

use std::sync::atomic::{AtomicU8, Ordering};

const ARMED: u8 = 0;
const RAISED: u8 = 1;
const OBSERVED: u8 = 2;

/// Tri-state interruption flag: armed, raised, or raised-and-observed.
///
/// Once raised the signal never returns to armed; the orchestrator marks it
/// observed when it acts on the interruption, which keeps the distinction
/// between "interrupt requested" and "interrupt handled" visible in logs and
/// tests without ever clearing the flag mid-turn.
#[derive(Debug, Default)]
pub struct InterruptSignal {
    state: AtomicU8,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self { state: AtomicU8::new(ARMED) }
    }

    /// Request interruption. Returns true if this call performed the
    /// armed-to-raised transition, false if the signal was already raised.
    pub fn raise(&self) -> bool {
        self.state
            .compare_exchange(ARMED, RAISED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether interruption has been requested (observed or not).
    pub fn is_raised(&self) -> bool {
        self.state.load(Ordering::Acquire) != ARMED
    }

    /// Mark a raised signal as observed. Returns true if the signal was
    /// raised (whether or not this was the first observation).
    pub fn observe(&self) -> bool {
        match self
            .state
            .compare_exchange(RAISED, OBSERVED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == OBSERVED,
        }
    }

    /// Whether the orchestrator has acted on the interruption.
    pub fn is_observed(&self) -> bool {
        self.state.load(Ordering::Acquire) == OBSERVED
    }
}
