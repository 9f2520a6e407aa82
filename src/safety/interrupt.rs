/// Async-safe interruption handling
///
/// The signal handler only flips atomics; the orchestrator observes the
/// flag at phase boundaries and short-circuits to cleanup. Once cleanup
/// begins the handlers are reset to their default disposition, so a second
/// signal exits plainly instead of re-entering teardown.
use log::info;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static SIGNAL_RECEIVED: AtomicU32 = AtomicU32::new(0);

const HANDLED: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

/// Async-safe signal handler: atomic operations only, no allocation,
/// no locks, no I/O.
extern "C" fn signal_handler(signal: libc::c_int) {
    SIGNAL_RECEIVED.store(signal as u32, Ordering::SeqCst);
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the one-shot interruption handlers (SIGINT, SIGTERM, SIGHUP).
/// Must be called early in main, before any phase runs.
pub fn arm() -> crate::config::types::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(signal_handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in HANDLED {
        unsafe {
            signal::sigaction(sig, &action).map_err(|e| {
                crate::config::types::SnapbackError::Signal(format!(
                    "failed to install {:?} handler: {}",
                    sig, e
                ))
            })?;
        }
    }
    Ok(())
}

/// Reset the handled signals to their default disposition.
///
/// Called when cleanup begins; from then on a repeated signal terminates
/// the process plainly rather than racing a second teardown.
pub fn disarm() {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for sig in HANDLED {
        unsafe {
            let _ = signal::sigaction(sig, &action);
        }
    }
}

/// Whether an interruption has been observed
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// The signal that triggered the interruption, if any
pub fn received_signal() -> Option<i32> {
    match SIGNAL_RECEIVED.load(Ordering::SeqCst) {
        0 => None,
        sig => Some(sig as i32),
    }
}

/// Flag an interruption without a signal (embedding and tests)
pub fn request() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Clear the interruption state (tests)
pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
    SIGNAL_RECEIVED.store(0, Ordering::SeqCst);
}

/// Log how the run was interrupted, once observed
pub fn log_interruption() {
    match received_signal() {
        Some(sig) => info!("interrupted by signal {}", sig),
        None => info!("interruption requested"),
    }
}
