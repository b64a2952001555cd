//! SIGCHLD discipline.
//!
//! The contract: SIGCHLD is blocked for the duration of a statement walk
//! (covering every synchronous `waitpid`) and unblocked whenever the
//! shell sits reading input, so asynchronously exiting children are still
//! reaped between statements.

use nix::libc;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// Reap every child that has changed state. A single SIGCHLD delivery may
/// stand for several exited children, hence the WNOHANG loop. Only
/// async-signal-safe calls are permitted in this function.
extern "C" fn on_sigchld(_signo: libc::c_int) {
    let mut status: libc::c_int = 0;
    unsafe {
        while libc::waitpid(-1, &mut status, libc::WNOHANG | libc::WUNTRACED) > 0 {}
    }
}

/// Install the SIGCHLD handler. Called once at process startup.
///
/// # Errors
///
/// Returns the underlying `sigaction` failure, which can only happen on a
/// platform that rejects SIGCHLD handling outright.
pub fn install_sigchld_handler() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigchld),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGCHLD, &action) }?;
    Ok(())
}

fn sigchld_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    set
}

/// Block SIGCHLD on the calling thread.
pub fn block_sigchld() {
    let _ = sigchld_set().thread_block();
}

/// Unblock SIGCHLD on the calling thread.
pub fn unblock_sigchld() {
    let _ = sigchld_set().thread_unblock();
}

/// Whether SIGCHLD is blocked on the calling thread.
#[must_use]
pub fn sigchld_is_blocked() -> bool {
    SigSet::thread_get_mask()
        .map(|mask| mask.contains(Signal::SIGCHLD))
        .unwrap_or(false)
}
