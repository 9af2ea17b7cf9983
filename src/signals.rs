//! Termination signal wiring.
//!
//! SIGINT and SIGQUIT set a process-wide atomic flag and nothing else; the
//! event loop checks the flag at the top of every iteration. The handlers
//! are installed without `SA_RESTART` so a signal interrupts the blocking
//! readiness call (`EINTR`), which is what lets the loop notice the flag
//! promptly.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_signum: libc::c_int) {
    // Async-signal-safe: a relaxed store and nothing else.
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Install the SIGINT and SIGQUIT handlers.
pub fn install() -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_signal as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;

        for signum in [libc::SIGINT, libc::SIGQUIT] {
            if libc::sigaction(signum, &action, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(())
}

/// Whether a termination signal has been received.
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_sets_flag() {
        install().unwrap();
        unsafe {
            libc::raise(libc::SIGQUIT);
        }
        assert!(shutdown_requested());
    }
}
