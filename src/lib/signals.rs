//! `SIGINT` disposition helpers around blocking waits.

/// Restores the previous `SIGINT` disposition on drop.
#[cfg(unix)]
pub struct InterruptGuard {
    previous: libc::sighandler_t,
}

#[cfg(unix)]
impl InterruptGuard {
    /// Ignore `SIGINT` in this process, e.g. while a foreground child owns the terminal.
    pub fn ignore() -> Self {
        let previous = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        Self { previous }
    }

    /// Terminate with exit code 1 on `SIGINT`, e.g. while blocked on a prompt.
    pub fn exit_on_interrupt() -> Self {
        let handler: extern "C" fn(libc::c_int) = exit_on_interrupt_handler;
        let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        unsafe {
            libc::signal(libc::SIGINT, self.previous);
        }
    }
}

#[cfg(unix)]
extern "C" fn exit_on_interrupt_handler(_signal: libc::c_int) {
    unsafe { libc::_exit(1) }
}

/// Reset `SIGINT` to the default action. Async-signal-safe, for use in `pre_exec`.
#[cfg(unix)]
pub fn restore_default_interrupt() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Returns true if the status reports termination by `SIGINT`.
#[cfg(unix)]
pub fn terminated_by_interrupt(status: &std::process::ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    status.signal() == Some(libc::SIGINT)
}

#[cfg(not(unix))]
pub struct InterruptGuard;

#[cfg(not(unix))]
impl InterruptGuard {
    pub fn ignore() -> Self {
        Self
    }

    pub fn exit_on_interrupt() -> Self {
        Self
    }
}

#[cfg(not(unix))]
pub fn terminated_by_interrupt(_status: &std::process::ExitStatus) -> bool {
    false
}
