use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::signal::{self, SigHandler, Signal};

static RUNNING: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Install SIGINT/SIGTERM handlers that clear `running`.
///
/// The flag is registered once per process; later calls keep the first flag
/// and only re-install the handlers.
pub fn install_signal_handlers(running: Arc<AtomicBool>) -> nix::Result<()> {
    let registered = RUNNING.get_or_init(|| Arc::clone(&running));
    if !Arc::ptr_eq(registered, &running) {
        tracing::warn!("Signal handlers already bound to another running flag");
    }

    // SAFETY: the handler only performs an atomic store on a flag that is
    // initialised before the handler is installed.
    unsafe {
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_shutdown))?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_shutdown))?;
    }

    Ok(())
}

extern "C" fn handle_shutdown(_: i32) {
    if let Some(running) = RUNNING.get() {
        running.store(false, Ordering::SeqCst);
    }
}
