// Poll loop driving the SCEP scan at a fixed cadence.
//
// One cooperative task that alternates scanning with an interruptible
// sleep until the shutdown signal is raised, either by Ctrl+C in the
// foreground or by the service control manager when hosted as a service.

mod daemon;
mod shutdown;

pub use daemon::{POLL_INTERVAL, run_patch_daemon};
pub use shutdown::{ShutdownHandle, ShutdownSignal, shutdown_pair};
