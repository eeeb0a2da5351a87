use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

use crate::registry::RegistryStore;
use crate::scep;

use super::ShutdownSignal;

/// Delay between scan cycles.
///
/// Short enough to land between the MDM agent writing an enrollment
/// entry and the certificate installer reading it, coarse enough to
/// avoid hammering the registry.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Run the scan-and-patch loop until the shutdown signal is raised.
///
/// The signal is observed at the top of each cycle and during the
/// interval sleep, so the loop stops within one interval bound without
/// starting another enumeration.
pub async fn run_patch_daemon<S: RegistryStore>(
    store: S,
    mut shutdown: ShutdownSignal,
) -> Result<()> {
    tracing::info!("MDM SCEP SAN patcher started");

    while !shutdown.is_raised() {
        let summary = scep::run_cycle(&store);
        if summary.patched > 0 {
            tracing::info!(
                "Patched {} of {} entries across {} profiles",
                summary.patched,
                summary.entries,
                summary.profiles
            );
        }

        tokio::select! {
            _ = shutdown.raised() => break,
            _ = sleep(POLL_INTERVAL) => {}
        }
    }

    tracing::info!("MDM SCEP SAN patcher stopped");
    Ok(())
}
