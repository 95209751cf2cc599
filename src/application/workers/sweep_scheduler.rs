//! Periodic expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

use crate::application::services::ExpirySweepService;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Runs the sweep every `period`, first one `period` after start.
///
/// Never returns; spawn it and abort the handle to stop. A failed run is
/// logged and the next one happens on schedule.
pub async fn run_sweep_scheduler<L, C>(sweep: Arc<ExpirySweepService<L, C>>, period: Duration)
where
    L: LinkRepository + ?Sized,
    C: CacheService + ?Sized,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "Expiry sweep scheduled");

    loop {
        ticker.tick().await;

        match sweep.run(false).await {
            Ok(report) if report.found > 0 => {
                info!(
                    deleted = report.deleted,
                    failed = report.failed,
                    "Scheduled expiry sweep removed links"
                );
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Scheduled expiry sweep failed"),
        }
    }
}
