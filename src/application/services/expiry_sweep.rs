//! Removal of expired links.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::errors::LinkError;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired links seen.
    pub found: usize,
    /// Links removed from the store.
    pub deleted: usize,
    /// Links whose deletion failed.
    pub failed: usize,
    /// Links already gone when their turn came (a concurrent sweep, say).
    pub skipped: usize,
    pub dry_run: bool,
    /// Codes of the expired links, in sweep order.
    pub codes: Vec<String>,
}

/// Hard-deletes links whose expiry has passed.
///
/// Operates on the expired set only; soft-deleted links are left alone.
/// Each deletion stands on its own: a failure is counted and logged, and the
/// sweep moves on.
pub struct ExpirySweepService<L: LinkRepository + ?Sized, C: CacheService + ?Sized> {
    link_repository: Arc<L>,
    cache: Arc<C>,
}

impl<L: LinkRepository + ?Sized, C: CacheService + ?Sized> ExpirySweepService<L, C> {
    pub fn new(link_repository: Arc<L>, cache: Arc<C>) -> Self {
        Self {
            link_repository,
            cache,
        }
    }

    /// Runs one sweep. With `dry_run` the expired links are only listed.
    ///
    /// # Errors
    ///
    /// Only listing the expired links can fail the run.
    pub async fn run(&self, dry_run: bool) -> Result<SweepReport, LinkError> {
        let expired = self.link_repository.list_expired().await?;

        let mut report = SweepReport {
            found: expired.len(),
            dry_run,
            codes: expired.iter().map(|l| l.short_code.clone()).collect(),
            ..SweepReport::default()
        };

        if dry_run || expired.is_empty() {
            info!(found = report.found, dry_run, "Expiry sweep listed links");
            return Ok(report);
        }

        for link in &expired {
            match self.link_repository.delete(link).await {
                Ok(true) => {
                    report.deleted += 1;
                    if let Err(e) = self.cache.forget(&link.short_code).await {
                        warn!(code = %link.short_code, error = %e, "Failed to evict swept link");
                    }
                }
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(code = %link.short_code, link_id = link.id, error = %e, "Failed to delete expired link");
                }
            }
        }

        info!(
            found = report.found,
            deleted = report.deleted,
            failed = report.failed,
            skipped = report.skipped,
            "Expiry sweep finished"
        );

        Ok(report)
    }
}
