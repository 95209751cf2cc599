//! Background consumer of visit events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::application::services::VisitRecorder;
use crate::domain::entities::Visit;
use crate::domain::errors::StoreError;
use crate::domain::repositories::VisitRepository;
use crate::domain::visit_event::VisitEvent;

/// Tuning for [`run_visit_worker`].
#[derive(Debug, Clone, Copy)]
pub struct VisitWorkerConfig {
    /// Visits written at the same time.
    pub concurrency: usize,
    /// Tries per visit, the first one included.
    pub max_attempts: usize,
}

impl Default for VisitWorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_attempts: 3,
        }
    }
}

/// Drains `rx` until every sender is dropped, then waits for in-flight writes.
///
/// Each event is recorded on its own task, at most `config.concurrency` at
/// once. A visit that still fails after `config.max_attempts` is logged and
/// dropped.
pub async fn run_visit_worker<V>(
    mut rx: mpsc::Receiver<VisitEvent>,
    recorder: Arc<VisitRecorder<V>>,
    config: VisitWorkerConfig,
) where
    V: VisitRepository + ?Sized + 'static,
{
    let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    info!(
        concurrency = config.concurrency,
        max_attempts = config.max_attempts,
        "Visit worker started"
    );

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let recorder = recorder.clone();

        tasks.spawn(async move {
            let _permit = permit;
            match record_with_retry(&recorder, &event, config.max_attempts).await {
                Ok(visit) => {
                    debug!(link_id = event.link_id, visit_id = visit.id, "Visit recorded");
                }
                Err(StoreError::LinkGone(link_id)) => {
                    debug!(link_id, code = %event.short_code, "Visit dropped, link no longer exists");
                }
                Err(e) => {
                    error!(
                        link_id = event.link_id,
                        code = %event.short_code,
                        error = %e,
                        "Visit dropped after retries"
                    );
                }
            }
        });

        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                error!(error = %e, "Visit task panicked");
            }
        }
    }

    while let Some(finished) = tasks.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "Visit task panicked");
        }
    }

    info!("Visit worker stopped");
}

/// Records one visit, retrying transient store failures with exponential backoff.
///
/// [`StoreError::LinkGone`] is final: the link was deleted and will not come back.
pub async fn record_with_retry<V>(
    recorder: &VisitRecorder<V>,
    event: &VisitEvent,
    max_attempts: usize,
) -> Result<Visit, StoreError>
where
    V: VisitRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(max_attempts.saturating_sub(1));

    RetryIf::spawn(
        strategy,
        move || async move {
            let result = recorder
                .record(event.link_id, &event.metadata, event.occurred_at)
                .await;
            if let Err(e) = &result {
                warn!(link_id = event.link_id, error = %e, "Visit write failed");
            }
            result
        },
        |e: &StoreError| !matches!(e, StoreError::LinkGone(_)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockVisitRepository;
    use crate::domain::visit_event::VisitMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(link_id: i64) -> VisitEvent {
        VisitEvent::new(link_id, "abc1234", VisitMetadata::default())
    }

    #[tokio::test]
    async fn test_retries_transient_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut repo = MockVisitRepository::new();
        repo.expect_record().times(2).returning(move |v| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::Database("deadlock detected".to_string()))
            } else {
                Ok(v.into_visit(77))
            }
        });

        let recorder = VisitRecorder::new(Arc::new(repo));
        let visit = record_with_retry(&recorder, &event(1), 3).await.unwrap();

        assert_eq!(visit.id, 77);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mut repo = MockVisitRepository::new();
        repo.expect_record()
            .times(3)
            .returning(|_| Err(StoreError::Database("down".to_string())));

        let recorder = VisitRecorder::new(Arc::new(repo));
        let err = record_with_retry(&recorder, &event(1), 3).await.unwrap_err();

        assert!(matches!(err, StoreError::Database(_)));
    }

    #[tokio::test]
    async fn test_link_gone_is_not_retried() {
        let mut repo = MockVisitRepository::new();
        repo.expect_record()
            .times(1)
            .returning(|v| Err(StoreError::LinkGone(v.link_id)));

        let recorder = VisitRecorder::new(Arc::new(repo));
        let err = record_with_retry(&recorder, &event(5), 3).await.unwrap_err();

        assert_eq!(err, StoreError::LinkGone(5));
    }

    #[tokio::test]
    async fn test_worker_drains_channel_and_stops() {
        let mut repo = MockVisitRepository::new();
        repo.expect_record()
            .times(5)
            .returning(|v| Ok(v.into_visit(1)));

        let recorder = Arc::new(VisitRecorder::new(Arc::new(repo)));
        let (tx, rx) = mpsc::channel(16);

        for id in 0..5 {
            tx.send(event(id)).await.unwrap();
        }
        drop(tx);

        tokio::time::timeout(
            Duration::from_secs(5),
            run_visit_worker(rx, recorder, VisitWorkerConfig::default()),
        )
        .await
        .expect("worker should stop once the channel closes");
    }

    #[tokio::test]
    async fn test_failing_visit_does_not_stop_worker() {
        let mut repo = MockVisitRepository::new();
        repo.expect_record().returning(|v| {
            if v.link_id == 1 {
                Err(StoreError::Database("bad row".to_string()))
            } else {
                let id = v.link_id;
                Ok(v.into_visit(id))
            }
        });

        let recorder = Arc::new(VisitRecorder::new(Arc::new(repo)));
        let (tx, rx) = mpsc::channel(16);
        tx.send(event(1)).await.unwrap();
        tx.send(event(2)).await.unwrap();
        drop(tx);

        let config = VisitWorkerConfig {
            concurrency: 1,
            max_attempts: 2,
        };
        tokio::time::timeout(Duration::from_secs(5), run_visit_worker(rx, recorder, config))
            .await
            .expect("worker should finish");
    }
}
