//! Annotate Use Case
//!
//! Batch orchestration: for each discovered entity, compute a delta through
//! the queued strategy with bounded retries, and hand successes to a
//! renderer. One failing entity never aborts the batch; only a missing
//! credential does.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{Stream, StreamExt, TryStreamExt};
use kernel::id::EntityId;
use platform::http::FetchStrategy;
use platform::kv::KvStore;

use crate::application::compute_delta::DeltaComputer;
use crate::domain::entities::DeltaResult;
use crate::domain::repository::StatsApi;
use crate::domain::value_objects::WindowDays;
use crate::error::{StatsError, StatsResult};

/// Retry policy
///
/// Up to `attempts` tries; the wait after attempt `n` is `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(300))
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// An entity found by the discovery collaborator, with where to render it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered<T> {
    pub entity_id: EntityId,
    pub target: T,
}

impl<T> Discovered<T> {
    pub fn new(entity_id: EntityId, target: T) -> Self {
        Self { entity_id, target }
    }
}

/// Render collaborator
pub trait BadgeRenderer<T>: Send + Sync {
    fn render(&self, target: &T, entity_id: EntityId, delta: &DeltaResult);
}

impl<T, F> BadgeRenderer<T> for F
where
    F: Fn(&T, EntityId, &DeltaResult) + Send + Sync,
{
    fn render(&self, target: &T, entity_id: EntityId, delta: &DeltaResult) {
        self(target, entity_id, delta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateOutcome {
    Rendered,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub rendered: usize,
    pub skipped: usize,
}

/// Annotate Use Case
pub struct RetryingAnnotator<A, K, R> {
    computer: Arc<DeltaComputer<A, K>>,
    policy: RetryPolicy,
    window: WindowDays,
    renderer: R,
    max_in_flight: Option<usize>,
}

impl<A, K, R> RetryingAnnotator<A, K, R>
where
    A: StatsApi + Sync,
    K: KvStore + Sync,
{
    pub fn new(
        computer: Arc<DeltaComputer<A, K>>,
        policy: RetryPolicy,
        window: WindowDays,
        renderer: R,
    ) -> Self {
        Self {
            computer,
            policy,
            window,
            renderer,
            max_in_flight: None,
        }
    }

    /// Cap on entities processed at once; unbounded by default
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.max_in_flight = limit;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Annotate one entity
    ///
    /// Returns `Err` only for fatal errors. Exhausted retries and
    /// non-retryable failures are logged and reported as `Skipped`.
    pub async fn annotate<T>(&self, item: &Discovered<T>) -> StatsResult<AnnotateOutcome>
    where
        R: BadgeRenderer<T>,
    {
        let entity_id = item.entity_id;

        for attempt in 1..=self.policy.attempts {
            match self
                .computer
                .compute(entity_id, self.window, FetchStrategy::Queued)
                .await
            {
                Ok(delta) => {
                    self.renderer.render(&item.target, entity_id, &delta);
                    return Ok(AnnotateOutcome::Rendered);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(
                        entity_id = %entity_id,
                        attempt,
                        error = %e,
                        "Giving up on entity"
                    );
                    return Ok(AnnotateOutcome::Skipped);
                }
                Err(e) => {
                    tracing::debug!(entity_id = %entity_id, attempt, error = %e, "Attempt failed");
                    if attempt < self.policy.attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }

        tracing::warn!(
            entity_id = %entity_id,
            attempts = self.policy.attempts,
            "Retries exhausted, skipping entity"
        );
        Ok(AnnotateOutcome::Skipped)
    }

    /// Consume a discovery stream until it ends or a fatal error occurs
    pub async fn run<T, S>(&self, discovered: S) -> StatsResult<AnnotateSummary>
    where
        S: Stream<Item = Discovered<T>> + Send,
        T: Send + Sync,
        R: BadgeRenderer<T>,
    {
        let rendered = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        discovered
            .map(Ok::<_, StatsError>)
            .try_for_each_concurrent(self.max_in_flight, |item| {
                let (rendered, skipped) = (&rendered, &skipped);
                async move {
                    match self.annotate(&item).await? {
                        AnnotateOutcome::Rendered => rendered.fetch_add(1, Ordering::Relaxed),
                        AnnotateOutcome::Skipped => skipped.fetch_add(1, Ordering::Relaxed),
                    };
                    Ok::<(), StatsError>(())
                }
            })
            .await?;

        let summary = AnnotateSummary {
            rendered: rendered.into_inner(),
            skipped: skipped.into_inner(),
        };
        tracing::info!(
            rendered = summary.rendered,
            skipped = summary.skipped,
            "Annotation run finished"
        );
        Ok(summary)
    }
}
