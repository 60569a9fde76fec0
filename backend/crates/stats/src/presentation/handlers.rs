//! HTTP Handlers

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Json;
use axum::extract::{Path, Query, State};
use kernel::id::EntityId;
use platform::kv::KvStore;

use crate::application::annotate::{BadgeRenderer, Discovered, RetryingAnnotator};
use crate::application::compute_delta::DeltaComputer;
use crate::application::config::StatsConfig;
use crate::application::profile_view::ProfileViewUseCase;
use crate::domain::entities::DeltaResult;
use crate::domain::repository::StatsApi;
use crate::error::StatsResult;
use crate::presentation::dto::{
    AnnotateRequest, AnnotateResponse, AnnotatedEntity, BadgeDto, DeltaQuery, DeltaResponse,
    HealthResponse,
};

/// Shared state for stats handlers
pub struct StatsAppState<A, K> {
    pub computer: Arc<DeltaComputer<A, K>>,
    pub config: Arc<StatsConfig>,
    pub credential_configured: bool,
}

impl<A, K> Clone for StatsAppState<A, K> {
    fn clone(&self) -> Self {
        Self {
            computer: self.computer.clone(),
            config: self.config.clone(),
            credential_configured: self.credential_configured,
        }
    }
}

/// GET /api/stats/{entity_id}?days=N
pub async fn get_delta<A, K>(
    State(state): State<StatsAppState<A, K>>,
    Path(entity_ref): Path<String>,
    Query(query): Query<DeltaQuery>,
) -> StatsResult<Json<DeltaResponse>>
where
    A: StatsApi + Sync + 'static,
    K: KvStore + Sync + 'static,
{
    let entity_id = EntityId::from_str(&entity_ref)?;
    let window = state.config.window_or_default(query.days)?;

    let use_case =
        ProfileViewUseCase::new(state.computer.clone(), state.config.short_window_fallback());

    let view = use_case.execute(entity_id, window).await?;

    Ok(Json(DeltaResponse::from(view)))
}

/// Collects badges for the annotate response
#[derive(Default)]
struct CollectingRenderer {
    badges: Mutex<Vec<AnnotatedEntity>>,
}

impl CollectingRenderer {
    fn into_badges(self) -> Vec<AnnotatedEntity> {
        self.badges
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl BadgeRenderer<()> for CollectingRenderer {
    fn render(&self, _target: &(), entity_id: EntityId, delta: &DeltaResult) {
        self.badges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AnnotatedEntity {
                entity_id: entity_id.get(),
                delta: *delta,
                badge: BadgeDto::from(delta),
            });
    }
}

/// POST /api/stats/annotate
pub async fn annotate<A, K>(
    State(state): State<StatsAppState<A, K>>,
    Json(req): Json<AnnotateRequest>,
) -> StatsResult<Json<AnnotateResponse>>
where
    A: StatsApi + Sync + 'static,
    K: KvStore + Sync + 'static,
{
    let window = state.config.window_or_default(req.window_days)?;

    let mut ids = Vec::with_capacity(req.entity_ids.len());
    let mut invalid = Vec::new();
    for raw in req.entity_ids {
        match EntityId::from_str(&raw) {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => invalid.push(raw),
        }
    }

    let annotator = RetryingAnnotator::new(
        state.computer.clone(),
        state.config.retry_policy(),
        window,
        CollectingRenderer::default(),
    )
    .with_max_in_flight(state.config.max_concurrent_annotations);

    let discovered = futures::stream::iter(ids.into_iter().map(|id| Discovered::new(id, ())));
    let summary = annotator.run(discovered).await?;

    let badges = annotator.into_renderer().into_badges();

    Ok(Json(AnnotateResponse::new(
        window.days(),
        badges,
        summary,
        invalid,
    )))
}

/// GET /api/stats/health
pub async fn health<A, K>(State(state): State<StatsAppState<A, K>>) -> Json<HealthResponse>
where
    A: StatsApi + Sync + 'static,
    K: KvStore + Sync + 'static,
{
    Json(HealthResponse {
        status: "ok".to_string(),
        credential_configured: state.credential_configured,
        request_gap_ms: state.config.request_gap.as_millis() as u64,
        cache_ttl_secs: state.config.cache_ttl.as_secs(),
    })
}
