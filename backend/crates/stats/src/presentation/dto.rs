//! API DTOs (Data Transfer Objects)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::annotate::AnnotateSummary;
use crate::application::profile_view::ProfileView;
use crate::domain::entities::DeltaResult;
use crate::presentation::badge::{BadgeTier, badge_text, snapshot_note};

/// Query for GET /api/stats/{entity_id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeltaQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

/// Rendered badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDto {
    pub text: String,
    pub color: String,
}

impl From<&DeltaResult> for BadgeDto {
    fn from(delta: &DeltaResult) -> Self {
        Self {
            text: badge_text(delta),
            color: BadgeTier::for_play(delta.play).color().to_string(),
        }
    }
}

/// Response for GET /api/stats/{entity_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaResponse {
    pub entity_id: u64,
    pub window_days: u32,
    pub delta: DeltaResult,
    pub badge: BadgeDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<ProfileView> for DeltaResponse {
    fn from(view: ProfileView) -> Self {
        Self {
            entity_id: view.entity_id.get(),
            window_days: view.window.days(),
            badge: BadgeDto::from(&view.delta),
            delta: view.delta,
            note: view.snapshot_date.map(snapshot_note),
            snapshot_date: view.snapshot_date,
        }
    }
}

/// Request for POST /api/stats/annotate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateRequest {
    /// Numeric IDs or any text carrying `XID=<digits>`
    pub entity_ids: Vec<String>,
    #[serde(default)]
    pub window_days: Option<u32>,
}

/// One rendered entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedEntity {
    pub entity_id: u64,
    pub delta: DeltaResult,
    pub badge: BadgeDto,
}

/// Response for POST /api/stats/annotate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResponse {
    pub window_days: u32,
    pub badges: Vec<AnnotatedEntity>,
    /// Entities that failed after retries
    pub skipped: usize,
    /// References that were not entity IDs
    pub invalid: Vec<String>,
}

impl AnnotateResponse {
    pub fn new(
        window_days: u32,
        mut badges: Vec<AnnotatedEntity>,
        summary: AnnotateSummary,
        invalid: Vec<String>,
    ) -> Self {
        badges.sort_by_key(|b| b.entity_id);
        Self {
            window_days,
            badges,
            skipped: summary.skipped,
            invalid,
        }
    }
}

/// Response for GET /api/stats/health
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub credential_configured: bool,
    pub request_gap_ms: u64,
    pub cache_ttl_secs: u64,
}
