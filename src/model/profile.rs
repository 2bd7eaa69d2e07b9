use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse pacing status toward the required-hours target.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStatus {
    OnTrack,
    NeedsAttention,
    AtRisk,
}

/// One per student. Workplace coordinates lock after the first save and can
/// only change through the edit-request workflow handled elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct StudentProfile {
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "Acme Software Services")]
    pub workplace_name: Option<String>,
    #[schema(example = 10.3157)]
    pub workplace_lat: Option<f64>,
    #[schema(example = 123.8854)]
    pub workplace_lon: Option<f64>,
    /// Cached sum of hours over closed records; recomputed, never incremented.
    #[schema(example = 182.5)]
    pub total_hours_accumulated: f64,
    pub status: ProgressStatus,
    pub workplace_location_locked: bool,
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub training_start_date: Option<NaiveDate>,
    #[schema(example = "2026-05-29", format = "date", value_type = Option<String>)]
    pub expected_end_date: Option<NaiveDate>,
}

impl StudentProfile {
    /// Training period used for pacing, when both ends are provisioned.
    pub fn training_period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.training_start_date?, self.expected_end_date?))
    }
}
