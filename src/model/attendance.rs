use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three fixed daily attendance windows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BlockType {
    Morning,
    Afternoon,
    Overtime,
}

/// One row per (student, calendar date, block). Never deleted; corrections
/// go through an administrative override outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub student_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub block_type: BlockType,
    #[schema(example = "2026-01-05T08:01:30", value_type = Option<String>)]
    pub time_in: Option<NaiveDateTime>,
    #[schema(example = "2026-01-05T11:58:02", value_type = Option<String>)]
    pub time_out: Option<NaiveDateTime>,
    /// 0 while the record is open; set exactly once at close.
    #[schema(example = 3.94)]
    pub hours_earned: f64,
    pub lat_in: Option<f64>,
    pub lon_in: Option<f64>,
    pub photo_path: Option<String>,
}

impl AttendanceRecord {
    /// Time-in set, time-out still pending.
    pub fn is_open(&self) -> bool {
        self.time_in.is_some() && self.time_out.is_none()
    }
}

/// Insert payload for a fresh open record.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub student_id: u64,
    pub date: NaiveDate,
    pub block_type: BlockType,
    pub time_in: NaiveDateTime,
    pub lat_in: Option<f64>,
    pub lon_in: Option<f64>,
    pub photo_path: Option<String>,
}

impl NewAttendanceRecord {
    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id: self.student_id,
            date: self.date,
            block_type: self.block_type,
            time_in: Some(self.time_in),
            time_out: None,
            hours_earned: 0.0,
            lat_in: self.lat_in,
            lon_in: self.lon_in,
            photo_path: self.photo_path,
        }
    }
}
