use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, BlockType};

/// Display status of one block, recomputed from wall clock + records on
/// every call. Blocks are evaluated independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlockStatus {
    NotStarted,
    TimeInAvailable,
    TimeIn,
    Completed,
    Missed,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct BlockState {
    pub status: BlockStatus,
    pub can_time_in: bool,
    pub can_time_out: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockDefinition {
    pub block: BlockType,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BlockDefinition {
    pub fn window_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Time-in is permitted strictly inside [start, end).
    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.start && t < self.end
    }
}

/// The day's three fixed, ordered, non-overlapping windows.
#[derive(Debug, Clone, Copy)]
pub struct BlockSchedule {
    blocks: [BlockDefinition; 3],
}

impl BlockSchedule {
    pub fn new(
        morning: (NaiveTime, NaiveTime),
        afternoon: (NaiveTime, NaiveTime),
        overtime: (NaiveTime, NaiveTime),
    ) -> Self {
        Self {
            blocks: [
                BlockDefinition { block: BlockType::Morning, start: morning.0, end: morning.1 },
                BlockDefinition { block: BlockType::Afternoon, start: afternoon.0, end: afternoon.1 },
                BlockDefinition { block: BlockType::Overtime, start: overtime.0, end: overtime.1 },
            ],
        }
    }

    pub fn definitions(&self) -> &[BlockDefinition; 3] {
        &self.blocks
    }

    pub fn definition(&self, block: BlockType) -> &BlockDefinition {
        match block {
            BlockType::Morning => &self.blocks[0],
            BlockType::Afternoon => &self.blocks[1],
            BlockType::Overtime => &self.blocks[2],
        }
    }

    pub fn state_for(
        &self,
        block: BlockType,
        now: NaiveDateTime,
        record: Option<&AttendanceRecord>,
    ) -> BlockState {
        let def = self.definition(block);
        match record {
            Some(r) if r.time_out.is_some() => BlockState {
                status: BlockStatus::Completed,
                can_time_in: false,
                can_time_out: false,
            },
            Some(r) => {
                // Open record; time-out is allowed any time at or after
                // time-in, even past block end (hours are capped at close).
                let can_time_out = r.time_in.is_some_and(|ti| now >= ti);
                BlockState { status: BlockStatus::TimeIn, can_time_in: false, can_time_out }
            }
            None if def.contains(now.time()) => BlockState {
                status: BlockStatus::TimeInAvailable,
                can_time_in: true,
                can_time_out: false,
            },
            None if now.time() < def.start => BlockState {
                status: BlockStatus::NotStarted,
                can_time_in: false,
                can_time_out: false,
            },
            None => BlockState {
                status: BlockStatus::Missed,
                can_time_in: false,
                can_time_out: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn schedule() -> BlockSchedule {
        BlockSchedule::new((t(7, 0), t(12, 0)), (t(13, 0), t(17, 0)), (t(17, 30), t(20, 30)))
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_time(t(h, m))
    }

    fn open_record(time_in: NaiveDateTime) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            student_id: 1000,
            date: time_in.date(),
            block_type: BlockType::Morning,
            time_in: Some(time_in),
            time_out: None,
            hours_earned: 0.0,
            lat_in: None,
            lon_in: None,
            photo_path: None,
        }
    }

    #[test]
    fn before_start_is_not_started() {
        let state = schedule().state_for(BlockType::Morning, at(6, 30), None);
        assert_eq!(state.status, BlockStatus::NotStarted);
        assert!(!state.can_time_in && !state.can_time_out);
    }

    #[test]
    fn window_start_opens_time_in() {
        let state = schedule().state_for(BlockType::Morning, at(7, 0), None);
        assert_eq!(state.status, BlockStatus::TimeInAvailable);
        assert!(state.can_time_in);
    }

    #[test]
    fn window_end_is_exclusive() {
        let state = schedule().state_for(BlockType::Morning, at(12, 0), None);
        assert_eq!(state.status, BlockStatus::Missed);
        assert!(!state.can_time_in);
    }

    #[test]
    fn open_record_allows_time_out_even_past_block_end() {
        let record = open_record(at(8, 0));
        let state = schedule().state_for(BlockType::Morning, at(14, 0), Some(&record));
        assert_eq!(state.status, BlockStatus::TimeIn);
        assert!(state.can_time_out);
        assert!(!state.can_time_in);
    }

    #[test]
    fn closed_record_is_completed() {
        let mut record = open_record(at(8, 0));
        record.time_out = Some(at(11, 0));
        let state = schedule().state_for(BlockType::Morning, at(11, 30), Some(&record));
        assert_eq!(state.status, BlockStatus::Completed);
        assert!(!state.can_time_in && !state.can_time_out);
    }

    #[test]
    fn blocks_are_evaluated_independently() {
        let record = open_record(at(8, 0));
        // Morning is open, afternoon is still its own not-started window
        let afternoon = schedule().state_for(BlockType::Afternoon, at(8, 30), None);
        assert_eq!(afternoon.status, BlockStatus::NotStarted);
        let morning = schedule().state_for(BlockType::Morning, at(8, 30), Some(&record));
        assert_eq!(morning.status, BlockStatus::TimeIn);
    }

    #[test]
    fn window_hours() {
        assert!((schedule().definition(BlockType::Morning).window_hours() - 5.0).abs() < 1e-9);
        assert!((schedule().definition(BlockType::Overtime).window_hours() - 3.0).abs() < 1e-9);
    }
}
