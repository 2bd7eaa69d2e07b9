use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use super::compliance::ComplianceGate;
use super::error::AttendanceError;
use super::geofence::{Coordinate, GeofenceCheck, GeofenceVerifier};
use super::hours::{HoursAccumulator, PacingPolicy};
use super::round_hours;
use super::schedule::{BlockSchedule, BlockState};
use crate::model::attendance::{AttendanceRecord, BlockType, NewAttendanceRecord};
use crate::model::profile::{ProgressStatus, StudentProfile};
use crate::repo::{AttendanceRepository, ComplianceRepository, ProfileRepository, RepoError};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimeOutOutcome {
    #[schema(example = 42)]
    pub record_id: u64,
    #[schema(example = 3.0)]
    pub hours_earned: f64,
    #[schema(example = 185.5)]
    pub total_hours: f64,
    pub status: ProgressStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LocationCheck {
    pub valid: bool,
    #[schema(example = 24.7)]
    pub distance_m: f64,
    #[schema(example = "Acme Software Services")]
    pub workplace_name: Option<String>,
    pub workplace: Coordinate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BlockOverview {
    pub block: BlockType,
    #[schema(example = "07:00:00", value_type = String)]
    pub start: chrono::NaiveTime,
    #[schema(example = "12:00:00", value_type = String)]
    pub end: chrono::NaiveTime,
    #[serde(flatten)]
    pub state: BlockState,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressSummary {
    #[schema(example = 185.5)]
    pub total_hours: f64,
    #[schema(example = 600.0)]
    pub required_hours: f64,
    pub status: ProgressStatus,
}

/// The per-(student, date, block) state machine: NoRecord -> Open -> Closed.
/// Every entry point runs the compliance gate first and mutates nothing on
/// failure; the atomicity of the two transitions lives in the repository
/// (unique-key insert, conditional update).
pub struct AttendanceRecorder<A, P, C> {
    attendance: A,
    profiles: P,
    gate: ComplianceGate<C>,
    schedule: BlockSchedule,
    geofence: GeofenceVerifier,
    hours: HoursAccumulator<A, P>,
}

impl<A, P, C> AttendanceRecorder<A, P, C>
where
    A: AttendanceRepository + Clone,
    P: ProfileRepository + Clone,
    C: ComplianceRepository,
{
    pub fn new(
        attendance: A,
        profiles: P,
        compliance: C,
        required_documents: u32,
        schedule: BlockSchedule,
        geofence: GeofenceVerifier,
        pacing: PacingPolicy,
    ) -> Self {
        let hours = HoursAccumulator::new(attendance.clone(), profiles.clone(), pacing);
        Self {
            attendance,
            profiles,
            gate: ComplianceGate::new(compliance, required_documents),
            schedule,
            geofence,
            hours,
        }
    }

    pub async fn time_in(
        &self,
        student_id: u64,
        block: BlockType,
        coordinate: Option<Coordinate>,
        photo_path: Option<String>,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.gate.check_access(student_id).await?;

        let date = now.date();
        let existing = self.attendance.find_for_block(student_id, date, block).await?;
        let state = self.schedule.state_for(block, now, existing.as_ref());
        if !state.can_time_in {
            return Err(if existing.is_some() {
                AttendanceError::DuplicateTimeIn { block }
            } else {
                AttendanceError::BlockNotEligible { block }
            });
        }

        let mut lat_in = None;
        let mut lon_in = None;
        if let Some(reported) = coordinate {
            let check = self.verify_within_radius(student_id, reported).await?;
            tracing::debug!(student_id, %block, distance_m = check.distance_m, "geofence passed");
            lat_in = Some(reported.lat);
            lon_in = Some(reported.lon);
        }

        let new = NewAttendanceRecord {
            student_id,
            date,
            block_type: block,
            time_in: now,
            lat_in,
            lon_in,
            photo_path,
        };
        // A concurrent duplicate loses the race at the unique key, not here.
        let id = match self.attendance.insert_open(&new).await {
            Ok(id) => id,
            Err(RepoError::Duplicate) => return Err(AttendanceError::DuplicateTimeIn { block }),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(student_id, %block, record_id = id, "time-in recorded");
        Ok(new.into_record(id))
    }

    pub async fn time_out(
        &self,
        student_id: u64,
        block: BlockType,
        coordinate: Option<Coordinate>,
        now: NaiveDateTime,
    ) -> Result<TimeOutOutcome, AttendanceError> {
        self.gate.check_access(student_id).await?;

        let record = self
            .attendance
            .find_for_block(student_id, now.date(), block)
            .await?
            .ok_or(AttendanceError::NoOpenRecord { block })?;
        if record.time_out.is_some() {
            return Err(AttendanceError::AlreadyClosed);
        }
        let time_in = record.time_in.ok_or(AttendanceError::NoOpenRecord { block })?;
        if now < time_in {
            return Err(AttendanceError::BlockNotEligible { block });
        }

        if let Some(reported) = coordinate {
            self.verify_within_radius(student_id, reported).await?;
        }

        let window = self.schedule.definition(block).window_hours();
        let elapsed = (now - time_in).num_seconds() as f64 / 3600.0;
        let hours_earned = round_hours(elapsed.min(window).max(0.0));

        if !self.attendance.close_if_open(record.id, now, hours_earned).await? {
            return Err(AttendanceError::AlreadyClosed);
        }

        let (total_hours, status) = self.hours.refresh(student_id, now.date()).await?;
        tracing::info!(student_id, %block, record_id = record.id, hours_earned, "time-out recorded");
        Ok(TimeOutOutcome { record_id: record.id, hours_earned, total_hours, status })
    }

    /// Display helper for the clock page: distance and validity against the
    /// registered workplace, without touching any record.
    pub async fn check_location(
        &self,
        student_id: u64,
        reported: Coordinate,
    ) -> Result<LocationCheck, AttendanceError> {
        self.gate.check_access(student_id).await?;

        let profile = self.load_profile(student_id).await?;
        let workplace = workplace_coordinate(&profile)?;
        let check = self.geofence.check(workplace, reported)?;
        Ok(LocationCheck {
            valid: check.within,
            distance_m: check.distance_m,
            workplace_name: profile.workplace_name,
            workplace,
        })
    }

    pub async fn day_overview(
        &self,
        student_id: u64,
        now: NaiveDateTime,
    ) -> Result<Vec<BlockOverview>, AttendanceError> {
        self.gate.check_access(student_id).await?;

        let records = self.attendance.records_for_day(student_id, now.date()).await?;
        let overview = self
            .schedule
            .definitions()
            .iter()
            .map(|def| {
                let record = records.iter().find(|r| r.block_type == def.block);
                BlockOverview {
                    block: def.block,
                    start: def.start,
                    end: def.end,
                    state: self.schedule.state_for(def.block, now, record),
                }
            })
            .collect();
        Ok(overview)
    }

    pub async fn progress(
        &self,
        student_id: u64,
        now: NaiveDateTime,
    ) -> Result<ProgressSummary, AttendanceError> {
        self.gate.check_access(student_id).await?;

        let (total_hours, status) = self.hours.refresh(student_id, now.date()).await?;
        Ok(ProgressSummary {
            total_hours,
            required_hours: self.hours.policy().required_hours,
            status,
        })
    }

    async fn load_profile(&self, student_id: u64) -> Result<StudentProfile, AttendanceError> {
        self.profiles
            .find(student_id)
            .await?
            .ok_or(AttendanceError::WorkplaceNotRegistered)
    }

    async fn verify_within_radius(
        &self,
        student_id: u64,
        reported: Coordinate,
    ) -> Result<GeofenceCheck, AttendanceError> {
        let profile = self.load_profile(student_id).await?;
        let workplace = workplace_coordinate(&profile)?;
        let check = self.geofence.check(workplace, reported)?;
        if !check.within {
            return Err(AttendanceError::LocationOutOfRadius {
                distance_m: check.distance_m,
                radius_m: self.geofence.radius_m,
            });
        }
        Ok(check)
    }
}

fn workplace_coordinate(profile: &StudentProfile) -> Result<Coordinate, AttendanceError> {
    match (profile.workplace_lat, profile.workplace_lon) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
        _ => Err(AttendanceError::WorkplaceNotRegistered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schedule::BlockStatus;
    use crate::repo::memory::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_time(t(h, m))
    }

    fn store_with_student(student_id: u64) -> MemoryStore {
        let store = MemoryStore::new();
        store.set_approved_documents(student_id, 7);
        store.put_profile(StudentProfile {
            user_id: student_id,
            workplace_name: Some("Acme Software Services".into()),
            workplace_lat: Some(10.3157),
            workplace_lon: Some(123.8854),
            total_hours_accumulated: 0.0,
            status: ProgressStatus::OnTrack,
            workplace_location_locked: true,
            training_start_date: Some(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            expected_end_date: Some(NaiveDate::from_ymd_opt(2026, 5, 29).unwrap()),
        });
        store
    }

    fn recorder(
        store: &MemoryStore,
    ) -> AttendanceRecorder<
        crate::repo::memory::MemoryAttendanceRepo,
        crate::repo::memory::MemoryProfileRepo,
        crate::repo::memory::MemoryComplianceRepo,
    > {
        AttendanceRecorder::new(
            store.attendance(),
            store.profiles(),
            store.compliance(),
            7,
            BlockSchedule::new((t(7, 0), t(12, 0)), (t(13, 0), t(17, 0)), (t(17, 30), t(20, 30))),
            GeofenceVerifier::new(40.0),
            PacingPolicy { required_hours: 600.0, on_track_ratio: 0.9, needs_attention_ratio: 0.6 },
        )
    }

    // ~25 m north of the registered workplace
    fn nearby() -> Coordinate {
        Coordinate::new(10.315925, 123.8854).unwrap()
    }

    // ~166 m north, well outside the 40 m radius
    fn far_away() -> Coordinate {
        Coordinate::new(10.3172, 123.8854).unwrap()
    }

    #[actix_web::test]
    async fn end_to_end_morning_block() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        let record = recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0))
            .await
            .unwrap();
        assert!(record.is_open());
        assert_eq!(record.hours_earned, 0.0);

        // 3 h later, inside a 5 h window
        let outcome = recorder
            .time_out(1000, BlockType::Morning, Some(nearby()), at(11, 0))
            .await
            .unwrap();
        assert!((outcome.hours_earned - 3.0).abs() < 1e-9);
        assert!((outcome.total_hours - 3.0).abs() < 1e-9);

        let profile = store.profile(1000).unwrap();
        assert!((profile.total_hours_accumulated - 3.0).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn hours_are_capped_to_the_block_window() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(7, 0))
            .await
            .unwrap();
        // 8 h elapsed against a 5 h window
        let outcome = recorder
            .time_out(1000, BlockType::Morning, Some(nearby()), at(15, 0))
            .await
            .unwrap();
        assert!((outcome.hours_earned - 5.0).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn concurrent_time_ins_leave_one_open_record() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        let (a, b) = futures::join!(
            recorder.time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0)),
            recorder.time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0)),
        );
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let duplicate = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
        assert!(matches!(duplicate, AttendanceError::DuplicateTimeIn { .. }));
        assert_eq!(store.record_count(), 1);
    }

    #[actix_web::test]
    async fn time_in_outside_window_is_rejected() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        let err = recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::BlockNotEligible { .. }));
        assert_eq!(store.record_count(), 0);
    }

    #[actix_web::test]
    async fn out_of_radius_time_in_mutates_nothing() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        let err = recorder
            .time_in(1000, BlockType::Morning, Some(far_away()), None, at(8, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::LocationOutOfRadius { .. }));
        assert_eq!(store.record_count(), 0);
    }

    #[actix_web::test]
    async fn time_out_without_time_in_fails() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        let err = recorder
            .time_out(1000, BlockType::Morning, Some(nearby()), at(11, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NoOpenRecord { .. }));
    }

    #[actix_web::test]
    async fn double_time_out_reports_already_closed() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0))
            .await
            .unwrap();
        recorder
            .time_out(1000, BlockType::Morning, Some(nearby()), at(11, 0))
            .await
            .unwrap();
        let err = recorder
            .time_out(1000, BlockType::Morning, Some(nearby()), at(11, 30))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyClosed));
    }

    #[actix_web::test]
    async fn compliance_gate_blocks_every_action() {
        let store = store_with_student(1000);
        store.set_approved_documents(1000, 5);
        let recorder = recorder(&store);

        let time_in = recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0))
            .await;
        let time_out = recorder
            .time_out(1000, BlockType::Morning, Some(nearby()), at(11, 0))
            .await;
        let location = recorder.check_location(1000, nearby()).await;

        for err in [
            time_in.err().unwrap(),
            time_out.err().unwrap(),
            location.err().unwrap(),
        ] {
            assert!(matches!(err, AttendanceError::ComplianceRequired { .. }));
        }
        assert_eq!(store.record_count(), 0);
    }

    #[actix_web::test]
    async fn check_location_reports_distance_and_workplace() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        let check = recorder.check_location(1000, nearby()).await.unwrap();
        assert!(check.valid);
        assert!((check.distance_m - 25.0).abs() < 1.0);
        assert_eq!(check.workplace_name.as_deref(), Some("Acme Software Services"));

        let check = recorder.check_location(1000, far_away()).await.unwrap();
        assert!(!check.valid);
    }

    #[actix_web::test]
    async fn day_overview_tracks_block_lifecycle() {
        let store = store_with_student(1000);
        let recorder = recorder(&store);

        recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0))
            .await
            .unwrap();

        let overview = recorder.day_overview(1000, at(8, 30)).await.unwrap();
        assert_eq!(overview.len(), 3);
        assert_eq!(overview[0].state.status, BlockStatus::TimeIn);
        assert!(overview[0].state.can_time_out);
        assert_eq!(overview[1].state.status, BlockStatus::NotStarted);
        assert_eq!(overview[2].state.status, BlockStatus::NotStarted);
    }

    #[actix_web::test]
    async fn missing_workplace_is_reported() {
        let store = store_with_student(1000);
        let mut profile = store.profile(1000).unwrap();
        profile.workplace_lat = None;
        profile.workplace_lon = None;
        store.put_profile(profile);
        let recorder = recorder(&store);

        let err = recorder
            .time_in(1000, BlockType::Morning, Some(nearby()), None, at(8, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::WorkplaceNotRegistered));
    }
}
