use chrono::NaiveDate;

use super::error::AttendanceError;
use crate::model::profile::ProgressStatus;
use crate::repo::{AttendanceRepository, ProfileRepository};

/// Pacing thresholds are policy, not code: they arrive from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    pub required_hours: f64,
    pub on_track_ratio: f64,
    pub needs_attention_ratio: f64,
}

impl PacingPolicy {
    /// Compares accumulated hours against the hours expected by now, given
    /// the fraction of the training period that has elapsed. Without a
    /// provisioned period there is nothing to pace against, so the student
    /// stays `on_track` until the profile is completed.
    pub fn status(
        &self,
        total_hours: f64,
        period: Option<(NaiveDate, NaiveDate)>,
        today: NaiveDate,
    ) -> ProgressStatus {
        if total_hours >= self.required_hours {
            return ProgressStatus::OnTrack;
        }
        let Some((start, end)) = period else {
            return ProgressStatus::OnTrack;
        };
        if end <= start || today <= start {
            return ProgressStatus::OnTrack;
        }

        let span_days = (end - start).num_days();
        let elapsed_days = (today - start).num_days().min(span_days);
        let expected = self.required_hours * elapsed_days as f64 / span_days as f64;
        if expected <= 0.0 {
            return ProgressStatus::OnTrack;
        }

        let ratio = total_hours / expected;
        if ratio >= self.on_track_ratio {
            ProgressStatus::OnTrack
        } else if ratio >= self.needs_attention_ratio {
            ProgressStatus::NeedsAttention
        } else {
            ProgressStatus::AtRisk
        }
    }
}

/// Recomputes the cached total from the full set of closed records instead
/// of incrementing it, so concurrent closes cannot drift the sum.
pub struct HoursAccumulator<A, P> {
    attendance: A,
    profiles: P,
    policy: PacingPolicy,
}

impl<A: AttendanceRepository, P: ProfileRepository> HoursAccumulator<A, P> {
    pub fn new(attendance: A, profiles: P, policy: PacingPolicy) -> Self {
        Self { attendance, profiles, policy }
    }

    pub fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    pub async fn refresh(
        &self,
        student_id: u64,
        today: NaiveDate,
    ) -> Result<(f64, ProgressStatus), AttendanceError> {
        let total = self.attendance.sum_closed_hours(student_id).await?;
        let period = self
            .profiles
            .find(student_id)
            .await?
            .and_then(|p| p.training_period());
        let status = self.policy.status(total, period, today);
        self.profiles.update_progress(student_id, total, status).await?;
        Ok((total, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::StudentProfile;
    use crate::repo::memory::MemoryStore;

    fn policy() -> PacingPolicy {
        PacingPolicy { required_hours: 600.0, on_track_ratio: 0.9, needs_attention_ratio: 0.6 }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn profile(user_id: u64) -> StudentProfile {
        StudentProfile {
            user_id,
            workplace_name: Some("Acme Software Services".into()),
            workplace_lat: Some(10.3157),
            workplace_lon: Some(123.8854),
            total_hours_accumulated: 0.0,
            status: ProgressStatus::OnTrack,
            workplace_location_locked: true,
            training_start_date: Some(d(2026, 1, 5)),
            expected_end_date: Some(d(2026, 5, 29)),
        }
    }

    #[test]
    fn halfway_through_with_half_the_hours_is_on_track() {
        // 144-day period, day 72, 300 of 600 hours
        let status = policy().status(300.0, Some((d(2026, 1, 5), d(2026, 5, 29))), d(2026, 3, 18));
        assert_eq!(status, ProgressStatus::OnTrack);
    }

    #[test]
    fn lagging_behind_needs_attention() {
        // Expected ~300 by day 72; 210 gives ratio 0.7
        let status = policy().status(210.0, Some((d(2026, 1, 5), d(2026, 5, 29))), d(2026, 3, 18));
        assert_eq!(status, ProgressStatus::NeedsAttention);
    }

    #[test]
    fn far_behind_is_at_risk() {
        let status = policy().status(100.0, Some((d(2026, 1, 5), d(2026, 5, 29))), d(2026, 3, 18));
        assert_eq!(status, ProgressStatus::AtRisk);
    }

    #[test]
    fn completed_requirement_is_always_on_track() {
        let status = policy().status(600.0, Some((d(2026, 1, 5), d(2026, 5, 29))), d(2026, 5, 28));
        assert_eq!(status, ProgressStatus::OnTrack);
    }

    #[test]
    fn missing_period_cannot_be_paced() {
        assert_eq!(policy().status(0.0, None, d(2026, 3, 18)), ProgressStatus::OnTrack);
    }

    #[actix_web::test]
    async fn refresh_recomputes_from_closed_records() {
        use crate::model::attendance::{BlockType, NewAttendanceRecord};
        use crate::repo::AttendanceRepository;

        let store = MemoryStore::new();
        store.put_profile(profile(1000));

        let repo = store.attendance();
        let day = d(2026, 1, 5);
        for (block, hours) in [(BlockType::Morning, 4.0), (BlockType::Afternoon, 3.5)] {
            let id = repo
                .insert_open(&NewAttendanceRecord {
                    student_id: 1000,
                    date: day,
                    block_type: block,
                    time_in: day.and_hms_opt(8, 0, 0).unwrap(),
                    lat_in: None,
                    lon_in: None,
                    photo_path: None,
                })
                .await
                .unwrap();
            repo.close_if_open(id, day.and_hms_opt(12, 0, 0).unwrap(), hours)
                .await
                .unwrap();
        }
        // An open record must not count toward the total
        repo.insert_open(&NewAttendanceRecord {
            student_id: 1000,
            date: day,
            block_type: BlockType::Overtime,
            time_in: day.and_hms_opt(17, 30, 0).unwrap(),
            lat_in: None,
            lon_in: None,
            photo_path: None,
        })
        .await
        .unwrap();

        let accumulator = HoursAccumulator::new(store.attendance(), store.profiles(), policy());
        let (total, _) = accumulator.refresh(1000, d(2026, 1, 6)).await.unwrap();
        assert!((total - 7.5).abs() < 1e-9);
        assert!((store.profile(1000).unwrap().total_hours_accumulated - 7.5).abs() < 1e-9);

        // Idempotent: a second refresh yields the same total
        let (again, _) = accumulator.refresh(1000, d(2026, 1, 6)).await.unwrap();
        assert!((again - 7.5).abs() < 1e-9);
    }
}
