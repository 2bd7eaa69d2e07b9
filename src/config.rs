use crate::core::geofence::GeofenceVerifier;
use crate::core::hours::PacingPolicy;
use crate::core::schedule::BlockSchedule;
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Attendance policy
    pub geofence_radius_m: f64,
    pub required_hours: f64,
    pub required_document_count: u32,
    pub on_track_ratio: f64,
    pub needs_attention_ratio: f64,

    // Block windows
    pub morning_start: NaiveTime,
    pub morning_end: NaiveTime,
    pub afternoon_start: NaiveTime,
    pub afternoon_end: NaiveTime,
    pub overtime_start: NaiveTime,
    pub overtime_end: NaiveTime,

    // Rate limiting
    pub rate_attendance_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|e| panic!("{key} is not valid: {e:?}"))
}

fn env_time(key: &str, default: &str) -> NaiveTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .unwrap_or_else(|e| panic!("{key} must be HH:MM: {e}"))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            geofence_radius_m: env_parse("GEOFENCE_RADIUS_M", "40"),
            required_hours: env_parse("REQUIRED_HOURS", "600"),
            required_document_count: env_parse("REQUIRED_DOCUMENT_COUNT", "7"),
            on_track_ratio: env_parse("ON_TRACK_RATIO", "0.9"),
            needs_attention_ratio: env_parse("NEEDS_ATTENTION_RATIO", "0.6"),

            morning_start: env_time("MORNING_START", "07:00"),
            morning_end: env_time("MORNING_END", "12:00"),
            afternoon_start: env_time("AFTERNOON_START", "13:00"),
            afternoon_end: env_time("AFTERNOON_END", "17:00"),
            overtime_start: env_time("OVERTIME_START", "17:30"),
            overtime_end: env_time("OVERTIME_END", "20:30"),

            rate_attendance_per_min: env_parse("RATE_ATTENDANCE_PER_MIN", "60"),
            rate_protected_per_min: env_parse("RATE_PROTECTED_PER_MIN", "1000"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }

    pub fn block_schedule(&self) -> BlockSchedule {
        BlockSchedule::new(
            (self.morning_start, self.morning_end),
            (self.afternoon_start, self.afternoon_end),
            (self.overtime_start, self.overtime_end),
        )
    }

    pub fn geofence(&self) -> GeofenceVerifier {
        GeofenceVerifier::new(self.geofence_radius_m)
    }

    pub fn pacing(&self) -> PacingPolicy {
        PacingPolicy {
            required_hours: self.required_hours,
            on_track_ratio: self.on_track_ratio,
            needs_attention_ratio: self.needs_attention_ratio,
        }
    }
}
