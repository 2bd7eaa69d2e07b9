use derive_more::Display;

use crate::model::attendance::BlockType;
use crate::repo::RepoError;

/// Every expected failure of the attendance engine. All of these are
/// recoverable: they surface as structured results and never leave partial
/// state behind. Only `System` indicates infrastructure trouble.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(
        fmt = "You need {} approved required documents to use attendance features ({} of {} approved)",
        required,
        approved,
        required
    )]
    ComplianceRequired { approved: u32, required: u32 },

    #[display(fmt = "Coordinate ({}, {}) is outside the valid latitude/longitude range", lat, lon)]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[display(
        fmt = "You are {:.1} m from your registered workplace; attendance is allowed within {:.1} m",
        distance_m,
        radius_m
    )]
    LocationOutOfRadius { distance_m: f64, radius_m: f64 },

    #[display(fmt = "No workplace location is registered on your profile yet")]
    WorkplaceNotRegistered,

    #[display(fmt = "The {} block is not open for this action right now", block)]
    BlockNotEligible { block: BlockType },

    #[display(fmt = "You already timed in for the {} block today", block)]
    DuplicateTimeIn { block: BlockType },

    #[display(fmt = "No open time-in found for the {} block today", block)]
    NoOpenRecord { block: BlockType },

    #[display(fmt = "This record has already been closed")]
    AlreadyClosed,

    #[display(fmt = "A forgot-timeout request already exists for this record")]
    RequestAlreadyExists,

    #[display(fmt = "The attendance record does not match this request")]
    RecordMismatch,

    #[display(fmt = "Internal Server Error")]
    System(RepoError),
}

impl AttendanceError {
    /// Stable machine-readable reason code carried in every failure body.
    pub fn reason(&self) -> &'static str {
        match self {
            AttendanceError::ComplianceRequired { .. } => "document_compliance",
            AttendanceError::InvalidCoordinate { .. } => "invalid_coordinate",
            AttendanceError::LocationOutOfRadius { .. } => "location_out_of_radius",
            AttendanceError::WorkplaceNotRegistered => "workplace_not_registered",
            AttendanceError::BlockNotEligible { .. } => "block_not_eligible",
            AttendanceError::DuplicateTimeIn { .. } => "duplicate_time_in",
            AttendanceError::NoOpenRecord { .. } => "no_open_record",
            AttendanceError::AlreadyClosed => "already_closed",
            AttendanceError::RequestAlreadyExists => "request_already_exists",
            AttendanceError::RecordMismatch => "record_mismatch",
            AttendanceError::System(_) => "system_error",
        }
    }
}

impl From<RepoError> for AttendanceError {
    fn from(e: RepoError) -> Self {
        AttendanceError::System(e)
    }
}
