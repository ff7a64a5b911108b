//! Lifecycle metadata carried by every persisted record.
//!
//! Timestamps are expressed in the reporting timezone (UTC+7 unless
//! configured otherwise) rather than UTC. Records are never physically
//! removed by user-facing operations; deletion flips `is_deleted` and stamps
//! `deleted_at`/`deleted_by`.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use uuid::Uuid;

use crate::ids::UserID;

/// Offset of the reporting timezone, in seconds east of UTC.
pub const DEFAULT_REPORTING_OFFSET_SECS: i32 = 7 * 60 * 60;

/// The default reporting timezone (UTC+7).
pub fn reporting_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_REPORTING_OFFSET_SECS)
        .unwrap_or_else(|| Utc.fix())
}

/// Identity and lifecycle stamps shared by users, courses, videos,
/// faculties and majors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuditFields {
    pub created_at: DateTime<FixedOffset>,
    pub created_by: Option<UserID>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub updated_by: Option<UserID>,
    pub is_deleted: bool,
    pub deleted_by: Option<UserID>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl AuditFields {
    /// Stamps for a freshly created record: nothing but the creation pair
    /// is set.
    pub fn created(at: DateTime<FixedOffset>, by: Option<UserID>) -> Self {
        Self {
            created_at: at,
            created_by: by,
            updated_at: None,
            updated_by: None,
            is_deleted: false,
            deleted_by: None,
            deleted_at: None,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    pub fn is_created_by(&self, user: UserID) -> bool {
        self.created_by == Some(user)
    }
}

/// Caller-supplied payload for a create operation.
///
/// Identifiers are always minted server-side; drafts surface any id the
/// client tried to smuggle in so the audit layer can reject it.
pub trait Draft {
    fn claimed_id(&self) -> Option<Uuid>;
}
