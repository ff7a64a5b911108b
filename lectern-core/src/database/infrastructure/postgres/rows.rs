//! Row shapes as stored, and their conversion into model records.
//!
//! Timestamps are decoded as UTC and re-expressed in the reporting offset.

use chrono::{DateTime, FixedOffset, Utc};
use lectern_model::{
    AuditFields, Course, CourseID, Faculty, FacultyID, Major, MajorID, User,
    UserID, Video, VideoID,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Result;

macro_rules! audit_columns {
    () => {
        "created_at, created_by, updated_at, updated_by, is_deleted, \
         deleted_by, deleted_at"
    };
}

macro_rules! user_columns {
    () => {
        concat!(
            "id, username, email, role, full_name, ",
            $crate::database::infrastructure::postgres::rows::audit_columns!()
        )
    };
}

macro_rules! course_columns {
    () => {
        concat!(
            "id, title, description, status, ",
            $crate::database::infrastructure::postgres::rows::audit_columns!()
        )
    };
}

macro_rules! video_columns {
    () => {
        concat!(
            "id, course_id, title, url, size, status, sort_order, ",
            $crate::database::infrastructure::postgres::rows::audit_columns!()
        )
    };
}

macro_rules! faculty_columns {
    () => {
        concat!(
            "id, name, code, ",
            $crate::database::infrastructure::postgres::rows::audit_columns!()
        )
    };
}

macro_rules! major_columns {
    () => {
        concat!(
            "id, name, code, description, faculty_id, ",
            $crate::database::infrastructure::postgres::rows::audit_columns!()
        )
    };
}

pub(crate) use {
    audit_columns, course_columns, faculty_columns, major_columns,
    user_columns, video_columns,
};

#[derive(Debug, FromRow)]
pub(crate) struct AuditRow {
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    is_deleted: bool,
    deleted_by: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
}

impl AuditRow {
    fn into_audit(self, offset: FixedOffset) -> AuditFields {
        AuditFields {
            created_at: self.created_at.with_timezone(&offset),
            created_by: self.created_by.map(UserID),
            updated_at: self.updated_at.map(|at| at.with_timezone(&offset)),
            updated_by: self.updated_by.map(UserID),
            is_deleted: self.is_deleted,
            deleted_by: self.deleted_by.map(UserID),
            deleted_at: self.deleted_at.map(|at| at.with_timezone(&offset)),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    full_name: Option<String>,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl UserRow {
    pub(crate) fn into_model(self, offset: FixedOffset) -> Result<User> {
        Ok(User {
            id: UserID(self.id),
            username: self.username,
            email: self.email,
            role: self.role.parse()?,
            full_name: self.full_name,
            audit: self.audit.into_audit(offset),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CourseRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: i32,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl CourseRow {
    pub(crate) fn into_model(self, offset: FixedOffset) -> Course {
        Course {
            id: CourseID(self.id),
            title: self.title,
            description: self.description,
            status: self.status,
            audit: self.audit.into_audit(offset),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct VideoRow {
    id: Uuid,
    course_id: Uuid,
    title: String,
    url: Option<String>,
    size: Option<i64>,
    status: Option<String>,
    sort_order: i32,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl VideoRow {
    pub(crate) fn into_model(self, offset: FixedOffset) -> Video {
        Video {
            id: VideoID(self.id),
            course_id: CourseID(self.course_id),
            title: self.title,
            url: self.url,
            size: self.size,
            status: self.status,
            order: self.sort_order,
            audit: self.audit.into_audit(offset),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct FacultyRow {
    id: Uuid,
    name: String,
    code: String,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl FacultyRow {
    pub(crate) fn into_model(self, offset: FixedOffset) -> Faculty {
        Faculty {
            id: FacultyID(self.id),
            name: self.name,
            code: self.code,
            audit: self.audit.into_audit(offset),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MajorRow {
    id: Uuid,
    name: String,
    code: String,
    description: Option<String>,
    faculty_id: Uuid,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl MajorRow {
    pub(crate) fn into_model(self, offset: FixedOffset) -> Major {
        Major {
            id: MajorID(self.id),
            name: self.name,
            code: self.code,
            description: self.description,
            faculty_id: FacultyID(self.faculty_id),
            audit: self.audit.into_audit(offset),
        }
    }
}
