//! Core data model definitions shared across Lectern crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod audit;
pub mod course;
pub mod error;
pub mod faculty;
pub mod ids;
pub mod major;
pub mod page;
mod patch;
pub mod role;
pub mod user;
pub mod video;

// Intentionally curated re-exports for downstream consumers.
pub use audit::{
    AuditFields, DEFAULT_REPORTING_OFFSET_SECS, Draft, reporting_offset,
};
pub use course::{Course, CourseDetail, CourseFilter, CoursePatch, NewCourse};
pub use error::{ModelError, Result as ModelResult};
pub use faculty::{Faculty, FacultyPatch, NewFaculty};
pub use ids::{CourseID, FacultyID, MajorID, UserID, VideoID};
pub use major::{Major, MajorFilter, MajorPatch, NewMajor};
pub use page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, PageRequest};
pub use role::Role;
pub use user::{NewUser, User, UserPatch};
pub use video::{NewVideo, Video, VideoPatch};
