//! In-memory adapters implementing the database ports.
//!
//! All five repositories share one [`MemoryStore`] so cross-aggregate
//! checks (a video's course exists, a faculty still has majors) see a
//! consistent snapshot. The store is guarded by a single async mutex, which
//! also serialises every reorder.

mod courses;
mod faculties;
mod majors;
mod users;
mod videos;

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, FixedOffset};
use lectern_model::{
    Course, CourseID, Faculty, FacultyID, Major, MajorID, Page, PageRequest,
    User, UserID, Video, VideoID,
};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub use courses::InMemoryCoursesRepository;
pub use faculties::InMemoryFacultiesRepository;
pub use majors::InMemoryMajorsRepository;
pub use users::InMemoryUsersRepository;
pub use videos::InMemoryVideosRepository;

use crate::audit::AuditInterceptor;

#[derive(Debug, Clone)]
pub(crate) struct StoredUser {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub(crate) users: HashMap<UserID, StoredUser>,
    pub(crate) courses: HashMap<CourseID, Course>,
    pub(crate) videos: HashMap<VideoID, Video>,
    pub(crate) faculties: HashMap<FacultyID, Faculty>,
    pub(crate) majors: HashMap<MajorID, Major>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    audit: AuditInterceptor,
}

impl MemoryStore {
    pub fn new(audit: AuditInterceptor) -> Self {
        Self {
            state: Arc::default(),
            audit,
        }
    }

    pub fn audit(&self) -> &AuditInterceptor {
        &self.audit
    }

    pub fn users(&self) -> InMemoryUsersRepository {
        InMemoryUsersRepository::new(self.clone())
    }

    pub fn courses(&self) -> InMemoryCoursesRepository {
        InMemoryCoursesRepository::new(self.clone())
    }

    pub fn videos(&self) -> InMemoryVideosRepository {
        InMemoryVideosRepository::new(self.clone())
    }

    pub fn faculties(&self) -> InMemoryFacultiesRepository {
        InMemoryFacultiesRepository::new(self.clone())
    }

    pub fn majors(&self) -> InMemoryMajorsRepository {
        InMemoryMajorsRepository::new(self.clone())
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().await
    }
}

/// Sort newest first. Rows created in the same instant fall back to their
/// time-ordered ids.
pub(crate) fn newest_first<T>(
    rows: &mut [T],
    key: impl Fn(&T) -> (DateTime<FixedOffset>, Uuid),
) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

pub(crate) fn paginate<T: Clone>(rows: &[T], page: PageRequest) -> Page<T> {
    Page::new(page.slice(rows), page, rows.len() as u64)
}
