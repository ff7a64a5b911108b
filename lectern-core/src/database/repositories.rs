use std::{fmt, sync::Arc};

use super::{
    infrastructure::memory::MemoryStore,
    ports::{
        CoursesRepository, FacultiesRepository, MajorsRepository,
        UsersRepository, VideosRepository,
    },
};
use crate::audit::AuditInterceptor;

/// One handle per port, shared by the domain services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UsersRepository>,
    pub courses: Arc<dyn CoursesRepository>,
    pub videos: Arc<dyn VideosRepository>,
    pub faculties: Arc<dyn FacultiesRepository>,
    pub majors: Arc<dyn MajorsRepository>,
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

impl Repositories {
    /// Repositories over a fresh in-memory store.
    pub fn in_memory(audit: AuditInterceptor) -> Self {
        Self::from_memory(&MemoryStore::new(audit))
    }

    pub fn from_memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.users()),
            courses: Arc::new(store.courses()),
            videos: Arc::new(store.videos()),
            faculties: Arc::new(store.faculties()),
            majors: Arc::new(store.majors()),
        }
    }

    #[cfg(feature = "database")]
    pub fn postgres(
        db: &super::infrastructure::postgres::PostgresDatabase,
    ) -> Self {
        Self {
            users: Arc::new(db.users()),
            courses: Arc::new(db.courses()),
            videos: Arc::new(db.videos()),
            faculties: Arc::new(db.faculties()),
            majors: Arc::new(db.majors()),
        }
    }
}
