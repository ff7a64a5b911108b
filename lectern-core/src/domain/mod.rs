//! Use-case services over the repository ports.
//!
//! Services own authorization (who may touch what) and cross-aggregate
//! rules; repositories own persistence and audit stamping.

pub mod auth;
pub mod courses;
pub mod faculties;
pub mod majors;
pub mod users;
pub mod videos;

pub use auth::{AuthService, Credentials};
pub use courses::CourseService;
pub use faculties::FacultyService;
pub use majors::MajorService;
pub use users::UserService;
pub use videos::VideoService;

use std::sync::Arc;

use crate::{
    auth::{PasswordCrypto, TokenService},
    database::Repositories,
};

/// Every service wired to one set of repositories.
#[derive(Clone, Debug)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub courses: CourseService,
    pub videos: VideoService,
    pub faculties: FacultyService,
    pub majors: MajorService,
}

impl Services {
    pub fn new(
        repos: &Repositories,
        crypto: Arc<PasswordCrypto>,
        tokens: TokenService,
    ) -> Self {
        Self {
            auth: AuthService::new(repos.users.clone(), crypto, tokens),
            users: UserService::new(repos.users.clone()),
            courses: CourseService::new(
                repos.courses.clone(),
                repos.videos.clone(),
            ),
            videos: VideoService::new(
                repos.courses.clone(),
                repos.videos.clone(),
            ),
            faculties: FacultyService::new(
                repos.faculties.clone(),
                repos.majors.clone(),
            ),
            majors: MajorService::new(
                repos.majors.clone(),
                repos.faculties.clone(),
            ),
        }
    }
}
