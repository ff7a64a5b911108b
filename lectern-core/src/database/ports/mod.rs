//! Repository ports, one per aggregate.
//!
//! Every mutating method takes the caller's [`RequestContext`] so the
//! adapter can stamp audit fields through its
//! [`AuditInterceptor`](crate::audit::AuditInterceptor). Reads exclude
//! soft-deleted rows unless the method name says otherwise.
//!
//! [`RequestContext`]: crate::context::RequestContext

pub mod courses;
pub mod faculties;
pub mod majors;
pub mod users;
pub mod videos;

pub use courses::CoursesRepository;
pub use faculties::FacultiesRepository;
pub use majors::MajorsRepository;
pub use users::UsersRepository;
pub use videos::VideosRepository;
