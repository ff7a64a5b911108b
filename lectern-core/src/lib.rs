//! # Lectern Core
//!
//! Persistence and business rules for the Lectern e-learning backend.
//!
//! - [`audit`]: the write-path interceptor that stamps ids, actors and
//!   timestamps, and turns deletes into soft deletes.
//! - [`ordering`]: dense per-course ordering of videos and the reorder
//!   arithmetic.
//! - [`database`]: repository ports with in-memory and PostgreSQL adapters.
//! - [`domain`]: services for auth, users, courses, videos, faculties and
//!   majors.
//!
//! ## Feature Flags
//!
//! - `database` (default): PostgreSQL adapters and embedded migrations.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod audit;
pub mod auth;
pub mod context;
pub mod database;
pub mod domain;
pub mod error;
pub mod ordering;

pub use lectern_model as model;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use audit::AuditInterceptor;
pub use context::{Actor, RequestContext};
pub use error::{LecternError, Result};
