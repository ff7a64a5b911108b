//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;
pub(crate) mod rows;

use std::{fmt, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

pub use repositories::courses::PostgresCoursesRepository;
pub use repositories::faculties::PostgresFacultiesRepository;
pub use repositories::majors::PostgresMajorsRepository;
pub use repositories::users::PostgresUsersRepository;
pub use repositories::videos::PostgresVideosRepository;

use crate::{
    audit::AuditInterceptor,
    error::{LecternError, Result},
};

/// Pool settings for [`PostgresDatabase::connect`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
    audit: AuditInterceptor,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("utc_offset", &self.audit.offset())
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(
        url: &str,
        settings: &PoolSettings,
        audit: AuditInterceptor,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .test_before_acquire(true)
            .connect(url)
            .await?;

        info!(
            max_connections = settings.max_connections,
            "database pool initialized"
        );

        Ok(Self {
            pool,
            max_connections: settings.max_connections,
            audit,
        })
    }

    /// Wrap an existing pool, e.g. the one handed to `#[sqlx::test]`.
    pub fn from_pool(pool: PgPool, audit: AuditInterceptor) -> Self {
        let max_connections = pool.options().get_max_connections();
        Self {
            pool,
            max_connections,
            audit,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn audit(&self) -> &AuditInterceptor {
        &self.audit
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|err| {
            LecternError::Internal(format!("migration failed: {err}"))
        })?;
        info!("database schema is up to date");
        Ok(())
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
            max_size: self.max_connections,
        }
    }

    pub fn users(&self) -> PostgresUsersRepository {
        PostgresUsersRepository::new(self.pool.clone(), self.audit.clone())
    }

    pub fn courses(&self) -> PostgresCoursesRepository {
        PostgresCoursesRepository::new(self.pool.clone(), self.audit.clone())
    }

    pub fn videos(&self) -> PostgresVideosRepository {
        PostgresVideosRepository::new(self.pool.clone(), self.audit.clone())
    }

    pub fn faculties(&self) -> PostgresFacultiesRepository {
        PostgresFacultiesRepository::new(self.pool.clone(), self.audit.clone())
    }

    pub fn majors(&self) -> PostgresMajorsRepository {
        PostgresMajorsRepository::new(self.pool.clone(), self.audit.clone())
    }
}
