use async_trait::async_trait;
use lectern_model::{
    Course, CourseFilter, CourseID, CoursePatch, NewCourse, Page, PageRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    limit_offset, nullable_binds, search_term, total_from, update_binds,
    uuid_of,
};
use crate::{
    audit::AuditInterceptor,
    context::RequestContext,
    database::{
        infrastructure::postgres::rows::{CourseRow, course_columns},
        ports::CoursesRepository,
    },
    error::{LecternError, Result},
};

/// PostgreSQL-backed implementation of the `CoursesRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresCoursesRepository {
    pool: PgPool,
    audit: AuditInterceptor,
}

impl PostgresCoursesRepository {
    pub fn new(pool: PgPool, audit: AuditInterceptor) -> Self {
        Self { pool, audit }
    }

    async fn fetch(
        &self,
        id: CourseID,
        include_deleted: bool,
    ) -> Result<Option<Course>> {
        let row: Option<CourseRow> = sqlx::query_as(concat!(
            "SELECT ",
            course_columns!(),
            " FROM courses WHERE id = $1 AND ($2 OR NOT is_deleted)"
        ))
        .bind(id.to_uuid())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_model(self.audit.offset())))
    }
}

#[async_trait]
impl CoursesRepository for PostgresCoursesRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewCourse,
    ) -> Result<Course> {
        self.audit
            .timed("courses.create", async {
                let stamp = self.audit.on_create(ctx, draft)?;
                let row: CourseRow = sqlx::query_as(concat!(
                    "INSERT INTO courses (id, title, description, status, \
                     created_at, created_by) \
                     VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
                    course_columns!()
                ))
                .bind(stamp.id)
                .bind(&draft.title)
                .bind(&draft.description)
                .bind(draft.status)
                .bind(stamp.audit.created_at)
                .bind(uuid_of(stamp.audit.created_by))
                .fetch_one(&self.pool)
                .await?;

                Ok(row.into_model(self.audit.offset()))
            })
            .await
    }

    async fn get(&self, id: CourseID) -> Result<Option<Course>> {
        self.fetch(id, false).await
    }

    async fn get_including_deleted(
        &self,
        id: CourseID,
    ) -> Result<Option<Course>> {
        self.fetch(id, true).await
    }

    async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>> {
        let search = search_term(filter.search.as_deref());
        let (limit, offset) = limit_offset(page);

        let rows = sqlx::query_as::<_, CourseRow>(concat!(
            "SELECT ",
            course_columns!(),
            " FROM courses WHERE NOT is_deleted \
             AND ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0) \
             AND ($2::int IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(&search)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses WHERE NOT is_deleted \
             AND ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0) \
             AND ($2::int IS NULL OR status = $2)",
        )
        .bind(&search)
        .bind(filter.status)
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        let tz = self.audit.offset();
        let items = rows.into_iter().map(|row| row.into_model(tz)).collect();
        Ok(Page::new(items, page, total_from(count)))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: CourseID,
        patch: &CoursePatch,
    ) -> Result<Course> {
        self.audit
            .timed("courses.update", async {
                let (updated_at, updated_by) =
                    update_binds(self.audit.on_update(ctx));
                let description = nullable_binds(&patch.description);
                let row: Option<CourseRow> = sqlx::query_as(concat!(
                    "UPDATE courses SET \
                     title = COALESCE($2, title), \
                     description = CASE WHEN $3 THEN $4 ELSE description END, \
                     status = COALESCE($5, status), \
                     updated_at = COALESCE($6, updated_at), \
                     updated_by = COALESCE($7, updated_by) \
                     WHERE id = $1 AND NOT is_deleted RETURNING ",
                    course_columns!()
                ))
                .bind(id.to_uuid())
                .bind(&patch.title)
                .bind(description.0)
                .bind(description.1)
                .bind(patch.status)
                .bind(updated_at)
                .bind(updated_by)
                .fetch_optional(&self.pool)
                .await?;

                row.map(|row| row.into_model(self.audit.offset()))
                    .ok_or_else(|| LecternError::not_found("course", id))
            })
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: CourseID,
    ) -> Result<()> {
        self.audit
            .timed("courses.soft_delete", async {
                let stamp = self.audit.on_delete(ctx);
                let deleted: Option<Uuid> = sqlx::query_scalar(
                    "UPDATE courses SET is_deleted = TRUE, deleted_at = $2, \
                     deleted_by = $3 WHERE id = $1 AND NOT is_deleted \
                     RETURNING id",
                )
                .bind(id.to_uuid())
                .bind(stamp.at)
                .bind(uuid_of(stamp.by))
                .fetch_optional(&self.pool)
                .await?;

                deleted
                    .map(|_| ())
                    .ok_or_else(|| LecternError::not_found("course", id))
            })
            .await
    }
}
