use async_trait::async_trait;
use lectern_model::{
    FacultyID, Major, MajorFilter, MajorID, MajorPatch, NewMajor, Page,
    PageRequest,
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
        infrastructure::postgres::rows::{MajorRow, major_columns},
        ports::MajorsRepository,
    },
    error::{LecternError, Result},
};

/// PostgreSQL-backed implementation of the `MajorsRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresMajorsRepository {
    pool: PgPool,
    audit: AuditInterceptor,
}

impl PostgresMajorsRepository {
    pub fn new(pool: PgPool, audit: AuditInterceptor) -> Self {
        Self { pool, audit }
    }

    async fn fetch(
        &self,
        id: MajorID,
        include_deleted: bool,
    ) -> Result<Option<Major>> {
        let row: Option<MajorRow> = sqlx::query_as(concat!(
            "SELECT ",
            major_columns!(),
            " FROM majors WHERE id = $1 AND ($2 OR NOT is_deleted)"
        ))
        .bind(id.to_uuid())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_model(self.audit.offset())))
    }
}

fn code_taken(code: &str) -> impl FnOnce(LecternError) -> LecternError {
    let message = format!("major code {code} already exists");
    move |err| match err {
        LecternError::Conflict(_) => LecternError::Conflict(message),
        other => other,
    }
}

#[async_trait]
impl MajorsRepository for PostgresMajorsRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewMajor,
    ) -> Result<Major> {
        self.audit
            .timed("majors.create", async {
                let stamp = self.audit.on_create(ctx, draft)?;
                let row: MajorRow = sqlx::query_as(concat!(
                    "INSERT INTO majors (id, name, code, description, \
                     faculty_id, created_at, created_by) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING ",
                    major_columns!()
                ))
                .bind(stamp.id)
                .bind(&draft.name)
                .bind(&draft.code)
                .bind(&draft.description)
                .bind(draft.faculty_id.to_uuid())
                .bind(stamp.audit.created_at)
                .bind(uuid_of(stamp.audit.created_by))
                .fetch_one(&self.pool)
                .await
                .map_err(LecternError::from)
                .map_err(code_taken(&draft.code))?;

                Ok(row.into_model(self.audit.offset()))
            })
            .await
    }

    async fn get(&self, id: MajorID) -> Result<Option<Major>> {
        self.fetch(id, false).await
    }

    async fn get_including_deleted(
        &self,
        id: MajorID,
    ) -> Result<Option<Major>> {
        self.fetch(id, true).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Major>> {
        let row: Option<MajorRow> = sqlx::query_as(concat!(
            "SELECT ",
            major_columns!(),
            " FROM majors WHERE code = $1 AND NOT is_deleted"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_model(self.audit.offset())))
    }

    async fn list(
        &self,
        filter: &MajorFilter,
        page: PageRequest,
    ) -> Result<Page<Major>> {
        let search = search_term(filter.search.as_deref());
        let faculty = filter.faculty_id.map(|id| id.to_uuid());
        let (limit, offset) = limit_offset(page);

        let rows = sqlx::query_as::<_, MajorRow>(concat!(
            "SELECT ",
            major_columns!(),
            " FROM majors WHERE NOT is_deleted \
             AND ($1::text IS NULL \
                  OR strpos(lower(name), lower($1)) > 0 \
                  OR strpos(lower(code), lower($1)) > 0) \
             AND ($2::uuid IS NULL OR faculty_id = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(&search)
        .bind(faculty)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM majors WHERE NOT is_deleted \
             AND ($1::text IS NULL \
                  OR strpos(lower(name), lower($1)) > 0 \
                  OR strpos(lower(code), lower($1)) > 0) \
             AND ($2::uuid IS NULL OR faculty_id = $2)",
        )
        .bind(&search)
        .bind(faculty)
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        let tz = self.audit.offset();
        let items = rows.into_iter().map(|row| row.into_model(tz)).collect();
        Ok(Page::new(items, page, total_from(count)))
    }

    async fn count_by_faculty(&self, faculty_id: FacultyID) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM majors \
             WHERE faculty_id = $1 AND NOT is_deleted",
        )
        .bind(faculty_id.to_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(total_from(count))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: MajorID,
        patch: &MajorPatch,
    ) -> Result<Major> {
        self.audit
            .timed("majors.update", async {
                let (updated_at, updated_by) =
                    update_binds(self.audit.on_update(ctx));
                let description = nullable_binds(&patch.description);
                let row: Option<MajorRow> = sqlx::query_as(concat!(
                    "UPDATE majors SET \
                     name = COALESCE($2, name), \
                     code = COALESCE($3, code), \
                     description = CASE WHEN $4 THEN $5 ELSE description END, \
                     faculty_id = COALESCE($6, faculty_id), \
                     updated_at = COALESCE($7, updated_at), \
                     updated_by = COALESCE($8, updated_by) \
                     WHERE id = $1 AND NOT is_deleted RETURNING ",
                    major_columns!()
                ))
                .bind(id.to_uuid())
                .bind(&patch.name)
                .bind(&patch.code)
                .bind(description.0)
                .bind(description.1)
                .bind(patch.faculty_id.map(|id| id.to_uuid()))
                .bind(updated_at)
                .bind(updated_by)
                .fetch_optional(&self.pool)
                .await
                .map_err(LecternError::from)
                .map_err(code_taken(patch.code.as_deref().unwrap_or("")))?;

                row.map(|row| row.into_model(self.audit.offset()))
                    .ok_or_else(|| LecternError::not_found("major", id))
            })
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: MajorID,
    ) -> Result<()> {
        self.audit
            .timed("majors.soft_delete", async {
                let stamp = self.audit.on_delete(ctx);
                let deleted: Option<Uuid> = sqlx::query_scalar(
                    "UPDATE majors SET is_deleted = TRUE, deleted_at = $2, \
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
                    .ok_or_else(|| LecternError::not_found("major", id))
            })
            .await
    }
}
