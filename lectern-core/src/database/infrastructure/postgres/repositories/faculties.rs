use async_trait::async_trait;
use lectern_model::{
    Faculty, FacultyID, FacultyPatch, NewFaculty, Page, PageRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{limit_offset, search_term, total_from, update_binds, uuid_of};
use crate::{
    audit::AuditInterceptor,
    context::RequestContext,
    database::{
        infrastructure::postgres::rows::{FacultyRow, faculty_columns},
        ports::FacultiesRepository,
    },
    error::{LecternError, Result},
};

/// PostgreSQL-backed implementation of the `FacultiesRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresFacultiesRepository {
    pool: PgPool,
    audit: AuditInterceptor,
}

impl PostgresFacultiesRepository {
    pub fn new(pool: PgPool, audit: AuditInterceptor) -> Self {
        Self { pool, audit }
    }

    async fn fetch(
        &self,
        id: FacultyID,
        include_deleted: bool,
    ) -> Result<Option<Faculty>> {
        let row: Option<FacultyRow> = sqlx::query_as(concat!(
            "SELECT ",
            faculty_columns!(),
            " FROM faculties WHERE id = $1 AND ($2 OR NOT is_deleted)"
        ))
        .bind(id.to_uuid())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_model(self.audit.offset())))
    }
}

fn code_taken(code: &str) -> impl FnOnce(LecternError) -> LecternError {
    let message = format!("faculty code {code} already exists");
    move |err| match err {
        LecternError::Conflict(_) => LecternError::Conflict(message),
        other => other,
    }
}

#[async_trait]
impl FacultiesRepository for PostgresFacultiesRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewFaculty,
    ) -> Result<Faculty> {
        self.audit
            .timed("faculties.create", async {
                let stamp = self.audit.on_create(ctx, draft)?;
                let row: FacultyRow = sqlx::query_as(concat!(
                    "INSERT INTO faculties (id, name, code, created_at, \
                     created_by) VALUES ($1, $2, $3, $4, $5) RETURNING ",
                    faculty_columns!()
                ))
                .bind(stamp.id)
                .bind(&draft.name)
                .bind(&draft.code)
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

    async fn get(&self, id: FacultyID) -> Result<Option<Faculty>> {
        self.fetch(id, false).await
    }

    async fn get_including_deleted(
        &self,
        id: FacultyID,
    ) -> Result<Option<Faculty>> {
        self.fetch(id, true).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Faculty>> {
        let row: Option<FacultyRow> = sqlx::query_as(concat!(
            "SELECT ",
            faculty_columns!(),
            " FROM faculties WHERE code = $1 AND NOT is_deleted"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_model(self.audit.offset())))
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Faculty>> {
        let search = search_term(search);
        let (limit, offset) = limit_offset(page);

        let rows = sqlx::query_as::<_, FacultyRow>(concat!(
            "SELECT ",
            faculty_columns!(),
            " FROM faculties WHERE NOT is_deleted \
             AND ($1::text IS NULL \
                  OR strpos(lower(name), lower($1)) > 0 \
                  OR strpos(lower(code), lower($1)) > 0) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM faculties WHERE NOT is_deleted \
             AND ($1::text IS NULL \
                  OR strpos(lower(name), lower($1)) > 0 \
                  OR strpos(lower(code), lower($1)) > 0)",
        )
        .bind(&search)
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        let tz = self.audit.offset();
        let items = rows.into_iter().map(|row| row.into_model(tz)).collect();
        Ok(Page::new(items, page, total_from(count)))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
        patch: &FacultyPatch,
    ) -> Result<Faculty> {
        self.audit
            .timed("faculties.update", async {
                let (updated_at, updated_by) =
                    update_binds(self.audit.on_update(ctx));
                let row: Option<FacultyRow> = sqlx::query_as(concat!(
                    "UPDATE faculties SET \
                     name = COALESCE($2, name), \
                     code = COALESCE($3, code), \
                     updated_at = COALESCE($4, updated_at), \
                     updated_by = COALESCE($5, updated_by) \
                     WHERE id = $1 AND NOT is_deleted RETURNING ",
                    faculty_columns!()
                ))
                .bind(id.to_uuid())
                .bind(&patch.name)
                .bind(&patch.code)
                .bind(updated_at)
                .bind(updated_by)
                .fetch_optional(&self.pool)
                .await
                .map_err(LecternError::from)
                .map_err(code_taken(patch.code.as_deref().unwrap_or("")))?;

                row.map(|row| row.into_model(self.audit.offset()))
                    .ok_or_else(|| LecternError::not_found("faculty", id))
            })
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
    ) -> Result<()> {
        self.audit
            .timed("faculties.soft_delete", async {
                let stamp = self.audit.on_delete(ctx);
                let deleted: Option<Uuid> = sqlx::query_scalar(
                    "UPDATE faculties SET is_deleted = TRUE, deleted_at = $2, \
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
                    .ok_or_else(|| LecternError::not_found("faculty", id))
            })
            .await
    }
}
