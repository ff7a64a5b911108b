//! Videos are the only ordered aggregate. Every write that changes which
//! videos are live in a course, or where they sit, takes the parent course
//! row lock first and then the live sibling rows, all inside one
//! transaction. A dropped future drops the transaction, which rolls back.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use lectern_model::{
    CourseID, NewVideo, Page, PageRequest, Video, VideoID, VideoPatch,
};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{
    limit_offset, nullable_binds, total_from, update_binds, uuid_of,
};
use crate::{
    audit::AuditInterceptor,
    context::RequestContext,
    database::{
        infrastructure::postgres::rows::{VideoRow, video_columns},
        ports::VideosRepository,
    },
    error::{LecternError, Result},
    ordering::{
        ReorderPlan, SiblingShift, compaction_after_removal, next_order,
        validate_new_order,
    },
};

/// PostgreSQL-backed implementation of the `VideosRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresVideosRepository {
    pool: PgPool,
    audit: AuditInterceptor,
}

/// Lock the course row. Returns whether the course is live, or `None` when
/// it does not exist.
async fn lock_course(
    conn: &mut PgConnection,
    course_id: Uuid,
) -> Result<Option<bool>> {
    let is_deleted: Option<bool> = sqlx::query_scalar(
        "SELECT is_deleted FROM courses WHERE id = $1 FOR UPDATE",
    )
    .bind(course_id)
    .fetch_optional(conn)
    .await?;
    Ok(is_deleted.map(|deleted| !deleted))
}

/// Lock the course row, failing with `NotFound` unless the course is live.
async fn lock_live_course(
    conn: &mut PgConnection,
    course_id: Uuid,
) -> Result<()> {
    match lock_course(conn, course_id).await? {
        Some(true) => Ok(()),
        _ => Err(LecternError::not_found("course", course_id)),
    }
}

/// Lock the live videos of a course and return `(id, order)` pairs.
async fn lock_live_scope(
    conn: &mut PgConnection,
    course_id: Uuid,
) -> Result<Vec<(Uuid, i32)>> {
    let scope = sqlx::query_as(
        "SELECT id, sort_order FROM videos \
         WHERE course_id = $1 AND NOT is_deleted \
         ORDER BY sort_order FOR UPDATE",
    )
    .bind(course_id)
    .fetch_all(conn)
    .await?;
    Ok(scope)
}

async fn course_of(
    conn: &mut PgConnection,
    id: VideoID,
) -> Result<Uuid> {
    let course: Option<Uuid> = sqlx::query_scalar(
        "SELECT course_id FROM videos WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id.to_uuid())
    .fetch_optional(conn)
    .await?;
    course.ok_or_else(|| LecternError::not_found("video", id))
}

/// Apply `shift` to the live siblings of `course_id`, skipping `except`.
async fn shift_siblings(
    conn: &mut PgConnection,
    course_id: Uuid,
    except: Uuid,
    shift: SiblingShift,
    stamp: (Option<DateTime<FixedOffset>>, Option<Uuid>),
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE videos SET sort_order = sort_order + $3, \
         updated_at = COALESCE($6, updated_at), \
         updated_by = COALESCE($7, updated_by) \
         WHERE course_id = $1 AND id <> $2 AND NOT is_deleted \
         AND sort_order BETWEEN $4 AND $5",
    )
    .bind(course_id)
    .bind(except)
    .bind(shift.delta)
    .bind(shift.lower)
    .bind(shift.upper)
    .bind(stamp.0)
    .bind(stamp.1)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

impl PostgresVideosRepository {
    pub fn new(pool: PgPool, audit: AuditInterceptor) -> Self {
        Self { pool, audit }
    }

    async fn fetch(
        &self,
        id: VideoID,
        include_deleted: bool,
    ) -> Result<Option<Video>> {
        let row: Option<VideoRow> = sqlx::query_as(concat!(
            "SELECT ",
            video_columns!(),
            " FROM videos WHERE id = $1 AND ($2 OR NOT is_deleted)"
        ))
        .bind(id.to_uuid())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_model(self.audit.offset())))
    }
}

#[async_trait]
impl VideosRepository for PostgresVideosRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        course_id: CourseID,
        draft: &NewVideo,
    ) -> Result<Video> {
        self.audit
            .timed("videos.create", async {
                let stamp = self.audit.on_create(ctx, draft)?;
                let mut tx = self.pool.begin().await?;

                lock_live_course(&mut tx, course_id.to_uuid()).await?;
                let max: Option<i32> = sqlx::query_scalar(
                    "SELECT MAX(sort_order) FROM videos \
                     WHERE course_id = $1 AND NOT is_deleted",
                )
                .bind(course_id.to_uuid())
                .fetch_one(&mut *tx)
                .await?;

                let row: VideoRow = sqlx::query_as(concat!(
                    "INSERT INTO videos (id, course_id, title, url, size, \
                     status, sort_order, created_at, created_by) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING ",
                    video_columns!()
                ))
                .bind(stamp.id)
                .bind(course_id.to_uuid())
                .bind(&draft.title)
                .bind(&draft.url)
                .bind(draft.size)
                .bind(&draft.status)
                .bind(next_order(max))
                .bind(stamp.audit.created_at)
                .bind(uuid_of(stamp.audit.created_by))
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await?;
                Ok(row.into_model(self.audit.offset()))
            })
            .await
    }

    async fn get(&self, id: VideoID) -> Result<Option<Video>> {
        self.fetch(id, false).await
    }

    async fn get_including_deleted(&self, id: VideoID) -> Result<Option<Video>> {
        self.fetch(id, true).await
    }

    async fn list_by_course(
        &self,
        course_id: CourseID,
        page: PageRequest,
    ) -> Result<Page<Video>> {
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, VideoRow>(concat!(
            "SELECT ",
            video_columns!(),
            " FROM videos WHERE course_id = $1 AND NOT is_deleted \
             ORDER BY sort_order ASC, id ASC LIMIT $2 OFFSET $3"
        ))
        .bind(course_id.to_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM videos \
             WHERE course_id = $1 AND NOT is_deleted",
        )
        .bind(course_id.to_uuid())
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        let tz = self.audit.offset();
        let items = rows.into_iter().map(|row| row.into_model(tz)).collect();
        Ok(Page::new(items, page, total_from(count)))
    }

    async fn list_all_by_course(
        &self,
        course_id: CourseID,
    ) -> Result<Vec<Video>> {
        let rows: Vec<VideoRow> = sqlx::query_as(concat!(
            "SELECT ",
            video_columns!(),
            " FROM videos WHERE course_id = $1 AND NOT is_deleted \
             ORDER BY sort_order ASC, id ASC"
        ))
        .bind(course_id.to_uuid())
        .fetch_all(&self.pool)
        .await?;

        let tz = self.audit.offset();
        Ok(rows.into_iter().map(|row| row.into_model(tz)).collect())
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        patch: &VideoPatch,
    ) -> Result<Video> {
        self.audit
            .timed("videos.update", async {
                let (updated_at, updated_by) =
                    update_binds(self.audit.on_update(ctx));
                let url = nullable_binds(&patch.url);
                let size = nullable_binds(&patch.size);
                let status = nullable_binds(&patch.status);
                let row: Option<VideoRow> = sqlx::query_as(concat!(
                    "UPDATE videos SET \
                     title = COALESCE($2, title), \
                     url = CASE WHEN $3 THEN $4 ELSE url END, \
                     size = CASE WHEN $5 THEN $6 ELSE size END, \
                     status = CASE WHEN $7 THEN $8 ELSE status END, \
                     updated_at = COALESCE($9, updated_at), \
                     updated_by = COALESCE($10, updated_by) \
                     WHERE id = $1 AND NOT is_deleted RETURNING ",
                    video_columns!()
                ))
                .bind(id.to_uuid())
                .bind(&patch.title)
                .bind(url.0)
                .bind(url.1)
                .bind(size.0)
                .bind(size.1)
                .bind(status.0)
                .bind(status.1)
                .bind(updated_at)
                .bind(updated_by)
                .fetch_optional(&self.pool)
                .await?;

                row.map(|row| row.into_model(self.audit.offset()))
                    .ok_or_else(|| LecternError::not_found("video", id))
            })
            .await
    }

    async fn reorder(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        new_order: i64,
    ) -> Result<Video> {
        self.audit
            .timed("videos.reorder", async {
                let to = validate_new_order(new_order)?;
                let mut tx = self.pool.begin().await?;

                // A video never changes course, so the unlocked lookup is
                // only used to find which scope to lock.
                let course_id = course_of(&mut tx, id).await?;
                lock_live_course(&mut tx, course_id).await?;
                let scope = lock_live_scope(&mut tx, course_id).await?;

                let from = scope
                    .iter()
                    .find(|(sibling, _)| *sibling == id.to_uuid())
                    .map(|(_, order)| *order)
                    .ok_or_else(|| LecternError::not_found("video", id))?;
                let plan = ReorderPlan::new(from, to, scope.len())?;

                if let Some(shift) = plan.shift {
                    let stamp = update_binds(self.audit.on_update(ctx));
                    let moved = shift_siblings(
                        &mut tx,
                        course_id,
                        id.to_uuid(),
                        shift,
                        stamp,
                    )
                    .await?;

                    sqlx::query(
                        "UPDATE videos SET sort_order = $2, \
                         updated_at = COALESCE($3, updated_at), \
                         updated_by = COALESCE($4, updated_by) \
                         WHERE id = $1",
                    )
                    .bind(id.to_uuid())
                    .bind(plan.to)
                    .bind(stamp.0)
                    .bind(stamp.1)
                    .execute(&mut *tx)
                    .await?;

                    debug!(
                        video_id = %id,
                        from = plan.from,
                        to = plan.to,
                        siblings_moved = moved,
                        "reordered video"
                    );
                }

                let row: VideoRow = sqlx::query_as(concat!(
                    "SELECT ",
                    video_columns!(),
                    " FROM videos WHERE id = $1"
                ))
                .bind(id.to_uuid())
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await?;
                Ok(row.into_model(self.audit.offset()))
            })
            .await
    }

    async fn soft_delete(&self, ctx: &RequestContext, id: VideoID) -> Result<()> {
        self.audit
            .timed("videos.soft_delete", async {
                let mut tx = self.pool.begin().await?;
                let course_id = course_of(&mut tx, id).await?;
                lock_live_course(&mut tx, course_id).await?;
                lock_live_scope(&mut tx, course_id).await?;

                let stamp = self.audit.on_delete(ctx);
                let removed: Option<i32> = sqlx::query_scalar(
                    "UPDATE videos SET is_deleted = TRUE, deleted_at = $2, \
                     deleted_by = $3 WHERE id = $1 AND NOT is_deleted \
                     RETURNING sort_order",
                )
                .bind(id.to_uuid())
                .bind(stamp.at)
                .bind(uuid_of(stamp.by))
                .fetch_optional(&mut *tx)
                .await?;
                let removed =
                    removed.ok_or_else(|| LecternError::not_found("video", id))?;

                shift_siblings(
                    &mut tx,
                    course_id,
                    id.to_uuid(),
                    compaction_after_removal(removed),
                    update_binds(self.audit.on_update(ctx)),
                )
                .await?;

                tx.commit().await?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use lectern_model::{NewCourse, Role, UserID};

    use super::*;
    use crate::{
        context::Actor,
        database::{
            infrastructure::postgres::PostgresCoursesRepository,
            ports::CoursesRepository,
        },
        ordering::is_dense,
    };

    async fn seeded(
        pool: &PgPool,
        titles: &[&str],
    ) -> (PostgresVideosRepository, RequestContext, CourseID, Vec<VideoID>)
    {
        let audit = AuditInterceptor::default();
        let ctx = RequestContext::for_actor(Actor::new(
            UserID::new(),
            Role::Lecturer,
        ));
        let course = PostgresCoursesRepository::new(pool.clone(), audit.clone())
            .create(&ctx, &NewCourse::new("Course"))
            .await
            .unwrap()
            .id;
        let videos = PostgresVideosRepository::new(pool.clone(), audit);
        let mut ids = Vec::new();
        for title in titles {
            ids.push(
                videos
                    .create(&ctx, course, &NewVideo::new(*title))
                    .await
                    .unwrap()
                    .id,
            );
        }
        (videos, ctx, course, ids)
    }

    async fn titles(repo: &PostgresVideosRepository, course: CourseID) -> String {
        repo.list_all_by_course(course)
            .await
            .unwrap()
            .iter()
            .map(|video| video.title.as_str())
            .collect()
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn reorder_shifts_siblings(pool: PgPool) {
        let (repo, ctx, course, ids) =
            seeded(&pool, &["a", "b", "c", "d"]).await;

        repo.reorder(&ctx, ids[3], 1).await.unwrap();
        assert_eq!(titles(&repo, course).await, "adbc");

        repo.reorder(&ctx, ids[0], 3).await.unwrap();
        assert_eq!(titles(&repo, course).await, "dbca");

        let err = repo.reorder(&ctx, ids[0], 4).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidArgument(_)));
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn soft_delete_compacts(pool: PgPool) {
        let (repo, ctx, course, ids) =
            seeded(&pool, &["a", "b", "c"]).await;
        repo.soft_delete(&ctx, ids[0]).await.unwrap();

        let live = repo.list_all_by_course(course).await.unwrap();
        assert!(is_dense(live.iter().map(|video| video.order)));
        assert_eq!(titles(&repo, course).await, "bc");

        let deleted = repo.get_including_deleted(ids[0]).await.unwrap().unwrap();
        assert!(deleted.audit.is_deleted);
        assert_eq!(deleted.audit.deleted_by, ctx.actor_id());
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn deleted_course_locks_its_videos(pool: PgPool) {
        let (repo, ctx, course, ids) = seeded(&pool, &["a", "b"]).await;
        PostgresCoursesRepository::new(pool.clone(), AuditInterceptor::default())
            .soft_delete(&ctx, course)
            .await
            .unwrap();

        let err = repo.reorder(&ctx, ids[1], 0).await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
        let err = repo.soft_delete(&ctx, ids[0]).await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
        let err = repo
            .create(&ctx, course, &NewVideo::new("c"))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn patch_keeps_or_clears_nullable_columns(pool: PgPool) {
        let (repo, ctx, _, ids) = seeded(&pool, &["a"]).await;
        let hosted = VideoPatch {
            url: Some(Some("https://cdn.example.edu/a.mp4".into())),
            status: Some(Some("READY".into())),
            ..VideoPatch::default()
        };
        repo.update(&ctx, ids[0], &hosted).await.unwrap();

        let retitled = VideoPatch {
            title: Some("a2".into()),
            ..VideoPatch::default()
        };
        let video = repo.update(&ctx, ids[0], &retitled).await.unwrap();
        assert_eq!(video.url.as_deref(), Some("https://cdn.example.edu/a.mp4"));

        let unhosted = VideoPatch {
            url: Some(None),
            ..VideoPatch::default()
        };
        let video = repo.update(&ctx, ids[0], &unhosted).await.unwrap();
        assert_eq!(video.url, None);
        assert_eq!(video.status.as_deref(), Some("READY"));
        assert_eq!(video.title, "a2");
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn concurrent_reorders_stay_dense(pool: PgPool) {
        let (repo, ctx, course, ids) =
            seeded(&pool, &["a", "b", "c", "d", "e", "f"]).await;

        let mut handles = Vec::new();
        for round in 0..24usize {
            let repo = repo.clone();
            let id = ids[round % ids.len()];
            let target = ((round * 5) % ids.len()) as i64;
            handles.push(tokio::spawn(async move {
                repo.reorder(&ctx, id, target).await
            }));
        }
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => {}
                Err(err) => assert!(err.is_retryable(), "{err}"),
            }
        }

        let live = repo.list_all_by_course(course).await.unwrap();
        assert_eq!(live.len(), 6);
        assert!(is_dense(live.iter().map(|video| video.order)));
    }
}
