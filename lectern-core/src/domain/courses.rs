use std::sync::Arc;

use lectern_model::{
    Course, CourseDetail, CourseFilter, CourseID, CoursePatch, NewCourse, Page,
    PageRequest,
};
use tracing::info;

use crate::{
    context::RequestContext,
    database::ports::{CoursesRepository, VideosRepository},
    error::{LecternError, Result},
};

/// Courses are authored by the caller who creates them; only that author
/// may change or delete them.
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CoursesRepository>,
    videos: Arc<dyn VideosRepository>,
}

impl std::fmt::Debug for CourseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseService").finish_non_exhaustive()
    }
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CoursesRepository>,
        videos: Arc<dyn VideosRepository>,
    ) -> Self {
        Self { courses, videos }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewCourse,
    ) -> Result<Course> {
        ctx.require_actor()?;
        draft.validate()?;
        let course = self.courses.create(ctx, draft).await?;
        info!(course_id = %course.id, "created course");
        Ok(course)
    }

    /// A live course with its live videos in order.
    pub async fn get(&self, id: CourseID) -> Result<CourseDetail> {
        let course = self.require_live(id).await?;
        let videos = self.videos.list_all_by_course(id).await?;
        Ok(CourseDetail { course, videos })
    }

    pub async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>> {
        self.courses.list(filter, page).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: CourseID,
        patch: &CoursePatch,
    ) -> Result<Course> {
        self.require_owned(ctx, id).await?;
        patch.validate()?;
        self.courses.update(ctx, id, patch).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: CourseID) -> Result<()> {
        self.require_owned(ctx, id).await?;
        self.courses.soft_delete(ctx, id).await
    }

    pub(crate) async fn require_live(&self, id: CourseID) -> Result<Course> {
        self.courses
            .get(id)
            .await?
            .ok_or_else(|| LecternError::not_found("course", id))
    }

    /// The course, if it is live and the caller authored it.
    pub(crate) async fn require_owned(
        &self,
        ctx: &RequestContext,
        id: CourseID,
    ) -> Result<Course> {
        let actor = ctx.require_actor()?;
        let course = self.require_live(id).await?;
        if !course.audit.is_created_by(actor.id) {
            return Err(LecternError::Forbidden(format!(
                "course {id} belongs to another author"
            )));
        }
        Ok(course)
    }
}
