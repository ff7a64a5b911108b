use std::sync::Arc;

use lectern_model::{
    CourseID, NewVideo, Page, PageRequest, Video, VideoID, VideoPatch,
};
use tracing::info;

use super::courses::CourseService;
use crate::{
    context::RequestContext,
    database::ports::{CoursesRepository, VideosRepository},
    error::{LecternError, Result},
};

/// Lessons within a course. Mutations are reserved to the course author.
#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideosRepository>,
    courses: CourseService,
}

impl std::fmt::Debug for VideoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoService").finish_non_exhaustive()
    }
}

impl VideoService {
    pub fn new(
        courses: Arc<dyn CoursesRepository>,
        videos: Arc<dyn VideosRepository>,
    ) -> Self {
        Self {
            courses: CourseService::new(courses, videos.clone()),
            videos,
        }
    }

    /// Append a video to the end of the course.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        course_id: CourseID,
        draft: &NewVideo,
    ) -> Result<Video> {
        self.courses.require_owned(ctx, course_id).await?;
        draft.validate()?;
        let video = self.videos.create(ctx, course_id, draft).await?;
        info!(
            video_id = %video.id,
            course_id = %course_id,
            order = video.order,
            "added video"
        );
        Ok(video)
    }

    /// A live video of a live course.
    pub async fn get(&self, id: VideoID) -> Result<Video> {
        let video = self
            .videos
            .get(id)
            .await?
            .ok_or_else(|| LecternError::not_found("video", id))?;
        self.courses.require_live(video.course_id).await?;
        Ok(video)
    }

    /// Soft-deleted videos too, for audit views.
    pub async fn get_including_deleted(&self, id: VideoID) -> Result<Video> {
        self.videos
            .get_including_deleted(id)
            .await?
            .ok_or_else(|| LecternError::not_found("video", id))
    }

    pub async fn list_by_course(
        &self,
        course_id: CourseID,
        page: PageRequest,
    ) -> Result<Page<Video>> {
        self.courses.require_live(course_id).await?;
        self.videos.list_by_course(course_id, page).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        patch: &VideoPatch,
    ) -> Result<Video> {
        self.require_editable(ctx, id).await?;
        patch.validate()?;
        self.videos.update(ctx, id, patch).await
    }

    /// Move a video to `new_order` within its course.
    pub async fn reorder(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        new_order: i64,
    ) -> Result<Video> {
        self.require_editable(ctx, id).await?;
        self.videos.reorder(ctx, id, new_order).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: VideoID) -> Result<()> {
        self.require_editable(ctx, id).await?;
        self.videos.soft_delete(ctx, id).await
    }

    async fn require_editable(
        &self,
        ctx: &RequestContext,
        id: VideoID,
    ) -> Result<Video> {
        ctx.require_actor()?;
        let video = self.get(id).await?;
        self.courses.require_owned(ctx, video.course_id).await?;
        Ok(video)
    }
}
