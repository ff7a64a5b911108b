use async_trait::async_trait;
use lectern_model::{
    CourseID, NewVideo, Page, PageRequest, Video, VideoID, VideoPatch,
};

use crate::{context::RequestContext, error::Result};

/// Videos are ordered within their course. Every method that changes scope
/// membership or positions (`create`, `reorder`, `soft_delete`) runs
/// serialised against the other two for the same course, and leaves the
/// live orders dense.
#[async_trait]
pub trait VideosRepository: Send + Sync {
    /// Append a video at the end of a live course.
    async fn create(
        &self,
        ctx: &RequestContext,
        course_id: CourseID,
        draft: &NewVideo,
    ) -> Result<Video>;

    async fn get(&self, id: VideoID) -> Result<Option<Video>>;
    async fn get_including_deleted(&self, id: VideoID) -> Result<Option<Video>>;

    /// Live videos of a course by ascending order.
    async fn list_by_course(
        &self,
        course_id: CourseID,
        page: PageRequest,
    ) -> Result<Page<Video>>;

    async fn list_all_by_course(&self, course_id: CourseID)
    -> Result<Vec<Video>>;

    /// Descriptive fields only; `order` is untouched.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        patch: &VideoPatch,
    ) -> Result<Video>;

    /// Move a live video to `new_order`, shifting the siblings in between.
    ///
    /// * `NotFound` if the video is missing or deleted.
    /// * `InvalidArgument` if `new_order` is negative or not below the number
    ///   of live videos in the course.
    /// * `TransactionFailed` if the store aborted; nothing was applied.
    async fn reorder(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        new_order: i64,
    ) -> Result<Video>;

    /// Flag the video deleted and close the gap it leaves in the course.
    async fn soft_delete(&self, ctx: &RequestContext, id: VideoID) -> Result<()>;
}
