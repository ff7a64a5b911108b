use async_trait::async_trait;
use lectern_model::{
    Course, CourseFilter, CourseID, CoursePatch, NewCourse, Page, PageRequest,
};

use crate::{context::RequestContext, error::Result};

#[async_trait]
pub trait CoursesRepository: Send + Sync {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewCourse,
    ) -> Result<Course>;

    async fn get(&self, id: CourseID) -> Result<Option<Course>>;
    async fn get_including_deleted(
        &self,
        id: CourseID,
    ) -> Result<Option<Course>>;

    /// Live courses matching `filter`, newest first.
    async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: CourseID,
        patch: &CoursePatch,
    ) -> Result<Course>;

    /// Flags the course only. Its videos keep their rows and positions.
    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: CourseID,
    ) -> Result<()>;
}
