use async_trait::async_trait;
use lectern_model::{
    FacultyID, Major, MajorFilter, MajorID, MajorPatch, NewMajor, Page,
    PageRequest,
};

use crate::{context::RequestContext, error::Result};

#[async_trait]
pub trait MajorsRepository: Send + Sync {
    /// `Conflict` if a live major already uses the code.
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewMajor,
    ) -> Result<Major>;

    async fn get(&self, id: MajorID) -> Result<Option<Major>>;
    async fn get_including_deleted(&self, id: MajorID)
    -> Result<Option<Major>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Major>>;

    async fn list(
        &self,
        filter: &MajorFilter,
        page: PageRequest,
    ) -> Result<Page<Major>>;

    /// Live majors referencing the faculty.
    async fn count_by_faculty(&self, faculty_id: FacultyID) -> Result<u64>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: MajorID,
        patch: &MajorPatch,
    ) -> Result<Major>;

    async fn soft_delete(&self, ctx: &RequestContext, id: MajorID)
    -> Result<()>;
}
