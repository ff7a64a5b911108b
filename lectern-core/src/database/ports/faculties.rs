use async_trait::async_trait;
use lectern_model::{
    Faculty, FacultyID, FacultyPatch, NewFaculty, Page, PageRequest,
};

use crate::{context::RequestContext, error::Result};

#[async_trait]
pub trait FacultiesRepository: Send + Sync {
    /// `Conflict` if a live faculty already uses the code.
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewFaculty,
    ) -> Result<Faculty>;

    async fn get(&self, id: FacultyID) -> Result<Option<Faculty>>;
    async fn get_including_deleted(
        &self,
        id: FacultyID,
    ) -> Result<Option<Faculty>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Faculty>>;

    /// Live faculties whose name or code contains `search`
    /// (case-insensitive), newest first.
    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Faculty>>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
        patch: &FacultyPatch,
    ) -> Result<Faculty>;

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
    ) -> Result<()>;
}
