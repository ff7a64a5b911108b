use std::sync::Arc;

use lectern_model::{
    FacultyID, Major, MajorFilter, MajorID, MajorPatch, NewMajor, Page,
    PageRequest,
};

use crate::{
    context::RequestContext,
    database::ports::{FacultiesRepository, MajorsRepository},
    error::{LecternError, Result},
};

/// Majors belong to a live faculty. Reads are open; mutations need an admin.
#[derive(Clone)]
pub struct MajorService {
    majors: Arc<dyn MajorsRepository>,
    faculties: Arc<dyn FacultiesRepository>,
}

impl std::fmt::Debug for MajorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MajorService").finish_non_exhaustive()
    }
}

impl MajorService {
    pub fn new(
        majors: Arc<dyn MajorsRepository>,
        faculties: Arc<dyn FacultiesRepository>,
    ) -> Self {
        Self { majors, faculties }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewMajor,
    ) -> Result<Major> {
        ctx.require_admin()?;
        draft.validate()?;
        self.require_faculty(draft.faculty_id).await?;
        self.ensure_code_free(&draft.code, None).await?;
        self.majors.create(ctx, draft).await
    }

    pub async fn get(&self, id: MajorID) -> Result<Major> {
        self.majors
            .get(id)
            .await?
            .ok_or_else(|| LecternError::not_found("major", id))
    }

    pub async fn list(
        &self,
        filter: &MajorFilter,
        page: PageRequest,
    ) -> Result<Page<Major>> {
        self.majors.list(filter, page).await
    }

    pub async fn list_by_faculty(
        &self,
        faculty_id: FacultyID,
        page: PageRequest,
    ) -> Result<Page<Major>> {
        self.require_faculty(faculty_id).await?;
        let filter = MajorFilter {
            search: None,
            faculty_id: Some(faculty_id),
        };
        self.majors.list(&filter, page).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: MajorID,
        patch: &MajorPatch,
    ) -> Result<Major> {
        ctx.require_admin()?;
        patch.validate()?;
        self.get(id).await?;
        if let Some(faculty_id) = patch.faculty_id {
            self.require_faculty(faculty_id).await?;
        }
        if let Some(code) = &patch.code {
            self.ensure_code_free(code, Some(id)).await?;
        }
        self.majors.update(ctx, id, patch).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: MajorID) -> Result<()> {
        ctx.require_admin()?;
        self.majors.soft_delete(ctx, id).await
    }

    async fn require_faculty(&self, id: FacultyID) -> Result<()> {
        self.faculties
            .get(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| LecternError::not_found("faculty", id))
    }

    async fn ensure_code_free(
        &self,
        code: &str,
        except: Option<MajorID>,
    ) -> Result<()> {
        match self.majors.find_by_code(code).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(LecternError::Conflict(format!(
                    "major code {code} already exists"
                )))
            }
            _ => Ok(()),
        }
    }
}
