use std::sync::Arc;

use lectern_model::{
    Faculty, FacultyID, FacultyPatch, NewFaculty, Page, PageRequest,
};

use crate::{
    context::RequestContext,
    database::ports::{FacultiesRepository, MajorsRepository},
    error::{LecternError, Result},
};

/// Faculty catalogue. Reads are open; every mutation needs an admin.
#[derive(Clone)]
pub struct FacultyService {
    faculties: Arc<dyn FacultiesRepository>,
    majors: Arc<dyn MajorsRepository>,
}

impl std::fmt::Debug for FacultyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacultyService").finish_non_exhaustive()
    }
}

impl FacultyService {
    pub fn new(
        faculties: Arc<dyn FacultiesRepository>,
        majors: Arc<dyn MajorsRepository>,
    ) -> Self {
        Self { faculties, majors }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewFaculty,
    ) -> Result<Faculty> {
        ctx.require_admin()?;
        draft.validate()?;
        self.ensure_code_free(&draft.code, None).await?;
        self.faculties.create(ctx, draft).await
    }

    pub async fn get(&self, id: FacultyID) -> Result<Faculty> {
        self.faculties
            .get(id)
            .await?
            .ok_or_else(|| LecternError::not_found("faculty", id))
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Faculty>> {
        self.faculties.list(search, page).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
        patch: &FacultyPatch,
    ) -> Result<Faculty> {
        ctx.require_admin()?;
        patch.validate()?;
        self.get(id).await?;
        if let Some(code) = &patch.code {
            self.ensure_code_free(code, Some(id)).await?;
        }
        self.faculties.update(ctx, id, patch).await
    }

    /// Refused while live majors still reference the faculty.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
    ) -> Result<()> {
        ctx.require_admin()?;
        self.get(id).await?;
        let majors = self.majors.count_by_faculty(id).await?;
        if majors > 0 {
            return Err(LecternError::Conflict(format!(
                "faculty {id} still has {majors} major(s)"
            )));
        }
        self.faculties.soft_delete(ctx, id).await
    }

    async fn ensure_code_free(
        &self,
        code: &str,
        except: Option<FacultyID>,
    ) -> Result<()> {
        match self.faculties.find_by_code(code).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(LecternError::Conflict(format!(
                    "faculty code {code} already exists"
                )))
            }
            _ => Ok(()),
        }
    }
}
