use async_trait::async_trait;
use lectern_model::{
    Faculty, FacultyID, FacultyPatch, NewFaculty, Page, PageRequest,
};

use super::{MemoryState, MemoryStore, newest_first, paginate};
use crate::{
    context::RequestContext,
    database::ports::FacultiesRepository,
    error::{LecternError, Result},
};

#[derive(Debug, Clone)]
pub struct InMemoryFacultiesRepository {
    store: MemoryStore,
}

impl InMemoryFacultiesRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn ensure_code_free(
    state: &MemoryState,
    code: &str,
    except: Option<FacultyID>,
) -> Result<()> {
    let taken = state.faculties.values().any(|faculty| {
        faculty.audit.is_live()
            && faculty.code == code
            && Some(faculty.id) != except
    });
    if taken {
        return Err(LecternError::Conflict(format!(
            "faculty code {code} already exists"
        )));
    }
    Ok(())
}

#[async_trait]
impl FacultiesRepository for InMemoryFacultiesRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewFaculty,
    ) -> Result<Faculty> {
        let audit = self.store.audit();
        audit
            .timed("faculties.create", async {
                let stamp = audit.on_create(ctx, draft)?;
                let mut state = self.store.lock().await;
                ensure_code_free(&state, &draft.code, None)?;
                let faculty = Faculty {
                    id: FacultyID(stamp.id),
                    name: draft.name.clone(),
                    code: draft.code.clone(),
                    audit: stamp.audit,
                };
                state.faculties.insert(faculty.id, faculty.clone());
                Ok(faculty)
            })
            .await
    }

    async fn get(&self, id: FacultyID) -> Result<Option<Faculty>> {
        Ok(self
            .get_including_deleted(id)
            .await?
            .filter(|faculty| faculty.audit.is_live()))
    }

    async fn get_including_deleted(
        &self,
        id: FacultyID,
    ) -> Result<Option<Faculty>> {
        let state = self.store.lock().await;
        Ok(state.faculties.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Faculty>> {
        let state = self.store.lock().await;
        Ok(state
            .faculties
            .values()
            .find(|faculty| faculty.audit.is_live() && faculty.code == code)
            .cloned())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Faculty>> {
        let state = self.store.lock().await;
        let mut rows: Vec<Faculty> = state
            .faculties
            .values()
            .filter(|faculty| {
                faculty.audit.is_live() && faculty.matches_search(search)
            })
            .cloned()
            .collect();
        newest_first(&mut rows, |faculty| {
            (faculty.audit.created_at, faculty.id.0)
        });
        Ok(paginate(&rows, page))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
        patch: &FacultyPatch,
    ) -> Result<Faculty> {
        let audit = self.store.audit();
        audit
            .timed("faculties.update", async {
                let mut state = self.store.lock().await;
                if let Some(code) = &patch.code {
                    ensure_code_free(&state, code, Some(id))?;
                }
                let faculty = state
                    .faculties
                    .get_mut(&id)
                    .filter(|faculty| faculty.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("faculty", id))?;
                patch.apply(faculty);
                if let Some(stamp) = audit.on_update(ctx) {
                    stamp.apply(&mut faculty.audit);
                }
                Ok(faculty.clone())
            })
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: FacultyID,
    ) -> Result<()> {
        let audit = self.store.audit();
        audit
            .timed("faculties.soft_delete", async {
                let mut state = self.store.lock().await;
                let faculty = state
                    .faculties
                    .get_mut(&id)
                    .filter(|faculty| faculty.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("faculty", id))?;
                audit.on_delete(ctx).apply(&mut faculty.audit);
                Ok(())
            })
            .await
    }
}
