use async_trait::async_trait;
use lectern_model::{
    FacultyID, Major, MajorFilter, MajorID, MajorPatch, NewMajor, Page,
    PageRequest,
};

use super::{MemoryState, MemoryStore, newest_first, paginate};
use crate::{
    context::RequestContext,
    database::ports::MajorsRepository,
    error::{LecternError, Result},
};

#[derive(Debug, Clone)]
pub struct InMemoryMajorsRepository {
    store: MemoryStore,
}

impl InMemoryMajorsRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn ensure_code_free(
    state: &MemoryState,
    code: &str,
    except: Option<MajorID>,
) -> Result<()> {
    let taken = state.majors.values().any(|major| {
        major.audit.is_live() && major.code == code && Some(major.id) != except
    });
    if taken {
        return Err(LecternError::Conflict(format!(
            "major code {code} already exists"
        )));
    }
    Ok(())
}

#[async_trait]
impl MajorsRepository for InMemoryMajorsRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewMajor,
    ) -> Result<Major> {
        let audit = self.store.audit();
        audit
            .timed("majors.create", async {
                let stamp = audit.on_create(ctx, draft)?;
                let mut state = self.store.lock().await;
                ensure_code_free(&state, &draft.code, None)?;
                let major = Major {
                    id: MajorID(stamp.id),
                    name: draft.name.clone(),
                    code: draft.code.clone(),
                    description: draft.description.clone(),
                    faculty_id: draft.faculty_id,
                    audit: stamp.audit,
                };
                state.majors.insert(major.id, major.clone());
                Ok(major)
            })
            .await
    }

    async fn get(&self, id: MajorID) -> Result<Option<Major>> {
        Ok(self
            .get_including_deleted(id)
            .await?
            .filter(|major| major.audit.is_live()))
    }

    async fn get_including_deleted(
        &self,
        id: MajorID,
    ) -> Result<Option<Major>> {
        let state = self.store.lock().await;
        Ok(state.majors.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Major>> {
        let state = self.store.lock().await;
        Ok(state
            .majors
            .values()
            .find(|major| major.audit.is_live() && major.code == code)
            .cloned())
    }

    async fn list(
        &self,
        filter: &MajorFilter,
        page: PageRequest,
    ) -> Result<Page<Major>> {
        let state = self.store.lock().await;
        let mut rows: Vec<Major> = state
            .majors
            .values()
            .filter(|major| major.audit.is_live() && filter.matches(major))
            .cloned()
            .collect();
        newest_first(&mut rows, |major| (major.audit.created_at, major.id.0));
        Ok(paginate(&rows, page))
    }

    async fn count_by_faculty(&self, faculty_id: FacultyID) -> Result<u64> {
        let state = self.store.lock().await;
        Ok(state
            .majors
            .values()
            .filter(|major| {
                major.audit.is_live() && major.faculty_id == faculty_id
            })
            .count() as u64)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: MajorID,
        patch: &MajorPatch,
    ) -> Result<Major> {
        let audit = self.store.audit();
        audit
            .timed("majors.update", async {
                let mut state = self.store.lock().await;
                if let Some(code) = &patch.code {
                    ensure_code_free(&state, code, Some(id))?;
                }
                let major = state
                    .majors
                    .get_mut(&id)
                    .filter(|major| major.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("major", id))?;
                patch.apply(major);
                if let Some(stamp) = audit.on_update(ctx) {
                    stamp.apply(&mut major.audit);
                }
                Ok(major.clone())
            })
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: MajorID,
    ) -> Result<()> {
        let audit = self.store.audit();
        audit
            .timed("majors.soft_delete", async {
                let mut state = self.store.lock().await;
                let major = state
                    .majors
                    .get_mut(&id)
                    .filter(|major| major.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("major", id))?;
                audit.on_delete(ctx).apply(&mut major.audit);
                Ok(())
            })
            .await
    }
}
