use async_trait::async_trait;
use lectern_model::{
    Course, CourseFilter, CourseID, CoursePatch, NewCourse, Page, PageRequest,
};

use super::{MemoryStore, newest_first, paginate};
use crate::{
    context::RequestContext,
    database::ports::CoursesRepository,
    error::{LecternError, Result},
};

#[derive(Debug, Clone)]
pub struct InMemoryCoursesRepository {
    store: MemoryStore,
}

impl InMemoryCoursesRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoursesRepository for InMemoryCoursesRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewCourse,
    ) -> Result<Course> {
        let audit = self.store.audit();
        audit
            .timed("courses.create", async {
                let stamp = audit.on_create(ctx, draft)?;
                let course = Course {
                    id: CourseID(stamp.id),
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    status: draft.status,
                    audit: stamp.audit,
                };
                let mut state = self.store.lock().await;
                state.courses.insert(course.id, course.clone());
                Ok(course)
            })
            .await
    }

    async fn get(&self, id: CourseID) -> Result<Option<Course>> {
        Ok(self
            .get_including_deleted(id)
            .await?
            .filter(|course| course.audit.is_live()))
    }

    async fn get_including_deleted(
        &self,
        id: CourseID,
    ) -> Result<Option<Course>> {
        let state = self.store.lock().await;
        Ok(state.courses.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>> {
        let state = self.store.lock().await;
        let mut rows: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course.audit.is_live() && filter.matches(course))
            .cloned()
            .collect();
        newest_first(&mut rows, |course| {
            (course.audit.created_at, course.id.0)
        });
        Ok(paginate(&rows, page))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: CourseID,
        patch: &CoursePatch,
    ) -> Result<Course> {
        let audit = self.store.audit();
        audit
            .timed("courses.update", async {
                let mut state = self.store.lock().await;
                let course = state
                    .courses
                    .get_mut(&id)
                    .filter(|course| course.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("course", id))?;
                patch.apply(course);
                if let Some(stamp) = audit.on_update(ctx) {
                    stamp.apply(&mut course.audit);
                }
                Ok(course.clone())
            })
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &RequestContext,
        id: CourseID,
    ) -> Result<()> {
        let audit = self.store.audit();
        audit
            .timed("courses.soft_delete", async {
                let mut state = self.store.lock().await;
                let course = state
                    .courses
                    .get_mut(&id)
                    .filter(|course| course.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("course", id))?;
                audit.on_delete(ctx).apply(&mut course.audit);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use lectern_model::{Role, UserID, reporting_offset};

    use super::*;
    use crate::{
        audit::{AuditInterceptor, ManualClock},
        context::Actor,
    };

    #[tokio::test]
    async fn list_filters_and_sorts_newest_first() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = MemoryStore::new(AuditInterceptor::with_clock(
            clock.clone(),
            reporting_offset(),
        ));
        let repo = store.courses();
        let ctx = RequestContext::for_actor(Actor::new(
            UserID::new(),
            Role::Lecturer,
        ));

        for (title, status) in
            [("Intro to Rust", 1), ("Advanced rust", 0), ("Go basics", 1)]
        {
            let mut draft = NewCourse::new(title);
            draft.status = status;
            repo.create(&ctx, &draft).await.unwrap();
            clock.advance(Duration::seconds(1));
        }

        let rust = CourseFilter {
            search: Some("RUST".into()),
            status: None,
        };
        let page = repo.list(&rust, PageRequest::default()).await.unwrap();
        let titles: Vec<_> = page.items.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Advanced rust", "Intro to Rust"]);
        assert_eq!(page.total, 2);

        let published = CourseFilter {
            search: None,
            status: Some(1),
        };
        let page = repo
            .list(&published, PageRequest::new(1, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(page.items[0].title, "Go basics");
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn anonymous_update_is_not_stamped() {
        let repo = MemoryStore::default().courses();
        let course = repo
            .create(&RequestContext::anonymous(), &NewCourse::new("x"))
            .await
            .unwrap();
        let patch = CoursePatch {
            title: Some("y".into()),
            ..CoursePatch::default()
        };
        let updated = repo
            .update(&RequestContext::anonymous(), course.id, &patch)
            .await
            .unwrap();
        assert_eq!(updated.title, "y");
        assert_eq!(updated.audit.updated_at, None);
        assert_eq!(updated.audit.updated_by, None);
    }
}
