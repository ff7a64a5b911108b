use async_trait::async_trait;
use lectern_model::{
    CourseID, NewVideo, Page, PageRequest, Video, VideoID, VideoPatch,
};

use super::{MemoryState, MemoryStore, paginate};
use crate::{
    audit::UpdateStamp,
    context::RequestContext,
    database::ports::VideosRepository,
    error::{LecternError, Result},
    ordering::{
        ReorderPlan, compaction_after_removal, next_order, validate_new_order,
    },
};

#[derive(Debug, Clone)]
pub struct InMemoryVideosRepository {
    store: MemoryStore,
}

impl InMemoryVideosRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn live_scope(
    state: &mut MemoryState,
    course_id: CourseID,
) -> impl Iterator<Item = &mut Video> {
    state.videos.values_mut().filter(move |video| {
        video.course_id == course_id && video.audit.is_live()
    })
}

fn require_live_course(state: &MemoryState, course_id: CourseID) -> Result<()> {
    let live = state
        .courses
        .get(&course_id)
        .is_some_and(|course| course.audit.is_live());
    if live {
        Ok(())
    } else {
        Err(LecternError::not_found("course", course_id))
    }
}

fn stamp_moved(
    state: &mut MemoryState,
    moved: &[VideoID],
    stamp: Option<UpdateStamp>,
) {
    let Some(stamp) = stamp else {
        return;
    };
    for id in moved {
        if let Some(video) = state.videos.get_mut(id) {
            stamp.apply(&mut video.audit);
        }
    }
}

fn sorted_by_order(mut videos: Vec<Video>) -> Vec<Video> {
    videos.sort_by_key(|video| (video.order, video.id));
    videos
}

#[async_trait]
impl VideosRepository for InMemoryVideosRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        course_id: CourseID,
        draft: &NewVideo,
    ) -> Result<Video> {
        let audit = self.store.audit();
        audit
            .timed("videos.create", async {
                let stamp = audit.on_create(ctx, draft)?;
                let mut state = self.store.lock().await;
                require_live_course(&state, course_id)?;

                let order = next_order(
                    live_scope(&mut state, course_id).map(|video| video.order),
                );
                let video = Video {
                    id: VideoID(stamp.id),
                    course_id,
                    title: draft.title.clone(),
                    url: draft.url.clone(),
                    size: draft.size,
                    status: draft.status.clone(),
                    order,
                    audit: stamp.audit,
                };
                state.videos.insert(video.id, video.clone());
                Ok(video)
            })
            .await
    }

    async fn get(&self, id: VideoID) -> Result<Option<Video>> {
        Ok(self
            .get_including_deleted(id)
            .await?
            .filter(|video| video.audit.is_live()))
    }

    async fn get_including_deleted(&self, id: VideoID) -> Result<Option<Video>> {
        let state = self.store.lock().await;
        Ok(state.videos.get(&id).cloned())
    }

    async fn list_by_course(
        &self,
        course_id: CourseID,
        page: PageRequest,
    ) -> Result<Page<Video>> {
        let rows = self.list_all_by_course(course_id).await?;
        Ok(paginate(&rows, page))
    }

    async fn list_all_by_course(
        &self,
        course_id: CourseID,
    ) -> Result<Vec<Video>> {
        let state = self.store.lock().await;
        Ok(sorted_by_order(
            state
                .videos
                .values()
                .filter(|video| {
                    video.course_id == course_id && video.audit.is_live()
                })
                .cloned()
                .collect(),
        ))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        patch: &VideoPatch,
    ) -> Result<Video> {
        let audit = self.store.audit();
        audit
            .timed("videos.update", async {
                let mut state = self.store.lock().await;
                let video = state
                    .videos
                    .get_mut(&id)
                    .filter(|video| video.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("video", id))?;
                patch.apply(video);
                if let Some(stamp) = audit.on_update(ctx) {
                    stamp.apply(&mut video.audit);
                }
                Ok(video.clone())
            })
            .await
    }

    async fn reorder(
        &self,
        ctx: &RequestContext,
        id: VideoID,
        new_order: i64,
    ) -> Result<Video> {
        let audit = self.store.audit();
        audit
            .timed("videos.reorder", async {
                let to = validate_new_order(new_order)?;
                let mut state = self.store.lock().await;
                let (course_id, from) = state
                    .videos
                    .get(&id)
                    .filter(|video| video.audit.is_live())
                    .map(|video| (video.course_id, video.order))
                    .ok_or_else(|| LecternError::not_found("video", id))?;
                require_live_course(&state, course_id)?;

                let live_count = live_scope(&mut state, course_id).count();
                let plan = ReorderPlan::new(from, to, live_count)?;
                let moved = plan.apply(live_scope(&mut state, course_id), id);
                stamp_moved(&mut state, &moved, audit.on_update(ctx));

                state
                    .videos
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| LecternError::not_found("video", id))
            })
            .await
    }

    async fn soft_delete(&self, ctx: &RequestContext, id: VideoID) -> Result<()> {
        let audit = self.store.audit();
        audit
            .timed("videos.soft_delete", async {
                let mut state = self.store.lock().await;
                let course_id = state
                    .videos
                    .get(&id)
                    .filter(|video| video.audit.is_live())
                    .map(|video| video.course_id)
                    .ok_or_else(|| LecternError::not_found("video", id))?;
                require_live_course(&state, course_id)?;

                let video = state
                    .videos
                    .get_mut(&id)
                    .ok_or_else(|| LecternError::not_found("video", id))?;
                audit.on_delete(ctx).apply(&mut video.audit);
                let removed = video.order;

                let shift = compaction_after_removal(removed);
                let mut moved = Vec::new();
                for sibling in live_scope(&mut state, course_id) {
                    if shift.covers(sibling.order) {
                        sibling.order = shift.shifted(sibling.order);
                        moved.push(sibling.id);
                    }
                }
                stamp_moved(&mut state, &moved, audit.on_update(ctx));
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lectern_model::{NewCourse, Role, UserID};

    use super::*;
    use crate::{
        context::Actor, database::ports::CoursesRepository, ordering::is_dense,
    };

    struct Fixture {
        store: MemoryStore,
        videos: InMemoryVideosRepository,
        ctx: RequestContext,
        course: CourseID,
    }

    impl Fixture {
        async fn with_videos(titles: &[&str]) -> (Self, Vec<VideoID>) {
            let store = MemoryStore::default();
            let ctx = RequestContext::for_actor(Actor::new(
                UserID::new(),
                Role::Lecturer,
            ));
            let course = store
                .courses()
                .create(&ctx, &NewCourse::new("Course"))
                .await
                .unwrap()
                .id;
            let videos = store.videos();
            let mut ids = Vec::new();
            for title in titles {
                let video = videos
                    .create(&ctx, course, &NewVideo::new(*title))
                    .await
                    .unwrap();
                ids.push(video.id);
            }
            (
                Self {
                    store,
                    videos,
                    ctx,
                    course,
                },
                ids,
            )
        }

        async fn titles(&self) -> String {
            self.videos
                .list_all_by_course(self.course)
                .await
                .unwrap()
                .iter()
                .map(|video| video.title.as_str())
                .collect()
        }

        async fn orders(&self) -> Vec<i32> {
            self.videos
                .list_all_by_course(self.course)
                .await
                .unwrap()
                .iter()
                .map(|video| video.order)
                .collect()
        }
    }

    #[tokio::test]
    async fn create_appends_to_the_end() {
        let (fx, _) = Fixture::with_videos(&["a", "b", "c"]).await;
        assert_eq!(fx.orders().await, vec![0, 1, 2]);
        assert_eq!(fx.titles().await, "abc");
    }

    #[tokio::test]
    async fn create_in_missing_course_is_not_found() {
        let (fx, _) = Fixture::with_videos(&[]).await;
        let err = fx
            .videos
            .create(&fx.ctx, CourseID::new(), &NewVideo::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn reorder_forward_and_backward() {
        let (fx, ids) = Fixture::with_videos(&["a", "b", "c", "d"]).await;
        let moved = fx.videos.reorder(&fx.ctx, ids[3], 1).await.unwrap();
        assert_eq!(moved.order, 1);
        assert_eq!(fx.titles().await, "adbc");

        let (fx, ids) = Fixture::with_videos(&["a", "b", "c", "d"]).await;
        fx.videos.reorder(&fx.ctx, ids[0], 3).await.unwrap();
        assert_eq!(fx.titles().await, "bcda");
        assert_eq!(fx.orders().await, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn reorder_stamps_every_moved_row() {
        let (fx, ids) = Fixture::with_videos(&["a", "b", "c", "d"]).await;
        fx.videos.reorder(&fx.ctx, ids[2], 0).await.unwrap();

        let all = fx.videos.list_all_by_course(fx.course).await.unwrap();
        let stamped: HashMap<_, _> = all
            .iter()
            .map(|video| (video.title.as_str(), video.audit.updated_by))
            .collect();
        assert_eq!(stamped["a"], fx.ctx.actor_id());
        assert_eq!(stamped["b"], fx.ctx.actor_id());
        assert_eq!(stamped["c"], fx.ctx.actor_id());
        assert_eq!(stamped["d"], None);
    }

    #[tokio::test]
    async fn same_position_is_a_no_op() {
        let (fx, ids) = Fixture::with_videos(&["a", "b", "c"]).await;
        let before = fx.videos.list_all_by_course(fx.course).await.unwrap();
        fx.videos.reorder(&fx.ctx, ids[1], 1).await.unwrap();
        let after = fx.videos.list_all_by_course(fx.course).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn invalid_targets_are_rejected_without_changes() {
        let (fx, ids) = Fixture::with_videos(&["a", "b", "c"]).await;
        for bad in [-1, 3, i64::MAX] {
            let err = fx.videos.reorder(&fx.ctx, ids[0], bad).await.unwrap_err();
            assert!(matches!(err, LecternError::InvalidArgument(_)), "{bad}");
        }
        assert_eq!(fx.titles().await, "abc");

        let err = fx
            .videos
            .reorder(&fx.ctx, VideoID::new(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn soft_delete_compacts_the_scope() {
        let (fx, ids) = Fixture::with_videos(&["a", "b", "c", "d"]).await;
        fx.videos.soft_delete(&fx.ctx, ids[1]).await.unwrap();

        assert_eq!(fx.titles().await, "acd");
        assert_eq!(fx.orders().await, vec![0, 1, 2]);
        assert_eq!(fx.videos.get(ids[1]).await.unwrap(), None);

        let deleted = fx
            .videos
            .get_including_deleted(ids[1])
            .await
            .unwrap()
            .unwrap();
        assert!(deleted.audit.is_deleted);
        assert_eq!(deleted.order, 1);

        assert!(matches!(
            fx.videos.reorder(&fx.ctx, ids[1], 0).await,
            Err(LecternError::NotFound(_))
        ));
        let err = fx.videos.reorder(&fx.ctx, ids[0], 3).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn deleted_course_freezes_its_videos() {
        let (fx, ids) = Fixture::with_videos(&["a", "b"]).await;
        fx.store
            .courses()
            .soft_delete(&fx.ctx, fx.course)
            .await
            .unwrap();

        let err = fx.videos.reorder(&fx.ctx, ids[1], 0).await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
        let err = fx.videos.soft_delete(&fx.ctx, ids[0]).await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
        assert_eq!(fx.orders().await, vec![0, 1]);
    }

    #[tokio::test]
    async fn density_survives_mixed_operations() {
        let (fx, ids) =
            Fixture::with_videos(&["a", "b", "c", "d", "e", "f"]).await;
        fx.videos.reorder(&fx.ctx, ids[5], 0).await.unwrap();
        fx.videos.soft_delete(&fx.ctx, ids[2]).await.unwrap();
        fx.videos.reorder(&fx.ctx, ids[0], 4).await.unwrap();
        fx.videos
            .create(&fx.ctx, fx.course, &NewVideo::new("g"))
            .await
            .unwrap();
        fx.videos.soft_delete(&fx.ctx, ids[5]).await.unwrap();
        fx.videos.reorder(&fx.ctx, ids[4], 1).await.unwrap();

        assert!(is_dense(fx.orders().await));
        assert_eq!(fx.titles().await, "bedag");
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let (fx, ids) = Fixture::with_videos(&["a", "b"]).await;
        let other = fx
            .store
            .courses()
            .create(&fx.ctx, &NewCourse::new("Other"))
            .await
            .unwrap()
            .id;
        let foreign = fx
            .videos
            .create(&fx.ctx, other, &NewVideo::new("z"))
            .await
            .unwrap();
        assert_eq!(foreign.order, 0);

        fx.videos.reorder(&fx.ctx, ids[1], 0).await.unwrap();
        let untouched = fx.videos.get(foreign.id).await.unwrap().unwrap();
        assert_eq!(untouched.order, 0);
        assert_eq!(untouched.audit.updated_at, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reorders_keep_the_scope_dense() {
        let titles: Vec<String> = (0..12).map(|i| format!("v{i:02}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let (fx, ids) = Fixture::with_videos(&refs).await;

        let mut handles = Vec::new();
        for round in 0..48usize {
            let videos = fx.videos.clone();
            let ctx = fx.ctx;
            let id = ids[round % ids.len()];
            let target = ((round * 7) % ids.len()) as i64;
            handles.push(tokio::spawn(async move {
                videos.reorder(&ctx, id, target).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let orders = fx.orders().await;
        assert_eq!(orders.len(), 12);
        assert!(is_dense(orders));
    }
}
