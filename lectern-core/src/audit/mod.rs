//! Write-path stamping shared by every repository.
//!
//! Each mutating repository method asks the [`AuditInterceptor`] for a stamp
//! before touching the store:
//!
//! * create: a fresh server-minted id plus `created_at`/`created_by`, every
//!   other lifecycle field cleared;
//! * update: `updated_at`/`updated_by`, but only when an actor is present;
//! * delete: `is_deleted`/`deleted_at`/`deleted_by`. Physical deletes are
//!   never issued from this path.
//!
//! Timestamps are taken from a [`Clock`] and expressed in the configured
//! reporting offset.

mod clock;

use std::{future::Future, sync::Arc, time::Instant};

use chrono::{DateTime, FixedOffset};
use lectern_model::{AuditFields, Draft, UserID, reporting_offset};
use tracing::debug;
use uuid::Uuid;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::{
    context::RequestContext,
    error::{LecternError, Result},
};

/// Identity and stamps for a record about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStamp {
    pub id: Uuid,
    pub audit: AuditFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStamp {
    pub at: DateTime<FixedOffset>,
    pub by: UserID,
}

impl UpdateStamp {
    pub fn apply(&self, audit: &mut AuditFields) {
        audit.updated_at = Some(self.at);
        audit.updated_by = Some(self.by);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteStamp {
    pub at: DateTime<FixedOffset>,
    pub by: Option<UserID>,
}

impl DeleteStamp {
    pub fn apply(&self, audit: &mut AuditFields) {
        audit.is_deleted = true;
        audit.deleted_at = Some(self.at);
        audit.deleted_by = self.by;
    }
}

#[derive(Debug, Clone)]
pub struct AuditInterceptor {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl Default for AuditInterceptor {
    fn default() -> Self {
        Self::new(reporting_offset())
    }
}

impl AuditInterceptor {
    pub fn new(offset: FixedOffset) -> Self {
        Self::with_clock(Arc::new(SystemClock), offset)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { clock, offset }
    }

    /// Build an interceptor for a whole-hour reporting offset.
    pub fn from_offset_hours(hours: i32) -> Result<Self> {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                LecternError::InvalidArgument(format!(
                    "utc offset of {hours} hours is out of range"
                ))
            })?;
        Ok(Self::new(offset))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant in the reporting offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.offset)
    }

    /// Stamp a single new record. Client-supplied ids are refused.
    pub fn on_create<D: Draft>(
        &self,
        ctx: &RequestContext,
        draft: &D,
    ) -> Result<CreateStamp> {
        let at = self.now();
        self.stamp_create(ctx, draft, at)
    }

    /// Stamp a batch. All records share one creation instant; one bad draft
    /// fails the whole batch.
    pub fn on_create_many<D: Draft>(
        &self,
        ctx: &RequestContext,
        drafts: &[D],
    ) -> Result<Vec<CreateStamp>> {
        let at = self.now();
        drafts
            .iter()
            .map(|draft| self.stamp_create(ctx, draft, at))
            .collect()
    }

    /// `None` when the call is anonymous: the update goes ahead unstamped.
    /// The same stamp is applied to every row of a batch update.
    pub fn on_update(&self, ctx: &RequestContext) -> Option<UpdateStamp> {
        ctx.actor_id().map(|by| UpdateStamp { at: self.now(), by })
    }

    pub fn on_delete(&self, ctx: &RequestContext) -> DeleteStamp {
        DeleteStamp {
            at: self.now(),
            by: ctx.actor_id(),
        }
    }

    /// Run `fut`, then emit a debug event with its wall time. The outcome is
    /// returned untouched.
    pub async fn timed<F, T>(&self, operation: &'static str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let output = fut.await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(operation, elapsed_ms, "store operation finished");
        output
    }

    fn stamp_create<D: Draft>(
        &self,
        ctx: &RequestContext,
        draft: &D,
        at: DateTime<FixedOffset>,
    ) -> Result<CreateStamp> {
        if let Some(claimed) = draft.claimed_id() {
            return Err(LecternError::Validation(format!(
                "id {claimed} was supplied by the caller; ids are assigned \
                 on create"
            )));
        }
        Ok(CreateStamp {
            id: Uuid::now_v7(),
            audit: AuditFields::created(at, ctx.actor_id()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lectern_model::{NewCourse, Role};

    use super::*;
    use crate::context::Actor;

    fn fixed() -> (Arc<ManualClock>, AuditInterceptor) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 20, 30, 0).unwrap(),
        ));
        let interceptor =
            AuditInterceptor::with_clock(clock.clone(), reporting_offset());
        (clock, interceptor)
    }

    fn lecturer() -> RequestContext {
        RequestContext::for_actor(Actor::new(UserID::new(), Role::Lecturer))
    }

    #[test]
    fn create_stamps_actor_and_reporting_time() {
        let (_, interceptor) = fixed();
        let ctx = lecturer();
        let stamp = interceptor
            .on_create(&ctx, &NewCourse::new("Rust 101"))
            .unwrap();

        assert_eq!(stamp.audit.created_by, ctx.actor_id());
        assert_eq!(stamp.audit.updated_at, None);
        assert_eq!(stamp.audit.updated_by, None);
        assert!(!stamp.audit.is_deleted);
        assert_eq!(stamp.audit.deleted_at, None);
        // 20:30 UTC is 03:30 the next day at UTC+7.
        assert_eq!(
            stamp.audit.created_at.to_rfc3339(),
            "2024-05-02T03:30:00+07:00"
        );
    }

    #[test]
    fn anonymous_create_leaves_creator_null() {
        let (_, interceptor) = fixed();
        let stamp = interceptor
            .on_create(&RequestContext::anonymous(), &NewCourse::new("x"))
            .unwrap();
        assert_eq!(stamp.audit.created_by, None);
    }

    #[test]
    fn client_supplied_id_is_rejected() {
        let (_, interceptor) = fixed();
        let mut draft = NewCourse::new("x");
        draft.id = Some(Uuid::new_v4());
        assert!(matches!(
            interceptor.on_create(&lecturer(), &draft),
            Err(LecternError::Validation(_))
        ));
    }

    #[test]
    fn batch_create_mints_distinct_ids_at_one_instant() {
        let (_, interceptor) = fixed();
        let drafts = vec![NewCourse::new("a"), NewCourse::new("b")];
        let stamps = interceptor.on_create_many(&lecturer(), &drafts).unwrap();
        assert_eq!(stamps.len(), 2);
        assert_ne!(stamps[0].id, stamps[1].id);
        assert_eq!(stamps[0].audit.created_at, stamps[1].audit.created_at);

        let mut poisoned = drafts;
        poisoned[1].id = Some(Uuid::new_v4());
        assert!(interceptor.on_create_many(&lecturer(), &poisoned).is_err());
    }

    #[test]
    fn update_requires_actor_to_stamp() {
        let (clock, interceptor) = fixed();
        assert!(
            interceptor
                .on_update(&RequestContext::anonymous())
                .is_none()
        );

        let ctx = lecturer();
        let created = interceptor.on_create(&ctx, &NewCourse::new("x")).unwrap();
        let mut audit = created.audit.clone();
        clock.advance(chrono::Duration::minutes(5));
        let stamp = interceptor.on_update(&ctx).unwrap();
        stamp.apply(&mut audit);

        assert_eq!(audit.updated_by, ctx.actor_id());
        assert_eq!(
            audit.updated_at.map(|at| at - created.audit.created_at),
            Some(chrono::Duration::minutes(5))
        );
        assert_eq!(audit.created_at, created.audit.created_at);
    }

    #[test]
    fn delete_flips_flag_even_without_actor() {
        let (_, interceptor) = fixed();
        let mut audit = interceptor
            .on_create(&lecturer(), &NewCourse::new("x"))
            .unwrap()
            .audit;
        interceptor
            .on_delete(&RequestContext::anonymous())
            .apply(&mut audit);
        assert!(audit.is_deleted);
        assert!(audit.deleted_at.is_some());
        assert_eq!(audit.deleted_by, None);
    }

    #[test]
    fn offset_hours_are_bounded() {
        assert_eq!(
            AuditInterceptor::from_offset_hours(-5)
                .unwrap()
                .offset()
                .local_minus_utc(),
            -5 * 3600
        );
        assert!(AuditInterceptor::from_offset_hours(30).is_err());
    }

    #[tokio::test]
    async fn timed_passes_the_result_through() {
        let (_, interceptor) = fixed();
        let value = interceptor.timed("noop", async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }
}
