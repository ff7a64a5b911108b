//! PostgreSQL-backed implementations of the repository ports.

pub mod courses;
pub mod faculties;
pub mod majors;
pub mod users;
pub mod videos;

use lectern_model::{PageRequest, UserID};
use uuid::Uuid;

use crate::audit::UpdateStamp;

/// `LIMIT`/`OFFSET` bind values.
pub(crate) fn limit_offset(page: PageRequest) -> (i64, i64) {
    (
        i64::from(page.limit),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

pub(crate) fn total_from(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Trimmed search needle, `None` when there is nothing to match on.
pub(crate) fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_owned)
}

pub(crate) fn uuid_of(user: Option<UserID>) -> Option<Uuid> {
    user.map(|id| id.to_uuid())
}

/// Bind values for `updated_at = COALESCE($n, updated_at)` style clauses.
/// An anonymous update binds NULLs and leaves the columns as they were.
pub(crate) fn update_binds(
    stamp: Option<UpdateStamp>,
) -> (Option<chrono::DateTime<chrono::FixedOffset>>, Option<Uuid>) {
    match stamp {
        Some(stamp) => (Some(stamp.at), Some(stamp.by.to_uuid())),
        None => (None, None),
    }
}

/// Bind values for `col = CASE WHEN $n THEN $n+1 ELSE col END`, the
/// clearable counterpart of `COALESCE` for nullable columns.
pub(crate) fn nullable_binds<T: Clone>(
    change: &Option<Option<T>>,
) -> (bool, Option<T>) {
    (change.is_some(), change.clone().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_terms_are_trimmed() {
        assert_eq!(search_term(Some("  rust ")), Some("rust".to_string()));
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(None), None);
    }

    #[test]
    fn nullable_binds_distinguish_keep_from_clear() {
        assert_eq!(nullable_binds::<String>(&None), (false, None));
        assert_eq!(nullable_binds::<String>(&Some(None)), (true, None));
        assert_eq!(
            nullable_binds(&Some(Some("x".to_string()))),
            (true, Some("x".to_string()))
        );
    }

    #[test]
    fn paging_binds() {
        let page = PageRequest::new(3, 20).unwrap();
        assert_eq!(limit_offset(page), (20, 40));
        assert_eq!(total_from(-1), 0);
    }
}
