//! Dense ordinal positions within a parent scope.
//!
//! Live members of a scope (the non-deleted videos of one course) always
//! hold the orders `0..N` exactly once each. Moving one member from `from`
//! to `to` shifts every sibling in between by one slot:
//!
//! ```text
//! to > from: siblings in (from, to] move down by one
//! to < from: siblings in [to, from) move up by one
//! ```
//!
//! This module only plans and applies the arithmetic. Serialising
//! concurrent plans against the same scope is the repository's job.

use std::collections::BTreeSet;

use lectern_model::{Video, VideoID};

use crate::error::{LecternError, Result};

/// Anything that occupies a slot in an ordered scope.
pub trait Orderable {
    /// Identifier used to single out the member being moved.
    type Id: PartialEq + Copy;

    fn item_id(&self) -> Self::Id;
    /// Current zero-based slot.
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

impl Orderable for Video {
    type Id = VideoID;

    fn item_id(&self) -> VideoID {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

/// Check a requested position before any store access.
pub fn validate_new_order(new_order: i64) -> Result<i32> {
    if new_order < 0 {
        return Err(LecternError::InvalidArgument(format!(
            "order must be non-negative, got {new_order}"
        )));
    }
    i32::try_from(new_order).map_err(|_| {
        LecternError::InvalidArgument(format!(
            "order {new_order} is out of range"
        ))
    })
}

/// Add `delta` to every sibling whose order lies in `lower..=upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingShift {
    /// First affected order, inclusive.
    pub lower: i32,
    /// Last affected order, inclusive.
    pub upper: i32,
    /// `+1` when making room, `-1` when closing a gap.
    pub delta: i32,
}

impl SiblingShift {
    /// Whether a sibling at `order` is moved by this shift.
    pub fn covers(&self, order: i32) -> bool {
        (self.lower..=self.upper).contains(&order)
    }

    pub fn shifted(&self, order: i32) -> i32 {
        if self.covers(order) {
            order + self.delta
        } else {
            order
        }
    }
}

/// Shift that closes the hole left when the member at `removed` leaves the
/// scope.
pub fn compaction_after_removal(removed: i32) -> SiblingShift {
    SiblingShift {
        lower: removed.saturating_add(1),
        upper: i32::MAX,
        delta: -1,
    }
}

/// Slot for a member appended to the end of the scope.
pub fn next_order(live_orders: impl IntoIterator<Item = i32>) -> i32 {
    live_orders
        .into_iter()
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Whether `orders` is exactly `0..N` with no duplicates.
pub fn is_dense(orders: impl IntoIterator<Item = i32>) -> bool {
    let mut count = 0usize;
    let mut seen = BTreeSet::new();
    for order in orders {
        count += 1;
        if order < 0 || !seen.insert(order) {
            return false;
        }
    }
    seen.last().is_none_or(|&max| {
        usize::try_from(max).is_ok_and(|max| max + 1 == count)
    })
}

/// A validated move of one member within a scope of `live_count` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPlan {
    pub from: i32,
    pub to: i32,
    /// Sibling adjustment, `None` when `from == to`.
    pub shift: Option<SiblingShift>,
}

impl ReorderPlan {
    /// Out-of-range targets (`to >= live_count`) are rejected rather than
    /// clamped.
    pub fn new(from: i32, to: i32, live_count: usize) -> Result<Self> {
        let in_range = |order: i32| {
            usize::try_from(order).is_ok_and(|order| order < live_count)
        };
        if !in_range(to) {
            return Err(LecternError::InvalidArgument(format!(
                "order {to} is outside 0..{live_count}"
            )));
        }
        if !in_range(from) {
            return Err(LecternError::Internal(format!(
                "current order {from} is outside 0..{live_count}; scope is \
                 not dense"
            )));
        }

        let shift = match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(SiblingShift {
                lower: from + 1,
                upper: to,
                delta: -1,
            }),
            std::cmp::Ordering::Less => Some(SiblingShift {
                lower: to,
                upper: from - 1,
                delta: 1,
            }),
            std::cmp::Ordering::Equal => None,
        };

        Ok(Self { from, to, shift })
    }

    pub fn is_noop(&self) -> bool {
        self.shift.is_none()
    }

    /// Apply the move to the live members of one scope. Returns the ids
    /// whose position changed, the target included.
    pub fn apply<'a, T, I>(&self, scope: I, target: T::Id) -> Vec<T::Id>
    where
        T: Orderable + 'a,
        I: IntoIterator<Item = &'a mut T>,
    {
        let Some(shift) = self.shift else {
            return Vec::new();
        };

        let mut moved = Vec::new();
        for item in scope {
            if item.item_id() == target {
                item.set_order(self.to);
            } else if shift.covers(item.order()) {
                item.set_order(item.order() + shift.delta);
            } else {
                continue;
            }
            moved.push(item.item_id());
        }
        moved
    }
}
