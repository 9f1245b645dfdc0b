// ============================================================================
// DISPATCH PLANNER — group counts for a kernel invocation
// ============================================================================
//
// Dispatch is expressed in thread *groups*, not threads.  A group is a
// THREADS_PER_GROUP x THREADS_PER_GROUP block; the kernel's
// `@workgroup_size` must agree with this constant.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Threads per group along each axis.
pub const THREADS_PER_GROUP: NonZeroU32 = match NonZeroU32::new(32) {
    Some(n) => n,
    None => unreachable!(),
};

/// How a partial trailing group is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRounding {
    /// `size / threads`, leaving the last partial group unprocessed.
    #[default]
    Floor,
    /// `ceil(size / threads)`, covering every pixel.
    Ceil,
}

/// Number of groups to dispatch along x and y.  Never zero on either axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchPlan {
    pub groups_x: NonZeroU32,
    pub groups_y: NonZeroU32,
    threads_per_group: NonZeroU32,
}

impl DispatchPlan {
    pub fn groups(&self) -> (u32, u32) {
        (self.groups_x.get(), self.groups_y.get())
    }

    /// Pixels per axis touched by the dispatched threads.
    pub fn covered_extent(&self) -> (u32, u32) {
        let t = self.threads_per_group.get();
        (
            self.groups_x.get().saturating_mul(t),
            self.groups_y.get().saturating_mul(t),
        )
    }

    /// True when some pixels of a `width x height` image are never processed.
    pub fn under_covers(&self, width: u32, height: u32) -> bool {
        let (cx, cy) = self.covered_extent();
        cx < width || cy < height
    }
}

fn groups_for(size: u32, threads: NonZeroU32, rounding: GroupRounding) -> NonZeroU32 {
    let groups = match rounding {
        GroupRounding::Floor => size / threads,
        GroupRounding::Ceil => size.div_ceil(threads.get()),
    };
    NonZeroU32::new(groups).unwrap_or(NonZeroU32::MIN)
}

/// Group counts for a square image: both axes are `max(1, size / threads)`.
pub fn plan(image_size: u32, threads_per_group: NonZeroU32) -> DispatchPlan {
    let groups = groups_for(image_size, threads_per_group, GroupRounding::Floor);
    DispatchPlan {
        groups_x: groups,
        groups_y: groups,
        threads_per_group,
    }
}

/// Per-axis plan for an arbitrary extent.
pub fn plan_extent(
    width: u32,
    height: u32,
    threads_per_group: NonZeroU32,
    rounding: GroupRounding,
) -> DispatchPlan {
    DispatchPlan {
        groups_x: groups_for(width, threads_per_group, rounding),
        groups_y: groups_for(height, threads_per_group, rounding),
        threads_per_group,
    }
}
