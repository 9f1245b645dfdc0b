// ============================================================================
// KERNEL PARAMETERS — live configuration read fresh every frame
// ============================================================================

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Which kernel-internal identifier to paint instead of the filtered image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum VisualizeMode {
    DispatchId,
    GroupId,
    GroupThreadId,
    GroupIndex,
}

/// Values pushed to the tile kernel's uniforms.
///
/// Mutated by whoever owns configuration (side panel, CLI, config file)
/// between frames.  No validation happens here: an out-of-range radius goes
/// to the kernel as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParameters {
    pub tile_kernel_radius: i32,
    pub visualize_dispatch_thread_id: bool,
    pub visualize_group_id: bool,
    pub visualize_group_thread_id: bool,
    pub visualize_group_index: bool,
}

impl KernelParameters {
    /// Declared range for `tile_kernel_radius`.
    pub const RADIUS_RANGE: RangeInclusive<i32> = 1..=5;

    pub fn toggle(&mut self, mode: VisualizeMode) {
        let flag = self.flag_mut(mode);
        *flag = !*flag;
    }

    pub fn set(&mut self, mode: VisualizeMode, on: bool) {
        *self.flag_mut(mode) = on;
    }

    pub fn is_set(&self, mode: VisualizeMode) -> bool {
        match mode {
            VisualizeMode::DispatchId => self.visualize_dispatch_thread_id,
            VisualizeMode::GroupId => self.visualize_group_id,
            VisualizeMode::GroupThreadId => self.visualize_group_thread_id,
            VisualizeMode::GroupIndex => self.visualize_group_index,
        }
    }

    fn flag_mut(&mut self, mode: VisualizeMode) -> &mut bool {
        match mode {
            VisualizeMode::DispatchId => &mut self.visualize_dispatch_thread_id,
            VisualizeMode::GroupId => &mut self.visualize_group_id,
            VisualizeMode::GroupThreadId => &mut self.visualize_group_thread_id,
            VisualizeMode::GroupIndex => &mut self.visualize_group_index,
        }
    }
}

impl Default for KernelParameters {
    fn default() -> Self {
        Self {
            tile_kernel_radius: 1,
            visualize_dispatch_thread_id: false,
            visualize_group_id: false,
            visualize_group_thread_id: false,
            visualize_group_index: false,
        }
    }
}
