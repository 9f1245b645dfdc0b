// ============================================================================
// CONFIG — JSON settings file, overridden by command-line flags
// ============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::CliArgs;
use crate::dispatch::GroupRounding;
use crate::error::{TileError, TileResult};
use crate::lifecycle::DEFAULT_ENTRY_POINT;
use crate::params::KernelParameters;

/// Startup configuration.  Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Image to process.  `None` means no source; initialization halts.
    pub source: Option<PathBuf>,
    /// Kernel entry point to resolve in the compute program.
    pub entry_point: String,
    /// "Auto", "high performance" / "discrete", or "low power" / "integrated".
    pub preferred_gpu: String,
    pub group_rounding: GroupRounding,
    /// Initial kernel parameters; the settings window edits them afterwards.
    pub kernel: KernelParameters,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: None,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            preferred_gpu: "Auto".to_string(),
            group_rounding: GroupRounding::Floor,
            kernel: KernelParameters::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> TileResult<Self> {
        serde_json::from_str(text).map_err(|e| TileError::config(e.to_string()))
    }

    pub fn load(path: &Path) -> TileResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| TileError::config(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// File (if `--config` was given) then flags on top.
    pub fn resolve(args: &CliArgs) -> TileResult<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        cfg.apply_args(args);
        Ok(cfg)
    }

    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(source) = &args.source {
            self.source = Some(source.clone());
        }
        if let Some(entry) = &args.entry_point {
            self.entry_point = entry.clone();
        }
        if let Some(gpu) = &args.gpu {
            self.preferred_gpu = gpu.clone();
        }
        if args.cover_partial_groups {
            self.group_rounding = GroupRounding::Ceil;
        }
        if let Some(radius) = args.kernel_size {
            self.kernel.tile_kernel_radius = radius;
        }
        for &mode in &args.visualize {
            self.kernel.set(mode, true);
        }
    }
}
