// ============================================================================
// tileviz CLI — startup flags
// ============================================================================
//
// Usage examples:
//   tileviz --source photo.png
//   tileviz -s photo.png --kernel-size 3 --visualize group-id
//   tileviz --config tileviz.json --cover-partial-groups

use std::path::PathBuf;

use clap::Parser;

use crate::params::VisualizeMode;

/// Run the tile compute kernel over an image and show the result.
#[derive(Parser, Debug, Default)]
#[command(
    name = "tileviz",
    about = "Tiled compute-kernel visualiser",
    long_about = "Runs the K_Tiles compute kernel over a source image every frame and\n\
                  shows the result in a square viewport. Thread and group identifiers\n\
                  can be visualised instead of the filtered image.\n\n\
                  Example:\n  \
                  tileviz --source photo.png --visualize group-id"
)]
pub struct CliArgs {
    /// Source image. Without one, a checkerboard is generated when --demo is set;
    /// otherwise startup halts.
    #[arg(short, long, value_name = "IMAGE")]
    pub source: Option<PathBuf>,

    /// Generate a 512x512 checkerboard source instead of loading a file.
    #[arg(long)]
    pub demo: bool,

    /// JSON config file. Flags given here override its values.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tile kernel radius (declared range 1-5; passed to the kernel unchecked).
    #[arg(short, long, value_name = "N", allow_hyphen_values = true)]
    pub kernel_size: Option<i32>,

    /// Start with a visualisation mode enabled. May be repeated.
    #[arg(short, long, value_enum)]
    pub visualize: Vec<VisualizeMode>,

    /// Kernel entry point to resolve.
    #[arg(long, value_name = "NAME")]
    pub entry_point: Option<String>,

    /// GPU preference: auto, "high performance", "low power".
    #[arg(long, value_name = "PREF")]
    pub gpu: Option<String>,

    /// Round group counts up so partial trailing groups are dispatched too.
    #[arg(long)]
    pub cover_partial_groups: bool,
}
