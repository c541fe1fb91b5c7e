// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

use crate::scenes::DemoKind;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "scene-loop")]
#[command(about = "Interactive scene with picking, controls and asset loading", long_about = None)]
pub struct Cli {
    /// Demo scene to run
    #[arg(long, value_enum)]
    pub scene: Option<DemoKind>,

    /// Directory asset names are resolved against
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// JSON config file; flags given here take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable the control panel overlay
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,

    /// Give up on an asset load after this many milliseconds
    #[arg(long)]
    pub load_timeout_ms: Option<u64>,

    /// Restore the original color of nodes that are no longer picked
    #[arg(long, default_value = "false")]
    pub restore_highlights: bool,

    /// Only cast the pointer ray on ticks where the pointer moved
    #[arg(long, default_value = "false")]
    pub pick_on_move: bool,

    /// Render resolution as a fraction of the window size
    #[arg(long)]
    pub render_scale: Option<f32>,

    /// Run this many ticks without a window, then exit
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,

    /// Write the last headless frame to this PNG
    #[arg(long, value_name = "PNG", requires = "headless")]
    pub snapshot: Option<PathBuf>,
}
