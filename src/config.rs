use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::core::{LoopConfig, PickPolicy, Viewport};
use crate::scenes::DemoKind;

/// Everything the application needs to start. Loaded from an optional
/// JSON file, then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scene: DemoKind,
    pub assets: PathBuf,
    pub show_ui: bool,
    pub load_timeout_ms: Option<u64>,
    pub frame_loop: LoopConfig,
    pub render_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scene: DemoKind::default(),
            assets: PathBuf::from("assets"),
            show_ui: true,
            load_timeout_ms: None,
            frame_loop: LoopConfig::default(),
            render_scale: 0.5,
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
        let config = serde_json::from_str(&text).with_context(|| format!("Failed to parse config {:?}", path))?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// File values (if `--config` was given) with flags applied on top
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(scene) = cli.scene {
            self.scene = scene;
        }
        if let Some(assets) = &cli.assets {
            self.assets = assets.clone();
        }
        if cli.no_ui {
            self.show_ui = false;
        }
        if let Some(ms) = cli.load_timeout_ms {
            self.load_timeout_ms = Some(ms);
        }
        if cli.restore_highlights {
            self.frame_loop.restore_unpicked = true;
        }
        if cli.pick_on_move {
            self.frame_loop.pick_policy = PickPolicy::OnPointerMove;
        }
        if let Some(scale) = cli.render_scale {
            self.render_scale = scale;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.render_scale > 0.0 && self.render_scale <= 4.0) {
            anyhow::bail!("render_scale must be in (0, 4], got {}", self.render_scale);
        }
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("window size must be non-zero, got {}x{}", self.width, self.height);
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}
