pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod loaders;
pub mod math;
pub mod render;
pub mod scene;
pub mod scenes;

pub use error::{AssetLoadError, FrameMutationError, SceneError};
