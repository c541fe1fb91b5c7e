mod asset_loader;
pub mod font;
pub mod gltf;
mod queue;
pub mod source;
pub mod texture;

pub use asset_loader::{AssetKind, AssetLoader, ParsedResource};
pub use font::{Font, TextStyle};
pub use gltf::{AnimationClip, ModelAsset};
pub use queue::{LoadOutcome, LoadQueue, Ticket};
pub use source::{AssetSource, FileSource, MemorySource};
pub use texture::decode_texture;
