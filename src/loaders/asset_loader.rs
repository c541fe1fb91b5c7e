use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::font::Font;
use super::gltf::{parse_model, ModelAsset};
use super::source::AssetSource;
use super::texture::decode_texture;
use crate::error::AssetLoadError;
use crate::scene::Texture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    Font,
    Texture,
}

impl AssetKind {
    /// Picks the parser from the file extension, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(AssetKind::Model),
            "json" => Some(AssetKind::Font),
            "png" | "jpg" | "jpeg" => Some(AssetKind::Texture),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Model => "model",
            AssetKind::Font => "font",
            AssetKind::Texture => "texture",
        }
    }
}

/// Successfully parsed asset, ready to be installed into a scene
#[derive(Debug, Clone)]
pub enum ParsedResource {
    Model(ModelAsset),
    Font(Arc<Font>),
    Texture(Arc<Texture>),
}

impl ParsedResource {
    pub fn kind(&self) -> AssetKind {
        match self {
            ParsedResource::Model(_) => AssetKind::Model,
            ParsedResource::Font(_) => AssetKind::Font,
            ParsedResource::Texture(_) => AssetKind::Texture,
        }
    }

    pub fn into_model(self) -> Option<ModelAsset> {
        match self {
            ParsedResource::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn into_font(self) -> Option<Arc<Font>> {
        match self {
            ParsedResource::Font(font) => Some(font),
            _ => None,
        }
    }

    pub fn into_texture(self) -> Option<Arc<Texture>> {
        match self {
            ParsedResource::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

/// Fetches and parses named assets. Each call settles exactly once and
/// never retries; failures are logged and returned.
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
}

impl fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoader").finish_non_exhaustive()
    }
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &dyn AssetSource {
        self.source.as_ref()
    }

    pub async fn load(&self, name: &str) -> Result<ParsedResource, AssetLoadError> {
        let result = self.load_inner(name).await;
        match &result {
            Ok(resource) => log::info!("Loaded {} ({:?})", name, resource.kind()),
            Err(err) => log::error!("Failed to load {}: {}", name, err),
        }
        result
    }

    async fn load_inner(&self, name: &str) -> Result<ParsedResource, AssetLoadError> {
        let kind = AssetKind::from_name(name).ok_or_else(|| AssetLoadError::Unsupported(name.to_string()))?;
        let bytes = self.source.fetch(name).await?;
        match kind {
            AssetKind::Model => parse_model(self.source.as_ref(), name, &bytes).await.map(ParsedResource::Model),
            AssetKind::Font => Font::from_json(name, &bytes).map(|font| ParsedResource::Font(Arc::new(font))),
            AssetKind::Texture => decode_texture(name, &bytes).map(|texture| ParsedResource::Texture(Arc::new(texture))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::source::MemorySource;
    use crate::loaders::{font, gltf, texture};

    fn loader(source: MemorySource) -> (AssetLoader, Arc<MemorySource>) {
        let source = Arc::new(source);
        (AssetLoader::new(source.clone()), source)
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(AssetKind::from_name("Cake Birthday.glb"), Some(AssetKind::Model));
        assert_eq!(AssetKind::from_name("/scene.GLTF"), Some(AssetKind::Model));
        assert_eq!(AssetKind::from_name("Noto Serif_Regular.json"), Some(AssetKind::Font));
        assert_eq!(AssetKind::from_name("woodTexture.png"), Some(AssetKind::Texture));
        assert_eq!(AssetKind::from_name("readme"), None);
    }

    #[test]
    fn test_loads_each_kind() {
        let (json, bin) = gltf::fixtures::triangle_gltf();
        let (loader, source) = loader(
            MemorySource::new()
                .with_asset("tri.gltf", json)
                .with_asset("tri.bin", bin)
                .with_asset("font.json", font::fixtures::TINY_FONT)
                .with_asset("wood.png", texture::fixtures::png()),
        );
        let model = pollster::block_on(loader.load("tri.gltf")).unwrap();
        assert_eq!(model.kind(), AssetKind::Model);
        assert!(pollster::block_on(loader.load("font.json")).unwrap().into_font().is_some());
        assert!(pollster::block_on(loader.load("wood.png")).unwrap().into_texture().is_some());
        assert_eq!(source.fetch_count("tri.gltf"), 1);
    }

    #[test]
    fn test_unsupported_name_is_not_fetched() {
        let (loader, source) = loader(MemorySource::new().with_asset("notes.txt", "hi"));
        let err = pollster::block_on(loader.load("notes.txt")).unwrap_err();
        assert!(matches!(err, AssetLoadError::Unsupported(_)));
        assert_eq!(source.fetch_count("notes.txt"), 0);
    }

    #[test]
    fn test_missing_asset_fetched_once() {
        let (loader, source) = loader(MemorySource::new());
        let err = pollster::block_on(loader.load("Cake Birthday.glb")).unwrap_err();
        assert!(matches!(err, AssetLoadError::Fetch { .. }));
        assert_eq!(source.fetch_count("Cake Birthday.glb"), 1);
    }
}
