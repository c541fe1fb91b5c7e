use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::AssetLoadError;
use crate::math::AABB;
use crate::scene::TextGeometry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceJson {
    #[serde(default)]
    family_name: String,
    resolution: f32,
    bounding_box: BoundingBoxJson,
    #[serde(default)]
    underline_thickness: f32,
    glyphs: HashMap<String, GlyphJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBoxJson {
    y_min: f32,
    y_max: f32,
}

#[derive(Debug, Deserialize)]
struct GlyphJson {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glyph {
    advance: f32,
    /// Outline extent in font units, `None` for blank glyphs
    extent: Option<(Vec2, Vec2)>,
}

/// Typeface in the JSON layout produced by facetype.js
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    family: String,
    resolution: f32,
    line_height: f32,
    glyphs: HashMap<char, Glyph>,
}

/// Extruded text parameters in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub depth: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self { size: 100.0, depth: 50.0 }
    }
}

impl Font {
    pub fn from_json(name: &str, bytes: &[u8]) -> Result<Self, AssetLoadError> {
        let json: TypefaceJson = serde_json::from_slice(bytes).map_err(|e| AssetLoadError::parse(name, e))?;
        if !(json.resolution > 0.0) {
            return Err(AssetLoadError::parse(name, "resolution must be positive"));
        }

        let glyphs = json
            .glyphs
            .into_iter()
            .filter_map(|(key, glyph)| {
                let mut chars = key.chars();
                let c = chars.next()?;
                chars.next().is_none().then(|| {
                    let extent = glyph.o.as_deref().and_then(outline_extent);
                    (c, Glyph { advance: glyph.ha, extent })
                })
            })
            .collect::<HashMap<_, _>>();

        log::debug!("{}: font {:?} with {} glyph(s)", name, json.family_name, glyphs.len());
        Ok(Self {
            family: json.family_name,
            resolution: json.resolution,
            line_height: json.bounding_box.y_max - json.bounding_box.y_min + json.underline_thickness,
            glyphs,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Lays `text` out left to right from the origin, one box per inked
    /// glyph spanning `z` from 0 to `depth`. Unknown characters fall back to
    /// `?` and are dropped if the font has no `?` either.
    pub fn layout(&self, text: &str, style: TextStyle) -> TextGeometry {
        let scale = style.size / self.resolution;
        let line_height = self.line_height * scale;
        let mut cursor = Vec2::ZERO;
        let mut boxes = Vec::new();

        for c in text.chars() {
            if c == '\n' {
                cursor = Vec2::new(0.0, cursor.y - line_height);
                continue;
            }
            let Some(glyph) = self.glyphs.get(&c).or_else(|| self.glyphs.get(&'?')) else {
                log::warn!("Font {:?} has no glyph for {:?}", self.family, c);
                continue;
            };
            if let Some((min, max)) = glyph.extent {
                let min = cursor + min * scale;
                let max = cursor + max * scale;
                boxes.push(AABB::new(Vec3::new(min.x, min.y, 0.0), Vec3::new(max.x, max.y, style.depth)));
            }
            cursor.x += glyph.advance * scale;
        }

        TextGeometry::new(text, boxes)
    }
}

/// Extent of every coordinate pair in an outline command string such as
/// `"m 10 0 l 20 0 q 30 10 25 5 z"`
fn outline_extent(outline: &str) -> Option<(Vec2, Vec2)> {
    let numbers: Vec<f32> = outline.split_whitespace().filter_map(|token| token.parse().ok()).collect();
    let mut points = numbers.chunks_exact(2).map(|pair| Vec2::new(pair[0], pair[1]));
    let first = points.next()?;
    Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
}
