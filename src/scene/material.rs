use glam::{Vec2, Vec3};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::math::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Unlit flat color
    Basic,
    /// Diffuse lighting from scene lights
    Standard,
    /// Custom shading driven by uniforms
    Shader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Color(Color),
    Vec3(Vec3),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    pub wireframe: bool,
    pub side: Side,
    pub map: Option<Arc<Texture>>,
    pub uniforms: BTreeMap<String, UniformValue>,
}

impl Material {
    fn with_kind(kind: MaterialKind, color: Color) -> Self {
        Self {
            kind,
            color,
            wireframe: false,
            side: Side::Front,
            map: None,
            uniforms: BTreeMap::new(),
        }
    }

    pub fn basic(color: Color) -> Self {
        Self::with_kind(MaterialKind::Basic, color)
    }

    pub fn standard(color: Color) -> Self {
        Self::with_kind(MaterialKind::Standard, color)
    }

    pub fn shader<I, K>(uniforms: I) -> Self
    where
        I: IntoIterator<Item = (K, UniformValue)>,
        K: Into<String>,
    {
        let mut material = Self::with_kind(MaterialKind::Shader, Color::WHITE);
        material.uniforms = uniforms.into_iter().map(|(k, v)| (k.into(), v)).collect();
        material
    }

    pub fn double_sided(mut self) -> Self {
        self.side = Side::Double;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_map(mut self, map: Arc<Texture>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    /// Replaces a uniform, returning the previous value
    pub fn set_uniform(&mut self, name: impl Into<String>, value: UniformValue) -> Option<UniformValue> {
        self.uniforms.insert(name.into(), value)
    }

    pub fn culls_back_faces(&self) -> bool {
        self.side == Side::Front
    }
}

/// RGBA8 image sampled with repeat wrapping and nearest filtering
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Texture {
    /// `None` when the pixel count does not match the dimensions
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        (width > 0 && height > 0 && pixels.len() == (width as usize) * (height as usize)).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn solid(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color.to_rgba8(255)],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `uv` origin is bottom-left, like the rest of the scene
    pub fn sample(&self, uv: Vec2) -> Color {
        let u = uv.x - uv.x.floor();
        let v = 1.0 - (uv.y - uv.y.floor());
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        Color::from_rgba8(self.pixels[(y * self.width + x) as usize])
    }
}
