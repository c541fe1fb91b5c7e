use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use rayon::prelude::*;
use std::path::Path;

use super::SceneRenderer;
use crate::core::{PerspectiveCamera, Viewport};
use crate::math::{Color, Ray};
use crate::scene::{
    Background, LightKind, MaterialKind, PlacedLight, RaycastView, SceneGraph, SceneNode, SurfaceHit, UniformValue,
};

/// Fraction of a tessellation cell drawn as a wireframe line
const WIRE_WIDTH: f32 = 0.04;
const SHADOW_BIAS: f32 = 1e-3;

/// Non-intersectable reference lines drawn over the ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guide {
    /// X, Y and Z axes from the origin, colored red, green and blue
    Axes { size: f32 },
    /// Square grid on the y = 0 plane centered on the origin
    Grid { size: f32, divisions: u32 },
}

/// CPU ray caster producing an RGBA8 frame.
///
/// Shares intersection code with picking, so what is drawn under the
/// pointer is exactly what gets picked.
pub struct SoftwareRenderer {
    viewport: Viewport,
    scale: f32,
    pixels: Vec<u8>,
    guides: Vec<Guide>,
    frames: u64,
}

impl SoftwareRenderer {
    /// `scale` sets the render resolution relative to the viewport
    pub fn new(viewport: Viewport, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let target = viewport.scaled(scale);
        Self {
            viewport: target,
            scale,
            pixels: vec![0; target.buffer_size()],
            guides: Vec::new(),
            frames: 0,
        }
    }

    pub fn with_guides(mut self, guides: Vec<Guide>) -> Self {
        self.guides = guides;
        self
    }

    pub fn set_guides(&mut self, guides: Vec<Guide>) {
        self.guides = guides;
    }

    /// Render target size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        let i = (y as usize * self.viewport.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4)?.try_into().ok()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let (width, height) = self.dimensions();
        let image = image::RgbaImage::from_raw(width, height, self.pixels.clone())
            .context("Pixel buffer does not match the render size")?;
        image.save(path).with_context(|| format!("Failed to write {:?}", path))?;
        log::info!("Saved {}x{} frame to {:?}", width, height, path);
        Ok(())
    }

    fn shade_pixel(&self, view: &RaycastView<'_>, scene: &SceneGraph, lights: &[PlacedLight], ray: &Ray, camera: &PerspectiveCamera, uv: Vec2) -> [u8; 4] {
        let surface = view
            .hits(ray, camera.near, camera.far)
            .into_iter()
            .filter_map(|hit| scene.node(hit.node).map(|node| (hit, node)))
            .filter(|(hit, node)| !node.material.as_ref().is_some_and(|m| m.wireframe) || hit.wire <= WIRE_WIDTH)
            .min_by(|a, b| a.0.distance.total_cmp(&b.0.distance));

        let surface_distance = surface.as_ref().map_or(f32::INFINITY, |(hit, _)| hit.distance);
        let guide = self.guide_color(ray, surface_distance);

        let (color, distance) = match (surface, guide) {
            (_, Some((color, distance))) => (color, distance),
            (Some((hit, node)), None) => (shade_surface(view, lights, &hit, node, ray), hit.distance),
            (None, None) => return background(&scene.background, uv),
        };

        let color = match scene.fog {
            Some(fog) => color.lerp(fog.color(), fog.factor(distance)),
            None => color,
        };
        color.to_rgba8(255)
    }

    /// Guide line color if one is crossed before `max_distance`
    fn guide_color(&self, ray: &Ray, max_distance: f32) -> Option<(Color, f32)> {
        self.guides
            .iter()
            .filter_map(|guide| match *guide {
                Guide::Grid { size, divisions } => grid_hit(ray, size, divisions),
                Guide::Axes { size } => axes_hit(ray, size),
            })
            .filter(|(_, distance)| *distance < max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl SceneRenderer for SoftwareRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<()> {
        let view = RaycastView::new(scene);
        let lights = scene.lights();
        let (width, height) = self.dimensions();

        let mut pixels = std::mem::take(&mut self.pixels);
        pixels.resize(self.viewport.buffer_size(), 0);
        if width > 0 {
            pixels
                .par_chunks_exact_mut(width as usize * 4)
                .enumerate()
                .for_each(|(row, line)| {
                    let y = row as f32 + 0.5;
                    for (column, rgba) in line.chunks_exact_mut(4).enumerate() {
                        let x = column as f32 + 0.5;
                        let ndc = Vec2::new(x / width as f32 * 2.0 - 1.0, -(y / height as f32) * 2.0 + 1.0);
                        let ray = camera.ray_through(ndc.x, ndc.y);
                        let uv = Vec2::new(x / width as f32, 1.0 - y / height as f32);
                        rgba.copy_from_slice(&self.shade_pixel(&view, scene, &lights, &ray, camera, uv));
                    }
                });
        }
        self.pixels = pixels;
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport.scaled(self.scale);
        self.pixels = vec![0; self.viewport.buffer_size()];
    }
}

fn background(background: &Background, uv: Vec2) -> [u8; 4] {
    match background {
        Background::Color(color) => color.to_rgba8(255),
        Background::Texture(texture) => texture.sample(uv).to_rgba8(255),
        Background::Transparent => [0, 0, 0, 0],
    }
}

fn shade_surface(view: &RaycastView<'_>, lights: &[PlacedLight], hit: &SurfaceHit, node: &SceneNode, ray: &Ray) -> Color {
    let Some(material) = node.material.as_ref() else {
        return Color::WHITE;
    };
    let mut albedo = material.color;
    if let Some(map) = &material.map {
        albedo = albedo * map.sample(hit.uv);
    }

    // Face the viewer so double-sided surfaces light from both sides
    let normal = if hit.normal.dot(ray.direction) > 0.0 { -hit.normal } else { hit.normal };

    match material.kind {
        MaterialKind::Basic => albedo,
        MaterialKind::Shader => {
            let tint = match material.uniform("tint") {
                Some(UniformValue::Color(c)) => c,
                Some(UniformValue::Vec3(v)) => Color::rgb(v.x, v.y, v.z),
                Some(UniformValue::Float(f)) => Color::rgb(f, f, f),
                None => albedo,
            };
            tint * (0.35 + 0.65 * normal.dot(-ray.direction).max(0.0))
        }
        MaterialKind::Standard => {
            let mut total = Color::BLACK;
            for placed in lights {
                let light = &placed.light;
                let radiance = light.color * light.intensity;
                let (to_light, max_distance) = match light.kind {
                    LightKind::Ambient => {
                        total = total + radiance;
                        continue;
                    }
                    LightKind::Directional { target } => ((placed.position - target).normalize_or_zero(), f32::INFINITY),
                    LightKind::Spot { .. } => {
                        let offset = placed.position - hit.point;
                        (offset.normalize_or_zero(), offset.length())
                    }
                };
                let lambert = normal.dot(to_light).max(0.0);
                if lambert <= 0.0 {
                    continue;
                }
                let cone = light.cone_factor(placed.position, -to_light);
                if cone <= 0.0 {
                    continue;
                }
                if light.cast_shadow && node.receive_shadow {
                    let shadow_ray = Ray::new(hit.point + normal * SHADOW_BIAS, to_light);
                    if view.occluded(&shadow_ray, max_distance, hit.node) {
                        continue;
                    }
                }
                total = total + radiance * (lambert * cone);
            }
            albedo * total
        }
    }
}

/// Line half-width in world units for a point `distance` away, so lines
/// stay about a pixel wide
fn line_width(distance: f32) -> f32 {
    0.02 + distance * 0.0015
}

fn grid_hit(ray: &Ray, size: f32, divisions: u32) -> Option<(Color, f32)> {
    if ray.direction.y.abs() < 1e-6 || divisions == 0 {
        return None;
    }
    let t = -ray.origin.y / ray.direction.y;
    if t <= 0.0 {
        return None;
    }
    let p = ray.at(t);
    let half = size * 0.5;
    if p.x.abs() > half || p.z.abs() > half {
        return None;
    }
    let step = size / divisions as f32;
    let near_line = |v: f32| {
        let cell = (v + half) / step;
        (cell - cell.round()).abs() * step < line_width(t)
    };
    if near_line(p.x) || near_line(p.z) {
        let center = p.x.abs() < line_width(t) || p.z.abs() < line_width(t);
        let color = if center { Color::from_hex(0x444444) } else { Color::from_hex(0x888888) };
        Some((color, t))
    } else {
        None
    }
}

fn axes_hit(ray: &Ray, size: f32) -> Option<(Color, f32)> {
    [
        (Vec3::X, Color::from_hex(0xff0000)),
        (Vec3::Y, Color::from_hex(0x00ff00)),
        (Vec3::Z, Color::from_hex(0x0000ff)),
    ]
    .into_iter()
    .filter_map(|(axis, color)| {
        let (t, gap) = ray_segment_gap(ray, Vec3::ZERO, axis * size)?;
        (gap < line_width(t)).then_some((color, t))
    })
    .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Closest approach between a ray and a segment: (ray parameter, gap)
fn ray_segment_gap(ray: &Ray, a: Vec3, b: Vec3) -> Option<(f32, f32)> {
    let segment = b - a;
    let w = ray.origin - a;
    let d = ray.direction;
    let ss = segment.dot(segment);
    let sd = segment.dot(d);
    let denom = ss - sd * sd;
    if denom.abs() < 1e-8 {
        return None;
    }
    let s = ((segment.dot(w) - sd * d.dot(w)) / denom).clamp(0.0, 1.0);
    let on_segment = a + segment * s;
    let t = (on_segment - ray.origin).dot(d);
    if t <= 0.0 {
        return None;
    }
    Some((t, ray.at(t).distance(on_segment)))
}
