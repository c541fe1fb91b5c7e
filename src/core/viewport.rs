/// Drawing surface dimensions in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, 1.0 while either side is zero
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size in bytes of an RGBA8 buffer covering the viewport
    pub fn buffer_size(&self) -> usize {
        self.pixel_count() * 4
    }

    /// Viewport scaled by `factor`, never smaller than 1x1
    pub fn scaled(&self, factor: f32) -> Viewport {
        let scale = |v: u32| ((v as f32 * factor).round() as u32).max(1);
        Viewport::new(scale(self.width), scale(self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
