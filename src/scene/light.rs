use glam::Vec3;

use crate::math::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines from the node position towards `target` (world space)
    Directional { target: Vec3 },
    /// Cone from the node position towards `target`; `angle` is the half
    /// angle in radians, `penumbra` the softened fraction of the cone
    Spot { target: Vec3, angle: f32, penumbra: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
            cast_shadow: false,
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { target: Vec3::ZERO },
            color,
            intensity,
            cast_shadow: false,
        }
    }

    pub fn spot(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Spot {
                target: Vec3::ZERO,
                angle: std::f32::consts::FRAC_PI_3,
                penumbra: 0.0,
            },
            color,
            intensity,
            cast_shadow: false,
        }
    }

    pub fn with_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    /// Returns false when this is not a spot light
    pub fn set_spot_angle(&mut self, value: f32) -> bool {
        match &mut self.kind {
            LightKind::Spot { angle, .. } => {
                *angle = value;
                true
            }
            _ => false,
        }
    }

    /// Returns false when this is not a spot light
    pub fn set_spot_penumbra(&mut self, value: f32) -> bool {
        match &mut self.kind {
            LightKind::Spot { penumbra, .. } => {
                *penumbra = value;
                true
            }
            _ => false,
        }
    }

    /// Cone falloff for a spot light, 1.0 for every other kind.
    /// `to_point` is the unit direction from the light to the shaded point.
    pub fn cone_factor(&self, position: Vec3, to_point: Vec3) -> f32 {
        let LightKind::Spot { target, angle, penumbra } = self.kind else {
            return 1.0;
        };
        let axis = (target - position).normalize_or_zero();
        let cos_outer = angle.cos();
        let cos_inner = (angle * (1.0 - penumbra)).cos();
        let cos_theta = axis.dot(to_point);
        if cos_theta <= cos_outer {
            0.0
        } else if cos_theta >= cos_inner {
            1.0
        } else {
            let t = (cos_theta - cos_outer) / (cos_inner - cos_outer);
            t * t * (3.0 - 2.0 * t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_setters_only_touch_spots() {
        let mut spot = Light::spot(Color::WHITE, 0.8);
        assert!(spot.set_spot_angle(0.2));
        assert!(spot.set_spot_penumbra(0.5));
        assert_eq!(
            spot.kind,
            LightKind::Spot {
                target: Vec3::ZERO,
                angle: 0.2,
                penumbra: 0.5
            }
        );

        let mut ambient = Light::ambient(Color::WHITE, 1.0);
        assert!(!ambient.set_spot_angle(0.2));
    }

    #[test]
    fn test_cone_factor() {
        let mut spot = Light::spot(Color::WHITE, 1.0);
        spot.set_spot_angle(0.2);
        let position = Vec3::new(0.0, 10.0, 0.0);
        assert_eq!(spot.cone_factor(position, Vec3::NEG_Y), 1.0);
        assert_eq!(spot.cone_factor(position, Vec3::X), 0.0);
    }
}
