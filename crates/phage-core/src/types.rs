//! Core types used throughout the Phage engine

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

/// Translation, rotation (radians) and non-uniform scale in a 2D space.
///
/// Applied as translate, then rotate, then scale: a point `p` in local space
/// maps to `translation + rotate(rotation, scale * p)` in the parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    pub translation: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2 {
    pub const IDENTITY: Transform2 = Transform2 {
        translation: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    /// Create a transform from all three parts
    pub fn new(translation: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec2) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Create a transform with only a rotation
    pub fn from_rotation(rotation: f32) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Create a transform with only a scale
    pub fn from_scale(scale: Vec2) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// The affine matrix `T * R * S` for this transform
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.translation)
    }

    /// Compose `self` (the parent frame) with a child transform expressed in it.
    ///
    /// Rotations add up exactly; translation and scale are read back from the
    /// composed matrix.
    pub fn compose(&self, child: &Transform2) -> Transform2 {
        let composed = self.matrix() * child.matrix();
        let (scale, _, translation) = composed.to_scale_angle_translation();
        Transform2 {
            translation,
            rotation: self.rotation + child.rotation,
            scale,
        }
    }

    /// Map a point from this transform's local space into its parent space
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.matrix().transform_point2(point)
    }

    /// Returns a copy moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Transform2 {
        Transform2 {
            translation: self.translation + offset,
            ..*self
        }
    }

    /// Returns a copy rotated by `angle` radians
    pub fn rotated(&self, angle: f32) -> Transform2 {
        Transform2 {
            rotation: self.rotation + angle,
            ..*self
        }
    }

    /// Returns a copy with its scale multiplied component-wise by `factor`
    pub fn scaled(&self, factor: Vec2) -> Transform2 {
        Transform2 {
            scale: self.scale * factor,
            ..*self
        }
    }

    /// Interpolate between two transforms
    pub fn lerp(a: &Transform2, b: &Transform2, t: f32) -> Transform2 {
        Transform2 {
            translation: a.translation.lerp(b.translation, t),
            rotation: a.rotation + (b.rotation - a.rotation) * t,
            scale: a.scale.lerp(b.scale, t),
        }
    }

    /// Approximate equality, for comparing composed transforms
    pub fn abs_diff_eq(&self, other: &Transform2, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && (self.rotation - other.rotation).abs() <= max_abs_diff
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }
}

impl std::fmt::Display for Transform2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[t=({}, {}) r={} s=({}, {})]",
            self.translation.x, self.translation.y, self.rotation, self.scale.x, self.scale.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_identity_compose() {
        let t = Transform2::new(Vec2::new(1.0, 2.0), 0.3, Vec2::new(2.0, 2.0));
        assert!(Transform2::IDENTITY.compose(&t).abs_diff_eq(&t, EPS));
        assert!(t.compose(&Transform2::IDENTITY).abs_diff_eq(&t, EPS));
    }

    #[test]
    fn test_translation_adds() {
        let parent = Transform2::from_translation(Vec2::new(2.0, 0.0));
        let child = Transform2::from_translation(Vec2::new(1.0, 0.0));
        let world = parent.compose(&child);
        assert!(world.translation.abs_diff_eq(Vec2::new(3.0, 0.0), EPS));
    }

    #[test]
    fn test_parent_rotation_moves_child() {
        let parent = Transform2::new(Vec2::new(1.0, 0.0), FRAC_PI_2, Vec2::ONE);
        let child = Transform2::from_translation(Vec2::new(1.0, 0.0));
        let world = parent.compose(&child);
        assert!(world.translation.abs_diff_eq(Vec2::new(1.0, 1.0), EPS));
        assert!((world.rotation - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_parent_scale_stretches_child() {
        let parent = Transform2::from_scale(Vec2::new(2.0, 3.0));
        let child = Transform2::new(Vec2::new(1.0, 1.0), 0.0, Vec2::new(0.5, 2.0));
        let world = parent.compose(&child);
        assert!(world.translation.abs_diff_eq(Vec2::new(2.0, 3.0), EPS));
        assert!(world.scale.abs_diff_eq(Vec2::new(1.0, 6.0), EPS));
    }

    #[test]
    fn test_composition_order_matters() {
        let a = Transform2::new(Vec2::new(1.0, 0.0), FRAC_PI_2, Vec2::ONE);
        let b = Transform2::from_translation(Vec2::new(0.0, 2.0));
        assert!(!a.compose(&b).abs_diff_eq(&b.compose(&a), EPS));
    }

    #[test]
    fn test_helpers() {
        let t = Transform2::IDENTITY
            .translated(Vec2::new(1.0, 1.0))
            .rotated(0.5)
            .scaled(Vec2::new(2.0, 4.0));
        assert_eq!(t.translation, Vec2::new(1.0, 1.0));
        assert_eq!(t.rotation, 0.5);
        assert_eq!(t.scale, Vec2::new(2.0, 4.0));
    }
}
