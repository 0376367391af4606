use glam::Vec2;

/// Pure geometric operations on 2D vectors.
///
/// Each operation returns a new vector; the receiver is left untouched.
pub trait VectorExt: Sized {
    /// Offset by `offset`.
    fn translate(self, offset: Vec2) -> Self;

    /// Rotate counter-clockwise about the origin.
    fn rotate_radians(self, radians: f32) -> Self;

    /// Componentwise scale.
    fn scale(self, factor: Vec2) -> Self;

    /// Uniform scale.
    fn scale_uniform(self, factor: f32) -> Self;
}

impl VectorExt for Vec2 {
    #[inline]
    fn translate(self, offset: Vec2) -> Vec2 {
        self + offset
    }

    #[inline]
    fn rotate_radians(self, radians: f32) -> Vec2 {
        // sin_cos(0.0) is exactly (0.0, 1.0), so a zero angle is a bitwise no-op
        // for finite input.
        let (sin, cos) = radians.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    fn scale(self, factor: Vec2) -> Vec2 {
        self * factor
    }

    #[inline]
    fn scale_uniform(self, factor: f32) -> Vec2 {
        self * factor
    }
}
