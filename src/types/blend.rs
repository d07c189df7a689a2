//! Weighted blending of field values during interpolation.

use super::{SymmTensor3, Vec3};

/// Values that can be combined as weighted sums.
///
/// Implemented for every field value type that passes through the planar
/// interpolation collaborator and the patch mapper.
pub trait Blend: Copy {
    /// Additive identity.
    fn zero() -> Self;

    /// Accumulate `w * v` into `self`.
    fn scaled_add(&mut self, w: f64, v: &Self);
}

impl Blend for f64 {
    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn scaled_add(&mut self, w: f64, v: &Self) {
        *self += w * v;
    }
}

impl Blend for Vec3 {
    #[inline(always)]
    fn zero() -> Self {
        Vec3::zero()
    }

    #[inline(always)]
    fn scaled_add(&mut self, w: f64, v: &Self) {
        self.x += w * v.x;
        self.y += w * v.y;
        self.z += w * v.z;
    }
}

impl Blend for SymmTensor3 {
    #[inline(always)]
    fn zero() -> Self {
        SymmTensor3::zero()
    }

    #[inline(always)]
    fn scaled_add(&mut self, w: f64, v: &Self) {
        self.xx += w * v.xx;
        self.xy += w * v.xy;
        self.xz += w * v.xz;
        self.yy += w * v.yy;
        self.yz += w * v.yz;
        self.zz += w * v.zz;
    }
}
