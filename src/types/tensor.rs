//! Symmetric and triangular 3×3 tensor types.
//!
//! Component ordering follows the boundary-condition input convention:
//! a symmetric tensor is given as (xx, xy, xz, yy, yz, zz).

use super::Vec3;

/// Symmetric 3×3 tensor with six independent components.
///
/// Used for the Reynolds-stress tensor R [m²/s²].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SymmTensor3 {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yy: f64,
    pub yz: f64,
    pub zz: f64,
}

impl SymmTensor3 {
    /// Create from the six independent components (xx, xy, xz, yy, yz, zz).
    #[inline(always)]
    pub const fn new(xx: f64, xy: f64, xz: f64, yy: f64, yz: f64, zz: f64) -> Self {
        Self {
            xx,
            xy,
            xz,
            yy,
            yz,
            zz,
        }
    }

    /// Zero tensor.
    #[inline(always)]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Identity tensor.
    #[inline(always)]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 1.0)
    }

    /// Diagonal tensor diag(xx, yy, zz).
    #[inline(always)]
    pub const fn diagonal(xx: f64, yy: f64, zz: f64) -> Self {
        Self::new(xx, 0.0, 0.0, yy, 0.0, zz)
    }

    /// Determinant of the full symmetric matrix.
    pub fn det(&self) -> f64 {
        self.xx * (self.yy * self.zz - self.yz * self.yz)
            - self.xy * (self.xy * self.zz - self.yz * self.xz)
            + self.xz * (self.xy * self.yz - self.yy * self.xz)
    }

    /// Convert to array representation (xx, xy, xz, yy, yz, zz).
    #[inline(always)]
    pub fn to_array(&self) -> [f64; 6] {
        [self.xx, self.xy, self.xz, self.yy, self.yz, self.zz]
    }

    /// Create from array representation (xx, xy, xz, yy, yz, zz).
    #[inline(always)]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3], arr[4], arr[5])
    }
}

/// Lower-triangular 3×3 matrix.
///
/// Holds the Cholesky-type factor a of a stress tensor, a·aᵀ = R.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LowerTriangular3 {
    pub xx: f64,
    pub yx: f64,
    pub yy: f64,
    pub zx: f64,
    pub zy: f64,
    pub zz: f64,
}

impl LowerTriangular3 {
    /// Create from the six lower-triangular entries.
    #[inline(always)]
    pub const fn new(xx: f64, yx: f64, yy: f64, zx: f64, zy: f64, zz: f64) -> Self {
        Self {
            xx,
            yx,
            yy,
            zx,
            zy,
            zz,
        }
    }

    /// Identity matrix.
    #[inline(always)]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 1.0, 0.0, 0.0, 1.0)
    }

    /// Matrix-vector product a·v.
    #[inline(always)]
    pub fn apply(&self, v: &Vec3) -> Vec3 {
        Vec3 {
            x: self.xx * v.x,
            y: self.yx * v.x + self.yy * v.y,
            z: self.zx * v.x + self.zy * v.y + self.zz * v.z,
        }
    }

    /// Reconstruct the symmetric product a·aᵀ.
    pub fn outer(&self) -> SymmTensor3 {
        SymmTensor3 {
            xx: self.xx * self.xx,
            xy: self.xx * self.yx,
            xz: self.xx * self.zx,
            yy: self.yx * self.yx + self.yy * self.yy,
            yz: self.yx * self.zx + self.yy * self.zy,
            zz: self.zx * self.zx + self.zy * self.zy + self.zz * self.zz,
        }
    }
}
