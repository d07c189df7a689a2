//! Value types shared across the turbulence generator.
//!
//! Small `Copy` types with explicit component order, so that dictionary-style
//! inputs (stress tensors, length-scale sets) cannot be mixed up:
//!
//! - [`Vec3`]: velocities, coordinates, normals
//! - [`SymmTensor3`]: Reynolds-stress input (xx, xy, xz, yy, yz, zz)
//! - [`LowerTriangular3`]: Cholesky-type stress factor
//! - [`LengthScaleSet`]: integral scales per (direction, component)
//! - [`Blend`]: weighted-sum combination used by interpolation

mod blend;
mod scales;
mod tensor;
mod vector;

pub use blend::Blend;
pub use scales::LengthScaleSet;
pub use tensor::{LowerTriangular3, SymmTensor3};
pub use vector::Vec3;
